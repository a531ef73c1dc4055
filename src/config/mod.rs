//! Configuration (layered: code > env > TOML file > defaults).

use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent_loop::{max_iterations, AgentLoopStrategy, DEFAULT_MAX_ITERATIONS};
use crate::error::{ParleyError, Result};
use crate::stream::{
    BatchStrategy, ChunkStrategy, ImmediateStrategy, PunctuationStrategy, StreamProcessorOptions,
    WordBoundaryStrategy,
};
use crate::tools::DEFAULT_TOOL_CONCURRENCY;

pub const ENV_CHUNK_STRATEGY: &str = "PARLEY_CHUNK_STRATEGY";
pub const ENV_BATCH_SIZE: &str = "PARLEY_BATCH_SIZE";
pub const ENV_RECORD_CHUNKS: &str = "PARLEY_RECORD_CHUNKS";
pub const ENV_TOOL_CONCURRENCY: &str = "PARLEY_TOOL_CONCURRENCY";
pub const ENV_MAX_ITERATIONS: &str = "PARLEY_MAX_ITERATIONS";

const DEFAULT_BATCH_SIZE: usize = 5;

/// Which [`ChunkStrategy`] the processor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChunkStrategyConfig {
    #[default]
    Immediate,
    Punctuation,
    WordBoundary,
    Batch {
        size: usize,
    },
}

impl ChunkStrategyConfig {
    /// Parse a strategy name (`immediate`, `punctuation`, `word-boundary`, `batch`).
    pub fn parse(name: &str, batch_size: Option<usize>) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "punctuation" => Ok(Self::Punctuation),
            "word-boundary" | "word_boundary" => Ok(Self::WordBoundary),
            "batch" => Ok(Self::Batch {
                size: batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            }),
            other => Err(ParleyError::Configuration(format!(
                "unknown chunk strategy: {other}"
            ))),
        }
    }

    pub fn build(&self) -> Box<dyn ChunkStrategy> {
        match self {
            Self::Immediate => Box::new(ImmediateStrategy),
            Self::Punctuation => Box::new(PunctuationStrategy::new()),
            Self::WordBoundary => Box::new(WordBoundaryStrategy),
            Self::Batch { size } => Box::new(BatchStrategy::new(*size)),
        }
    }
}

/// Tunables for stream processing and the chat loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ProcessorConfig {
    #[builder(default)]
    pub chunk_strategy: ChunkStrategyConfig,
    #[builder(default)]
    pub record_chunks: bool,
    #[builder(default = DEFAULT_TOOL_CONCURRENCY)]
    pub tool_concurrency: usize,
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_strategy: ChunkStrategyConfig::default(),
            record_chunks: false,
            tool_concurrency: DEFAULT_TOOL_CONCURRENCY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ProcessorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading processor config");
        Self::from_toml_str(&contents)
    }

    /// Defaults overlaid with environment variables (`.env` is loaded if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env()
    }

    /// Optional TOML file, then environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// Overlay process environment variables.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`, keyed by the `PARLEY_*` variable names.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let batch_size = lookup(ENV_BATCH_SIZE)
            .map(|raw| parse_number(ENV_BATCH_SIZE, &raw))
            .transpose()?;
        if let Some(name) = lookup(ENV_CHUNK_STRATEGY) {
            self.chunk_strategy = ChunkStrategyConfig::parse(&name, batch_size)?;
        } else if let (ChunkStrategyConfig::Batch { size }, Some(batch_size)) =
            (&mut self.chunk_strategy, batch_size)
        {
            *size = batch_size;
        }
        if let Some(raw) = lookup(ENV_RECORD_CHUNKS) {
            self.record_chunks = parse_bool(ENV_RECORD_CHUNKS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TOOL_CONCURRENCY) {
            self.tool_concurrency = parse_number(ENV_TOOL_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ITERATIONS) {
            self.max_iterations = parse_number(ENV_MAX_ITERATIONS, &raw)?;
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.tool_concurrency == 0 {
            return Err(ParleyError::Configuration(
                "tool_concurrency must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ParleyError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if let ChunkStrategyConfig::Batch { size: 0 } = self.chunk_strategy {
            return Err(ParleyError::Configuration(
                "batch chunk strategy needs a size of at least 1".into(),
            ));
        }
        Ok(self)
    }

    pub fn chunk_strategy(&self) -> Box<dyn ChunkStrategy> {
        self.chunk_strategy.build()
    }

    /// Processor options reflecting this config.
    pub fn processor_options(&self) -> StreamProcessorOptions {
        StreamProcessorOptions {
            chunk_strategy: Some(self.chunk_strategy()),
            record: self.record_chunks,
            ..Default::default()
        }
    }

    pub fn loop_strategy(&self) -> AgentLoopStrategy {
        max_iterations(self.max_iterations)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| ParleyError::Configuration(format!("{key} must be a positive integer, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ParleyError::Configuration(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}
