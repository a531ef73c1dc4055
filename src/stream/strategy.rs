//! Chunk strategies: when to push accumulated text out to the UI.

use std::sync::LazyLock;

use regex::Regex;

static CLAUSE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,!?;:\n]").expect("punctuation regex must compile"));

/// Decides, per incoming text delta, whether a UI text update is emitted.
pub trait ChunkStrategy: Send + Sync {
    /// `chunk` is the new delta, `accumulated` the segment text including it.
    fn should_emit(&mut self, chunk: &str, accumulated: &str) -> bool;

    /// Called when a new text segment or stream starts.
    fn reset(&mut self) {}
}

/// Emit on every delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateStrategy;

impl ChunkStrategy for ImmediateStrategy {
    fn should_emit(&mut self, _chunk: &str, _accumulated: &str) -> bool {
        true
    }
}

/// Emit when a delta contains sentence or clause punctuation, or a newline.
#[derive(Debug, Clone)]
pub struct PunctuationStrategy {
    pattern: Regex,
}

impl PunctuationStrategy {
    pub fn new() -> Self {
        Self {
            pattern: CLAUSE_END_RE.clone(),
        }
    }

    /// Emit whenever a delta matches `pattern` instead.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for PunctuationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkStrategy for PunctuationStrategy {
    fn should_emit(&mut self, chunk: &str, _accumulated: &str) -> bool {
        self.pattern.is_match(chunk)
    }
}

/// Emit every `size` deltas.
#[derive(Debug, Clone)]
pub struct BatchStrategy {
    size: usize,
    seen: usize,
}

impl BatchStrategy {
    /// A size of zero behaves like one.
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            seen: 0,
        }
    }
}

impl ChunkStrategy for BatchStrategy {
    fn should_emit(&mut self, _chunk: &str, _accumulated: &str) -> bool {
        self.seen += 1;
        if self.seen >= self.size {
            self.seen = 0;
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.seen = 0;
    }
}

/// Emit when a delta ends on whitespace, so words are never split.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryStrategy;

impl ChunkStrategy for WordBoundaryStrategy {
    fn should_emit(&mut self, chunk: &str, _accumulated: &str) -> bool {
        chunk.chars().last().is_some_and(char::is_whitespace)
    }
}

/// Emit if any inner strategy would. Every inner strategy sees every delta.
pub struct CompositeStrategy {
    strategies: Vec<Box<dyn ChunkStrategy>>,
}

impl CompositeStrategy {
    pub fn new(strategies: Vec<Box<dyn ChunkStrategy>>) -> Self {
        Self { strategies }
    }
}

impl ChunkStrategy for CompositeStrategy {
    fn should_emit(&mut self, chunk: &str, accumulated: &str) -> bool {
        self.strategies
            .iter_mut()
            .fold(false, |emit, strategy| strategy.should_emit(chunk, accumulated) || emit)
    }

    fn reset(&mut self) {
        for strategy in &mut self.strategies {
            strategy.reset();
        }
    }
}
