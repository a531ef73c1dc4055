//! Capturing processed chunks so a stream can be replayed deterministically.

use std::path::Path;

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::processor::ProcessorResult;
use crate::error::{ParleyError, Result};
use crate::types::StreamChunk;

/// Current recording format version.
pub const RECORDING_VERSION: &str = "1.0";

/// One captured chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedChunk {
    pub chunk: StreamChunk,
    /// Capture time, ms since the Unix epoch.
    pub timestamp: i64,
    pub index: usize,
}

/// A captured stream, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecording {
    pub version: String,
    pub timestamp: i64,
    pub chunks: Vec<RecordedChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessorResult>,
}

impl Default for ChunkRecording {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkRecording {
    pub fn new() -> Self {
        Self {
            version: RECORDING_VERSION.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            chunks: Vec::new(),
            result: None,
        }
    }

    /// Append a chunk, stamping it with the current time and the next index.
    pub fn push(&mut self, chunk: StreamChunk) {
        let index = self.chunks.len();
        self.chunks.push(RecordedChunk {
            chunk,
            timestamp: chrono::Utc::now().timestamp_millis(),
            index,
        });
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a recording, rejecting unknown major versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let recording: Self = serde_json::from_str(json)?;
        if !recording.version.starts_with("1.") {
            return Err(ParleyError::Recording(format!(
                "unsupported recording version: {}",
                recording.version
            )));
        }
        Ok(recording)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.to_json()?).await?;
        debug!(path = %path.display(), chunks = self.chunks.len(), "saved chunk recording");
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&contents)
    }
}

/// A stream yielding the recorded chunks in index order.
pub fn create_replay_stream(recording: &ChunkRecording) -> BoxStream<'static, StreamChunk> {
    let mut chunks = recording.chunks.clone();
    chunks.sort_by_key(|recorded| recorded.index);
    stream::iter(chunks.into_iter().map(|recorded| recorded.chunk)).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_assigns_sequential_indices() {
        let mut recording = ChunkRecording::new();
        recording.push(StreamChunk::text_delta("a"));
        recording.push(StreamChunk::run_finished("stop"));
        let indices: Vec<usize> = recording.chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(recording.version, "1.0");
    }

    #[test]
    fn json_shape_matches_format() {
        let mut recording = ChunkRecording::new();
        recording.push(StreamChunk::text_delta("a"));
        let value: serde_json::Value =
            serde_json::from_str(&recording.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["chunks"][0]["index"], 0);
        assert_eq!(value["chunks"][0]["chunk"]["type"], "TEXT_MESSAGE_CONTENT");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let json = r#"{"version":"2.0","timestamp":0,"chunks":[]}"#;
        let err = ChunkRecording::from_json(json).unwrap_err();
        assert!(matches!(err, ParleyError::Recording(_)));
    }

    #[tokio::test]
    async fn replay_stream_orders_by_index() {
        let mut recording = ChunkRecording::new();
        recording.push(StreamChunk::text_delta("a"));
        recording.push(StreamChunk::text_delta("b"));
        recording.chunks.reverse();
        let replayed: Vec<StreamChunk> = create_replay_stream(&recording).collect().await;
        assert_eq!(
            replayed,
            vec![StreamChunk::text_delta("a"), StreamChunk::text_delta("b")]
        );
    }
}
