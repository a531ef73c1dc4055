//! Stream processing: folding protocol events into conversation state.

pub mod events;
pub mod json_parser;
pub mod processor;
pub mod recording;
pub mod strategy;

pub use events::{channel_sink, ProcessorEvent, ProcessorEventSink};
pub use json_parser::{LenientJsonParser, PartialJsonParser};
pub use processor::{ProcessorResult, StreamProcessor, StreamProcessorOptions};
pub use recording::{create_replay_stream, ChunkRecording, RecordedChunk, RECORDING_VERSION};
pub use strategy::{
    BatchStrategy, ChunkStrategy, CompositeStrategy, ImmediateStrategy, PunctuationStrategy,
    WordBoundaryStrategy,
};
