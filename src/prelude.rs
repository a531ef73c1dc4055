//! Convenience re-exports for common use.

pub use crate::agent_loop::{
    chat, combine_strategies, max_iterations, until_finish_reason, AgentLoopState,
    AgentLoopStrategy, ChatAdapter, ChatOptions, ChatRequest,
};
pub use crate::config::ProcessorConfig;
pub use crate::convert::{
    convert_messages_to_model_messages, model_message_to_ui_message,
    model_messages_to_ui_messages, ui_message_to_model_messages, ChatMessage,
};
pub use crate::error::{ParleyError, Result};
pub use crate::stream::{
    ChunkRecording, ChunkStrategy, ProcessorEvent, ProcessorEventSink, ProcessorResult,
    StreamProcessor, StreamProcessorOptions,
};
pub use crate::tools::{
    AgentTool, AgentToolParameters, ClientTool, Tool, ToolArguments, ToolCallManager,
};
pub use crate::types::{
    ContentPart, MessagePart, ModelMessage, Role, StreamChunk, ToolCall, ToolCallState,
    UiMessage, UiRole, Usage,
};
