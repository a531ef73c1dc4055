//! Tool definitions and the per-turn tool call manager.

pub mod arguments;
pub mod manager;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use manager::{
    ToolCallChunk, ToolCallManager, ToolExecution, ToolResultEvent, DEFAULT_TOOL_CONCURRENCY,
};
pub use tool::{AgentTool, ClientTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, ParameterBuilder, ToolDefinition};
