//! Agent loop: loop strategies and the chat orchestration built on them.

pub mod runner;
pub mod strategy;

pub use runner::{chat, ChatAdapter, ChatOptions, ChatRequest, FINISH_REASON_TOOL_CALLS};
pub use strategy::{
    combine_strategies, max_iterations, until_finish_reason, AgentLoopState, AgentLoopStrategy,
    DEFAULT_MAX_ITERATIONS,
};
