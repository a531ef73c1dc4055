//! Chat orchestration: adapter turns, server-side tool execution, and the loop.

use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::strategy::{max_iterations, AgentLoopState, AgentLoopStrategy, DEFAULT_MAX_ITERATIONS};
use crate::error::{ParleyError, Result};
use crate::tools::{Tool, ToolArguments, ToolCallManager, ToolDefinition, DEFAULT_TOOL_CONCURRENCY};
use crate::types::{
    ApprovalHandle, ApprovalRequested, ModelMessage, StreamChunk, ToolCall, ToolInputAvailable,
    CUSTOM_APPROVAL_REQUESTED, CUSTOM_TOOL_INPUT_AVAILABLE,
};

/// Finish reason signalling that the model wants tools executed.
pub const FINISH_REASON_TOOL_CALLS: &str = "tool_calls";

/// One request to a model backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ModelMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_prompts: Vec<String>,
}

/// Narrow capability interface implemented once per provider.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Capability kind, e.g. `"text"`.
    fn kind(&self) -> &str;
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    /// Start one model turn, translated into protocol events.
    async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>>;
}

/// Inputs for [`chat`].
#[derive(Builder)]
pub struct ChatOptions {
    pub adapter: Arc<dyn ChatAdapter>,
    pub messages: Vec<ModelMessage>,
    #[builder(default)]
    pub tools: Vec<Arc<dyn Tool>>,
    #[builder(default)]
    pub system_prompts: Vec<String>,
    /// Defaults to [`max_iterations`] with [`DEFAULT_MAX_ITERATIONS`].
    pub agent_loop_strategy: Option<AgentLoopStrategy>,
    pub cancel: Option<CancellationToken>,
    pub tool_concurrency: Option<usize>,
}

/// Run the agent loop, yielding every protocol event it produces.
///
/// Adapter chunks are forwarded as-is. After a `tool_calls` finish, server
/// tools run and each answer is yielded as a `TOOL_CALL_END` with `result`;
/// client and approval-gated tools are announced through `CUSTOM` events and
/// end the loop, since their answers arrive out of band. Adapter failures
/// become a single `RUN_ERROR`.
pub fn chat(options: ChatOptions) -> BoxStream<'static, StreamChunk> {
    let ChatOptions {
        adapter,
        messages,
        tools,
        system_prompts,
        agent_loop_strategy,
        cancel,
        tool_concurrency,
    } = options;
    let strategy = agent_loop_strategy.unwrap_or_else(|| max_iterations(DEFAULT_MAX_ITERATIONS));
    let cancel = cancel.unwrap_or_default();
    let concurrency = tool_concurrency.unwrap_or(DEFAULT_TOOL_CONCURRENCY);

    let stream = async_stream::stream! {
        let mut messages = messages;
        let mut manager = ToolCallManager::new(tools.clone()).with_concurrency(concurrency);
        let definitions: Vec<ToolDefinition> = tools.iter().map(|tool| tool.definition()).collect();
        let mut iteration = 0usize;

        loop {
            if cancel.is_cancelled() {
                debug!(iteration, "chat aborted before model call");
                break;
            }
            manager.clear();

            let request = ChatRequest {
                model: adapter.model().to_string(),
                messages: messages.clone(),
                tools: definitions.clone(),
                system_prompts: system_prompts.clone(),
            };
            debug!(
                adapter = adapter.name(),
                model = adapter.model(),
                iteration,
                messages = request.messages.len(),
                "requesting model turn"
            );
            let mut upstream = match adapter.chat_stream(&request).await {
                Ok(upstream) => upstream,
                Err(err) => {
                    if !err.is_aborted() {
                        yield adapter_error_chunk(adapter.as_ref(), &err);
                    }
                    break;
                }
            };

            let mut text = String::new();
            let mut finish_reason: Option<String> = None;
            let mut done: Option<StreamChunk> = None;
            let mut failed = false;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = upstream.next() => next,
                };
                let Some(item) = next else {
                    break;
                };
                match item {
                    Ok(chunk) => {
                        match &chunk {
                            StreamChunk::TextMessageContent { delta, content, .. } => {
                                if !delta.is_empty() {
                                    text.push_str(delta);
                                } else if let Some(content) = content.as_ref().filter(|c| c.starts_with(&text)) {
                                    text = content.clone();
                                }
                            }
                            StreamChunk::ToolCallStart { .. } | StreamChunk::ToolCallArgs { .. } => {
                                manager.add_stream_chunk(&chunk);
                            }
                            StreamChunk::RunFinished { finish_reason: reason, .. } => {
                                finish_reason = reason.clone();
                                done = Some(chunk.clone());
                            }
                            StreamChunk::RunError { .. } => failed = true,
                            _ => {}
                        }
                        yield chunk;
                    }
                    Err(err) => {
                        if !err.is_aborted() {
                            yield adapter_error_chunk(adapter.as_ref(), &err);
                        }
                        failed = true;
                        break;
                    }
                }
            }
            if failed || cancel.is_cancelled() {
                debug!(iteration, failed, "chat loop stopped");
                break;
            }

            let tool_calls = manager.tool_calls();
            if !text.is_empty() || !tool_calls.is_empty() {
                let content = (!text.is_empty()).then(|| text.clone());
                messages.push(ModelMessage::assistant_with_tool_calls(content, tool_calls.clone()));
            }
            iteration += 1;

            let wants_tools = finish_reason.as_deref() == Some(FINISH_REASON_TOOL_CALLS);
            if !wants_tools || tool_calls.is_empty() {
                break;
            }

            let done = done.unwrap_or_else(|| StreamChunk::run_finished(FINISH_REASON_TOOL_CALLS));
            let mut awaiting_client = false;
            for call in &tool_calls {
                let Some(tool) = manager.find_tool(&call.function.name) else {
                    continue;
                };
                if tool.needs_approval() {
                    awaiting_client = true;
                    yield approval_requested_chunk(call, &done);
                } else if !tool.has_execute() {
                    awaiting_client = true;
                    yield tool_input_available_chunk(call, &done);
                }
            }

            let runs_here = |call: &ToolCall| {
                tools
                    .iter()
                    .find(|tool| tool.name() == call.function.name)
                    .map_or(true, |tool| tool.has_execute() && !tool.needs_approval())
            };
            let mut execution = manager.execute_tools_where(&done, cancel.clone(), runs_here);
            while let Some(result) = execution.next().await {
                yield result.to_chunk();
            }
            messages.extend(execution.finish().await);

            if awaiting_client {
                debug!(iteration, "waiting for client tool results");
                break;
            }
            if cancel.is_cancelled() {
                break;
            }

            let keep_going = strategy(&AgentLoopState {
                iteration_count: iteration,
                messages: &messages,
                finish_reason: finish_reason.as_deref(),
            });
            if !keep_going {
                debug!(iteration, "loop strategy stopped the run");
                break;
            }
        }
    };
    Box::pin(stream)
}

fn adapter_error_chunk(adapter: &dyn ChatAdapter, err: &ParleyError) -> StreamChunk {
    warn!(adapter = adapter.name(), error = %err, "adapter failed");
    StreamChunk::run_error(err.user_message()).with_model(adapter.model())
}

fn call_input(call: &ToolCall) -> serde_json::Value {
    ToolArguments::parse(&call.function.arguments)
        .map(ToolArguments::into_value)
        .unwrap_or_else(|_| serde_json::json!({}))
}

fn stamped(chunk: StreamChunk, done: &StreamChunk) -> StreamChunk {
    let meta = done.meta();
    let chunk = match &meta.model {
        Some(model) => chunk.with_model(model.clone()),
        None => chunk,
    };
    chunk.with_timestamp(
        meta.timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
    )
}

fn tool_input_available_chunk(call: &ToolCall, done: &StreamChunk) -> StreamChunk {
    let payload = ToolInputAvailable {
        tool_call_id: call.id.clone(),
        tool_name: call.function.name.clone(),
        input: call_input(call),
    };
    let data = serde_json::to_value(payload).unwrap_or_default();
    stamped(StreamChunk::custom(CUSTOM_TOOL_INPUT_AVAILABLE, data), done)
}

fn approval_requested_chunk(call: &ToolCall, done: &StreamChunk) -> StreamChunk {
    let payload = ApprovalRequested {
        tool_call_id: call.id.clone(),
        tool_name: call.function.name.clone(),
        input: call_input(call),
        approval: ApprovalHandle {
            id: format!("approval_{}", call.id),
        },
    };
    let data = serde_json::to_value(payload).unwrap_or_default();
    stamped(StreamChunk::custom(CUSTOM_APPROVAL_REQUESTED, data), done)
}
