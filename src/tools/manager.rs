//! Accumulates streamed tool-call deltas for one model turn and executes them.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use crate::types::{ChunkMeta, ModelMessage, StreamChunk, ToolCall};

/// Default number of tool executions allowed in flight at once.
pub const DEFAULT_TOOL_CONCURRENCY: usize = 4;

/// One tool-call delta as produced by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallChunk {
    pub tool_call: ToolCall,
    /// Provider-assigned position, used when a delta arrives without an id.
    pub index: Option<usize>,
}

/// Result of one tool execution, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultEvent {
    pub tool_call_id: String,
    pub tool_name: String,
    pub content: String,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub timestamp: i64,
}

impl ToolResultEvent {
    /// The `TOOL_CALL_END` chunk carrying this result inline.
    pub fn to_chunk(&self) -> StreamChunk {
        StreamChunk::ToolCallEnd {
            tool_call_id: self.tool_call_id.clone(),
            tool_name: Some(self.tool_name.clone()),
            input: None,
            result: Some(self.content.clone()),
            meta: ChunkMeta {
                model: self.model.clone(),
                timestamp: Some(self.timestamp),
            },
        }
    }

    /// The wire `tool` message answering the call.
    pub fn to_message(&self) -> ModelMessage {
        ModelMessage::tool(&self.tool_call_id, &self.content)
    }
}

/// Owns the in-flight tool calls of a single model turn.
///
/// Calls live in an append-only arena; the id and index maps only point
/// into it, so positions stay stable until [`ToolCallManager::clear`].
pub struct ToolCallManager {
    tools: Arc<Vec<Arc<dyn Tool>>>,
    calls: Vec<ToolCall>,
    by_id: HashMap<String, usize>,
    by_index: HashMap<usize, usize>,
    concurrency: usize,
}

impl ToolCallManager {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools: Arc::new(tools),
            calls: Vec::new(),
            by_id: HashMap::new(),
            by_index: HashMap::new(),
            concurrency: DEFAULT_TOOL_CONCURRENCY,
        }
    }

    /// Limit how many executors run at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Fold one delta into the call it belongs to.
    ///
    /// The first non-empty name wins; argument fragments are appended.
    pub fn add_tool_call_chunk(&mut self, chunk: ToolCallChunk) {
        let ToolCallChunk { tool_call, index } = chunk;
        let slot = if tool_call.id.is_empty() {
            index.and_then(|i| self.by_index.get(&i).copied())
        } else {
            self.by_id.get(&tool_call.id).copied()
        };

        match slot {
            Some(slot) => {
                let existing = &mut self.calls[slot];
                if existing.function.name.is_empty() && !tool_call.function.name.is_empty() {
                    existing.function.name = tool_call.function.name;
                }
                existing.function.arguments.push_str(&tool_call.function.arguments);
            }
            None => {
                let slot = self.calls.len();
                if !tool_call.id.is_empty() {
                    self.by_id.insert(tool_call.id.clone(), slot);
                }
                if let Some(index) = index {
                    self.by_index.insert(index, slot);
                }
                self.calls.push(tool_call);
            }
        }
    }

    /// Record a `TOOL_CALL_START`.
    pub fn add_tool_call_start(&mut self, id: &str, name: &str, index: Option<usize>) {
        self.add_tool_call_chunk(ToolCallChunk {
            tool_call: ToolCall::new(id, name, ""),
            index,
        });
    }

    /// Record a `TOOL_CALL_ARGS` delta.
    pub fn add_tool_call_args(&mut self, id: &str, delta: &str) {
        self.add_tool_call_chunk(ToolCallChunk {
            tool_call: ToolCall::new(id, "", delta),
            index: None,
        });
    }

    /// Feed any protocol event; only tool-call start/args events are used.
    pub fn add_stream_chunk(&mut self, chunk: &StreamChunk) {
        match chunk {
            StreamChunk::ToolCallStart {
                tool_call_id,
                tool_name,
                index,
                ..
            } => self.add_tool_call_start(tool_call_id, tool_name, *index),
            StreamChunk::ToolCallArgs {
                tool_call_id,
                delta,
                ..
            } => self.add_tool_call_args(tool_call_id, delta),
            _ => {}
        }
    }

    /// Fully identified calls, in the order they were first seen.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.calls
            .iter()
            .filter(|call| !call.function.name.is_empty())
            .cloned()
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.calls.iter().any(|call| !call.function.name.is_empty())
    }

    /// Drop all accumulated calls before a new model turn.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.by_id.clear();
        self.by_index.clear();
    }

    /// Execute every known call.
    ///
    /// `done` is the event that ended the turn; its model id and timestamp
    /// stamp the results. Executors may overlap, but results are yielded in
    /// call order. A call not yet started when `cancel` fires is skipped.
    pub fn execute_tools(&self, done: &StreamChunk, cancel: CancellationToken) -> ToolExecution {
        self.execute_calls(self.tool_calls(), done, cancel)
    }

    /// Like [`ToolCallManager::execute_tools`], restricted to calls matching `keep`.
    pub fn execute_tools_where(
        &self,
        done: &StreamChunk,
        cancel: CancellationToken,
        keep: impl Fn(&ToolCall) -> bool,
    ) -> ToolExecution {
        let calls = self.tool_calls().into_iter().filter(|c| keep(c)).collect();
        self.execute_calls(calls, done, cancel)
    }

    fn execute_calls(
        &self,
        calls: Vec<ToolCall>,
        done: &StreamChunk,
        cancel: CancellationToken,
    ) -> ToolExecution {
        let tools = Arc::clone(&self.tools);
        let model = done.meta().model.clone();
        let timestamp = done.meta().timestamp;
        debug!(count = calls.len(), concurrency = self.concurrency, "executing tool calls");

        let inner = stream::iter(calls)
            .map(move |call| {
                let tools = Arc::clone(&tools);
                let cancel = cancel.clone();
                let model = model.clone();
                async move {
                    if cancel.is_cancelled() {
                        debug!(tool_call_id = %call.id, "skipping tool call after abort");
                        return None;
                    }
                    let (content, is_error) = run_tool_call(&tools, &call).await;
                    Some(ToolResultEvent {
                        tool_call_id: call.id,
                        tool_name: call.function.name,
                        content,
                        is_error,
                        model,
                        timestamp: timestamp
                            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
                    })
                }
            })
            .buffered(self.concurrency)
            .filter_map(future::ready)
            .boxed();

        ToolExecution {
            inner,
            messages: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ToolCallManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallManager")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("calls", &self.calls)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

async fn run_tool_call(tools: &[Arc<dyn Tool>], call: &ToolCall) -> (String, bool) {
    let name = call.function.name.as_str();
    let args = match ToolArguments::parse(&call.function.arguments) {
        Ok(args) => args,
        Err(err) => {
            warn!(tool = name, tool_call_id = %call.id, error = %err, "invalid tool arguments");
            return (format!("Error executing tool: {}", err.user_message()), true);
        }
    };

    let Some(tool) = tools
        .iter()
        .find(|tool| tool.name() == name)
        .filter(|tool| tool.has_execute())
    else {
        return (format!("Tool {name} does not have an execute function"), true);
    };

    let ctx = ToolExecutionContext {
        tool_call_id: Some(call.id.clone()),
        tool_name: Some(name.to_string()),
        metadata: serde_json::Value::Null,
    };
    debug!(tool = name, tool_call_id = %call.id, "executing tool");
    match tool.execute(&args, &ctx).await {
        Ok(serde_json::Value::String(text)) => (text, false),
        Ok(value) => (value.to_string(), false),
        Err(err) => {
            warn!(tool = name, tool_call_id = %call.id, error = %err, "tool execution failed");
            (format!("Error executing tool: {}", err.user_message()), true)
        }
    }
}

/// Lazy, single-pass sequence of tool results.
///
/// Poll it as a [`Stream`] to observe each result as it resolves, then call
/// [`ToolExecution::finish`] for the wire `tool` messages in call order.
pub struct ToolExecution {
    inner: BoxStream<'static, ToolResultEvent>,
    messages: Vec<ModelMessage>,
}

impl ToolExecution {
    /// Drain any remaining results and return one `tool` message per executed call.
    pub async fn finish(mut self) -> Vec<ModelMessage> {
        while self.next().await.is_some() {}
        self.messages
    }
}

impl Stream for ToolExecution {
    type Item = ToolResultEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(event)) => {
                this.messages.push(event.to_message());
                Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}
