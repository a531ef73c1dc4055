//! Events the stream processor emits while it folds a stream.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::types::{ToolCallState, UiMessage};

/// Granular UI-update notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorEvent {
    /// The message list was replaced; the snapshot is never mutated afterwards.
    MessagesChanged { messages: Arc<Vec<UiMessage>> },
    StreamStart { message_id: String },
    /// The stream was finalized. Carries the assistant message, if any.
    StreamEnd { message: Option<UiMessage> },
    TextUpdate { message_id: String, text: String },
    ThinkingUpdate { message_id: String, content: String },
    ToolCallStateChange {
        message_id: String,
        tool_call_id: String,
        state: ToolCallState,
        arguments: String,
    },
    /// A client-side tool has complete input and must be executed by the caller.
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        input: serde_json::Value,
    },
    ApprovalRequest {
        tool_call_id: String,
        tool_name: String,
        input: serde_json::Value,
        approval_id: String,
    },
    Error { message: String, code: Option<String> },
}

/// Callback receiving processor events.
pub type ProcessorEventSink = Arc<dyn Fn(ProcessorEvent) + Send + Sync>;

/// A sink that forwards every event into an unbounded channel.
pub fn channel_sink() -> (ProcessorEventSink, UnboundedReceiverStream<ProcessorEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: ProcessorEventSink = Arc::new(move |event| {
        // A dropped receiver only means nobody is listening any more.
        let _ = tx.send(event);
    });
    (sink, UnboundedReceiverStream::new(rx))
}
