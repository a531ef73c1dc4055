//! The stream processor: folds protocol events into the UI message list.

use std::collections::HashMap;
use std::sync::Arc;

use bon::Builder;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::events::{ProcessorEvent, ProcessorEventSink};
use super::json_parser::{LenientJsonParser, PartialJsonParser};
use super::recording::{create_replay_stream, ChunkRecording};
use super::strategy::{ChunkStrategy, ImmediateStrategy};
use crate::convert::convert_messages_to_model_messages;
use crate::types::{
    ApprovalRequested, MessagePart, ModelMessage, RunErrorInfo, StreamChunk, ToolApproval,
    ToolCall, ToolCallPart, ToolCallState, ToolInputAvailable, ToolResultPart, ToolResultState,
    UiMessage, UiRole, CUSTOM_APPROVAL_REQUESTED, CUSTOM_TOOL_INPUT_AVAILABLE,
};

/// Summary of one processed stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorResult {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Construction options. Every field is optional.
#[derive(Default, Builder)]
pub struct StreamProcessorOptions {
    /// Defaults to emitting on every delta.
    pub chunk_strategy: Option<Box<dyn ChunkStrategy>>,
    /// Defaults to [`LenientJsonParser`].
    pub json_parser: Option<Arc<dyn PartialJsonParser>>,
    pub event_sink: Option<ProcessorEventSink>,
    /// Capture every processed chunk into a [`ChunkRecording`].
    #[builder(default)]
    pub record: bool,
    #[builder(default)]
    pub initial_messages: Vec<UiMessage>,
}

#[derive(Debug, Clone)]
struct ToolCallRecord {
    id: String,
    name: String,
    arguments: String,
    state: ToolCallState,
    parsed_arguments: Option<serde_json::Value>,
}

/// Single-owner state machine over one protocol event stream at a time.
///
/// The message list is held behind an [`Arc`] and replaced on every
/// mutation, so a snapshot handed out earlier never changes.
pub struct StreamProcessor {
    messages: Arc<Vec<UiMessage>>,
    current_assistant_message_id: Option<String>,

    total_text: String,
    segment_text: String,
    last_emitted_text: String,
    thinking: String,

    // Arena of this turn's calls; `tool_call_slots` only indexes into it.
    tool_calls: Vec<ToolCallRecord>,
    tool_call_slots: HashMap<String, usize>,
    tool_calls_since_text: bool,
    // Part index of the current segment's text within the assistant message.
    segment_part: Option<usize>,

    finish_reason: Option<String>,
    is_done: bool,

    chunk_strategy: Box<dyn ChunkStrategy>,
    json_parser: Arc<dyn PartialJsonParser>,
    event_sink: Option<ProcessorEventSink>,
    recording: Option<ChunkRecording>,
}

impl Default for StreamProcessor {
    fn default() -> Self {
        Self::new(StreamProcessorOptions::default())
    }
}

impl StreamProcessor {
    pub fn new(options: StreamProcessorOptions) -> Self {
        Self {
            messages: Arc::new(options.initial_messages),
            current_assistant_message_id: None,
            total_text: String::new(),
            segment_text: String::new(),
            last_emitted_text: String::new(),
            thinking: String::new(),
            tool_calls: Vec::new(),
            tool_call_slots: HashMap::new(),
            tool_calls_since_text: false,
            segment_part: None,
            finish_reason: None,
            is_done: false,
            chunk_strategy: options
                .chunk_strategy
                .unwrap_or_else(|| Box::new(ImmediateStrategy)),
            json_parser: options
                .json_parser
                .unwrap_or_else(|| Arc::new(LenientJsonParser)),
            event_sink: options.event_sink,
            recording: options.record.then(ChunkRecording::new),
        }
    }

    /// Replay a capture through a fresh processor.
    pub async fn replay(
        recording: &ChunkRecording,
        options: StreamProcessorOptions,
    ) -> ProcessorResult {
        let mut processor = Self::new(options);
        processor.process(create_replay_stream(recording)).await
    }

    // ---- history ----

    /// Current snapshot of the conversation.
    pub fn messages(&self) -> Arc<Vec<UiMessage>> {
        Arc::clone(&self.messages)
    }

    pub fn set_messages(&mut self, messages: Vec<UiMessage>) {
        let keeps_current = self
            .current_assistant_message_id
            .as_ref()
            .is_some_and(|id| messages.iter().any(|m| &m.id == id));
        if !keeps_current {
            self.current_assistant_message_id = None;
            self.segment_part = None;
        }
        self.replace_messages(messages);
    }

    /// Keep messages up to and including `message_id`. Unknown ids are ignored.
    pub fn remove_messages_after(&mut self, message_id: &str) {
        let Some(position) = self.messages.iter().position(|m| m.id == message_id) else {
            warn!(message_id, "remove_messages_after: unknown message id");
            return;
        };
        let mut messages = self.messages.as_ref().clone();
        messages.truncate(position + 1);
        self.set_messages(messages);
    }

    pub fn clear_messages(&mut self) {
        self.current_assistant_message_id = None;
        self.segment_part = None;
        self.replace_messages(Vec::new());
    }

    /// The conversation as wire messages, ready for the next model call.
    pub fn to_model_messages(&self) -> Vec<ModelMessage> {
        convert_messages_to_model_messages(self.messages.iter().cloned())
    }

    /// Append a user turn. The next stream starts a fresh assistant message.
    pub fn add_user_message(&mut self, content: impl Into<String>) -> UiMessage {
        self.reset_stream_state();
        self.current_assistant_message_id = None;
        let message = UiMessage::user(content);
        self.push_message(message.clone());
        message
    }

    /// Begin a new assistant turn and return its message id.
    pub fn start_assistant_message(&mut self) -> String {
        self.reset_stream_state();
        self.create_assistant_message()
    }

    pub fn start_recording(&mut self) {
        self.recording = Some(ChunkRecording::new());
    }

    pub fn recording(&self) -> Option<&ChunkRecording> {
        self.recording.as_ref()
    }

    pub fn take_recording(&mut self) -> Option<ChunkRecording> {
        self.recording.take()
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    // ---- stream processing ----

    /// Drain `stream`, then finalize.
    pub async fn process<S>(&mut self, stream: S) -> ProcessorResult
    where
        S: Stream<Item = StreamChunk>,
    {
        self.process_with_cancel(stream, CancellationToken::new())
            .await
    }

    /// Drain `stream` until it ends or `cancel` fires.
    ///
    /// Cancelling before the call consumes nothing and leaves state untouched.
    pub async fn process_with_cancel<S>(
        &mut self,
        stream: S,
        cancel: CancellationToken,
    ) -> ProcessorResult
    where
        S: Stream<Item = StreamChunk>,
    {
        if cancel.is_cancelled() {
            debug!("stream aborted before start");
            return self.result();
        }

        let mut stream = std::pin::pin!(stream);
        let mut processed = 0usize;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(processed, "stream aborted");
                    break;
                }
                next = stream.next() => match next {
                    Some(chunk) => {
                        processed += 1;
                        self.process_chunk(chunk);
                    }
                    None => break,
                },
            }
        }

        self.finalize_stream();
        let result = self.result();
        if let Some(recording) = self.recording.as_mut() {
            recording.result = Some(result.clone());
        }
        debug!(
            processed,
            finish_reason = ?result.finish_reason,
            tool_calls = result.tool_calls.len(),
            "stream processed"
        );
        result
    }

    /// Apply one protocol event.
    pub fn process_chunk(&mut self, chunk: StreamChunk) {
        trace!(kind = chunk.kind(), "processing chunk");
        if let Some(recording) = self.recording.as_mut() {
            recording.push(chunk.clone());
        }

        match chunk {
            StreamChunk::TextMessageContent { delta, content, .. } => {
                self.handle_text(&delta, content.as_deref())
            }
            StreamChunk::ToolCallStart {
                tool_call_id,
                tool_name,
                ..
            } => self.handle_tool_call_start(tool_call_id, tool_name),
            StreamChunk::ToolCallArgs {
                tool_call_id,
                delta,
                ..
            } => self.handle_tool_call_args(&tool_call_id, &delta),
            StreamChunk::ToolCallEnd {
                tool_call_id,
                input,
                result,
                ..
            } => self.handle_tool_call_end(&tool_call_id, input, result),
            StreamChunk::StepFinished { delta, content, .. } => {
                self.handle_thinking(&delta, content.as_deref())
            }
            StreamChunk::RunFinished { finish_reason, .. } => {
                self.finish_reason = finish_reason;
                self.is_done = true;
                self.complete_all_tool_calls();
            }
            StreamChunk::RunError { error, .. } => self.handle_run_error(error),
            StreamChunk::Custom { name, data, .. } => self.handle_custom(&name, data),
            StreamChunk::RunStarted { .. }
            | StreamChunk::TextMessageStart { .. }
            | StreamChunk::TextMessageEnd { .. }
            | StreamChunk::StepStarted { .. }
            | StreamChunk::StateSnapshot { .. }
            | StreamChunk::StateDelta { .. } => {}
        }
    }

    /// Close open tool calls, flush pending text, and signal the end of the stream.
    pub fn finalize_stream(&mut self) {
        self.complete_all_tool_calls();
        if self.segment_text != self.last_emitted_text {
            self.emit_text_update();
        }
        let message = self.current_assistant_message().cloned();
        self.emit(ProcessorEvent::StreamEnd { message });
    }

    pub fn result(&self) -> ProcessorResult {
        ProcessorResult {
            content: self.total_text.clone(),
            thinking: (!self.thinking.is_empty()).then(|| self.thinking.clone()),
            tool_calls: self
                .tool_calls
                .iter()
                .filter(|record| !record.name.is_empty())
                .map(record_to_tool_call)
                .collect(),
            finish_reason: self.finish_reason.clone(),
        }
    }

    /// Calls of this turn whose input has finished streaming.
    pub fn completed_tool_calls(&self) -> Vec<ToolCall> {
        self.tool_calls
            .iter()
            .filter(|record| record.state >= ToolCallState::InputComplete)
            .map(record_to_tool_call)
            .collect()
    }

    // ---- client-side results and approvals ----

    /// Record the output of a client-executed tool.
    ///
    /// Updates the call's `output` and upserts exactly one tool-result part.
    pub fn add_tool_result(
        &mut self,
        tool_call_id: &str,
        output: serde_json::Value,
        error: Option<String>,
    ) {
        let Some(message_index) = self.message_index_with_tool_call(|p| p.id == tool_call_id)
        else {
            warn!(tool_call_id, "add_tool_result: unknown tool call id");
            return;
        };

        let content = match &output {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let result = ToolResultPart {
            tool_call_id: tool_call_id.to_string(),
            content,
            state: if error.is_some() {
                ToolResultState::Error
            } else {
                ToolResultState::Complete
            },
            error,
        };

        self.update_messages(|messages| {
            let message = &mut messages[message_index];
            for part in &mut message.parts {
                if let MessagePart::ToolCall(call) = part {
                    if call.id == tool_call_id {
                        call.output = Some(output.clone());
                    }
                }
            }
            let existing = message.parts.iter_mut().find_map(|part| match part {
                MessagePart::ToolResult(existing) if existing.tool_call_id == tool_call_id => {
                    Some(existing)
                }
                _ => None,
            });
            match existing {
                Some(existing) => *existing = result,
                None => message.parts.push(MessagePart::ToolResult(result)),
            }
        });
    }

    /// Record the user's decision for a pending approval.
    pub fn add_tool_approval_response(&mut self, approval_id: &str, approved: bool) {
        let matches = |part: &ToolCallPart| {
            part.approval
                .as_ref()
                .is_some_and(|approval| approval.id == approval_id)
        };
        let Some(message_index) = self.message_index_with_tool_call(matches) else {
            warn!(approval_id, "add_tool_approval_response: unknown approval id");
            return;
        };

        let mut changed = None;
        self.update_messages(|messages| {
            let message = &mut messages[message_index];
            for part in &mut message.parts {
                if let MessagePart::ToolCall(call) = part {
                    if matches(&*call) {
                        if let Some(approval) = call.approval.as_mut() {
                            approval.approved = Some(approved);
                        }
                        call.advance(ToolCallState::ApprovalResponded);
                        changed = Some((message.id.clone(), call.clone()));
                    }
                }
            }
        });

        if let Some((message_id, call)) = changed {
            self.set_record_state(&call.id, call.state);
            self.emit_tool_call_state(&message_id, &call);
        }
    }

    /// Whether every tool call of the latest assistant message is resolved.
    pub fn are_all_tools_complete(&self) -> bool {
        let Some(message) = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role == UiRole::Assistant)
        else {
            return true;
        };
        message.tool_call_parts().all(|call| {
            call.state == ToolCallState::ApprovalResponded
                || (call.output.is_some() && call.approval.is_none())
                || message
                    .tool_result_parts()
                    .any(|result| result.tool_call_id == call.id)
        })
    }

    // ---- event handlers ----

    fn handle_text(&mut self, delta: &str, content: Option<&str>) {
        self.complete_all_tool_calls();

        let previous = self.segment_text.clone();
        if self.tool_calls_since_text
            && !previous.is_empty()
            && starts_new_segment(delta, content, &previous)
        {
            if previous != self.last_emitted_text {
                self.emit_text_update();
            }
            self.segment_text.clear();
            self.last_emitted_text.clear();
            self.segment_part = None;
            self.chunk_strategy.reset();
        }
        self.tool_calls_since_text = false;

        let current = self.segment_text.clone();
        let next = merge_text(&current, delta, content);
        if next == current {
            return;
        }
        self.total_text.push_str(&next[current.len()..]);
        self.segment_text = next;

        let portion = if delta.is_empty() {
            content.unwrap_or_default()
        } else {
            delta
        };
        if self.chunk_strategy.should_emit(portion, &self.segment_text) {
            self.emit_text_update();
        }
    }

    fn handle_tool_call_start(&mut self, id: String, name: String) {
        // Pending text belongs before the call in part order.
        if self.segment_text != self.last_emitted_text {
            self.emit_text_update();
        }
        self.tool_calls_since_text = true;
        if let Some(&slot) = self.tool_call_slots.get(&id) {
            if self.tool_calls[slot].name.is_empty() && !name.is_empty() {
                self.tool_calls[slot].name = name;
            }
            return;
        }

        let slot = self.tool_calls.len();
        self.tool_call_slots.insert(id.clone(), slot);
        self.tool_calls.push(ToolCallRecord {
            id: id.clone(),
            name: name.clone(),
            arguments: String::new(),
            state: ToolCallState::AwaitingInput,
            parsed_arguments: None,
        });

        let part = ToolCallPart::new(id, name, "", ToolCallState::AwaitingInput);
        let message_id = self.ensure_assistant_message();
        self.update_current_message(|message| message.parts.push(MessagePart::ToolCall(part.clone())));
        self.emit_tool_call_state(&message_id, &part);
    }

    fn handle_tool_call_args(&mut self, id: &str, delta: &str) {
        let Some(&slot) = self.tool_call_slots.get(id) else {
            warn!(tool_call_id = id, "arguments for unknown tool call");
            return;
        };
        let record = &mut self.tool_calls[slot];
        record.arguments.push_str(delta);
        if record.state == ToolCallState::AwaitingInput && !delta.is_empty() {
            record.state = ToolCallState::InputStreaming;
        }
        if let Some(parsed) = self.json_parser.parse(&record.arguments) {
            record.parsed_arguments = Some(parsed);
        }
        let record = record.clone();
        self.sync_tool_call_part(&record);
    }

    fn handle_tool_call_end(
        &mut self,
        id: &str,
        input: Option<serde_json::Value>,
        result: Option<String>,
    ) {
        if let Some(&slot) = self.tool_call_slots.get(id) {
            if let Some(input) = input {
                self.tool_calls[slot].parsed_arguments = Some(input);
            }
            self.complete_tool_call(slot);
        }

        let Some(result) = result else {
            return;
        };
        let part = ToolResultPart::complete(id, result);
        self.ensure_assistant_message();
        self.update_current_message(|message| {
            let existing = message.parts.iter_mut().find_map(|p| match p {
                MessagePart::ToolResult(existing) if existing.tool_call_id == part.tool_call_id => {
                    Some(existing)
                }
                _ => None,
            });
            match existing {
                Some(existing) => *existing = part.clone(),
                None => message.parts.push(MessagePart::ToolResult(part.clone())),
            }
        });
    }

    fn handle_thinking(&mut self, delta: &str, content: Option<&str>) {
        let next = merge_text(&self.thinking, delta, content);
        if next == self.thinking {
            return;
        }
        self.thinking = next;

        let thinking = self.thinking.clone();
        let message_id = self.ensure_assistant_message();
        self.update_current_message(|message| {
            let existing = message.parts.iter_mut().find_map(|part| match part {
                MessagePart::Thinking { content } => Some(content),
                _ => None,
            });
            match existing {
                Some(existing) => *existing = thinking.clone(),
                None => message.parts.push(MessagePart::thinking(thinking.clone())),
            }
        });
        self.emit(ProcessorEvent::ThinkingUpdate {
            message_id,
            content: thinking,
        });
    }

    fn handle_run_error(&mut self, error: RunErrorInfo) {
        warn!(message = %error.message, code = ?error.code, "run error reported by stream");
        self.emit(ProcessorEvent::Error {
            message: error.message,
            code: error.code,
        });
    }

    fn handle_custom(&mut self, name: &str, data: serde_json::Value) {
        match name {
            CUSTOM_TOOL_INPUT_AVAILABLE => {
                match serde_json::from_value::<ToolInputAvailable>(data) {
                    Ok(payload) => self.emit(ProcessorEvent::ToolCall {
                        tool_call_id: payload.tool_call_id,
                        tool_name: payload.tool_name,
                        input: payload.input,
                    }),
                    Err(err) => warn!(error = %err, "malformed tool-input-available payload"),
                }
            }
            CUSTOM_APPROVAL_REQUESTED => match serde_json::from_value::<ApprovalRequested>(data) {
                Ok(payload) => self.handle_approval_requested(payload),
                Err(err) => warn!(error = %err, "malformed approval-requested payload"),
            },
            other => trace!(name = other, "ignoring custom event"),
        }
    }

    fn handle_approval_requested(&mut self, payload: ApprovalRequested) {
        let tool_call_id = payload.tool_call_id.clone();
        let approval = ToolApproval {
            id: payload.approval.id.clone(),
            needs_approval: true,
            approved: None,
        };

        let mut changed = None;
        if let Some(message_index) = self.message_index_with_tool_call(|p| p.id == tool_call_id) {
            self.update_messages(|messages| {
                let message = &mut messages[message_index];
                for part in &mut message.parts {
                    if let MessagePart::ToolCall(call) = part {
                        if call.id == tool_call_id {
                            call.approval = Some(approval.clone());
                            call.advance(ToolCallState::ApprovalRequested);
                            changed = Some((message.id.clone(), call.clone()));
                        }
                    }
                }
            });
        } else {
            warn!(tool_call_id = %tool_call_id, "approval requested for unknown tool call");
        }

        if let Some((message_id, call)) = changed {
            self.set_record_state(&call.id, call.state);
            self.emit_tool_call_state(&message_id, &call);
        }
        self.emit(ProcessorEvent::ApprovalRequest {
            tool_call_id: payload.tool_call_id,
            tool_name: payload.tool_name,
            input: payload.input,
            approval_id: payload.approval.id,
        });
    }

    // ---- tool-call bookkeeping ----

    fn complete_all_tool_calls(&mut self) {
        for slot in 0..self.tool_calls.len() {
            self.complete_tool_call(slot);
        }
    }

    fn complete_tool_call(&mut self, slot: usize) {
        let record = &mut self.tool_calls[slot];
        if record.state >= ToolCallState::InputComplete {
            return;
        }
        record.state = ToolCallState::InputComplete;
        let final_parse = serde_json::from_str(&record.arguments)
            .ok()
            .or_else(|| self.json_parser.parse(&record.arguments));
        if final_parse.is_some() {
            record.parsed_arguments = final_parse;
        }
        let record = record.clone();
        self.sync_tool_call_part(&record);
    }

    fn set_record_state(&mut self, tool_call_id: &str, state: ToolCallState) {
        if let Some(&slot) = self.tool_call_slots.get(tool_call_id) {
            let record = &mut self.tool_calls[slot];
            if state > record.state {
                record.state = state;
            }
        }
    }

    /// Push a record's arguments and state into its UI part.
    fn sync_tool_call_part(&mut self, record: &ToolCallRecord) {
        let Some(message_id) = self.current_assistant_message_id.clone() else {
            return;
        };
        let mut updated = None;
        self.update_current_message(|message| {
            for part in &mut message.parts {
                if let MessagePart::ToolCall(call) = part {
                    if call.id == record.id {
                        call.arguments = record.arguments.clone();
                        call.advance(record.state);
                        if record.parsed_arguments.is_some() {
                            call.parsed_arguments = record.parsed_arguments.clone();
                        }
                        updated = Some(call.clone());
                    }
                }
            }
        });
        if let Some(call) = updated {
            self.emit_tool_call_state(&message_id, &call);
        }
    }

    fn emit_tool_call_state(&self, message_id: &str, call: &ToolCallPart) {
        self.emit(ProcessorEvent::ToolCallStateChange {
            message_id: message_id.to_string(),
            tool_call_id: call.id.clone(),
            state: call.state,
            arguments: call.arguments.clone(),
        });
    }

    // ---- message bookkeeping ----

    fn reset_stream_state(&mut self) {
        self.total_text.clear();
        self.segment_text.clear();
        self.last_emitted_text.clear();
        self.thinking.clear();
        self.tool_calls.clear();
        self.tool_call_slots.clear();
        self.tool_calls_since_text = false;
        self.segment_part = None;
        self.finish_reason = None;
        self.is_done = false;
        self.chunk_strategy.reset();
    }

    fn create_assistant_message(&mut self) -> String {
        let message = UiMessage::assistant(Vec::new());
        let id = message.id.clone();
        self.current_assistant_message_id = Some(id.clone());
        self.segment_part = None;
        self.push_message(message);
        self.emit(ProcessorEvent::StreamStart {
            message_id: id.clone(),
        });
        id
    }

    /// The current assistant message id, creating the message on first use.
    fn ensure_assistant_message(&mut self) -> String {
        match &self.current_assistant_message_id {
            Some(id) => id.clone(),
            None => self.create_assistant_message(),
        }
    }

    fn current_assistant_message(&self) -> Option<&UiMessage> {
        let id = self.current_assistant_message_id.as_ref()?;
        self.messages.iter().find(|m| &m.id == id)
    }

    fn message_index_with_tool_call(&self, matches: impl Fn(&ToolCallPart) -> bool) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|message| message.tool_call_parts().any(&matches))
    }

    fn emit_text_update(&mut self) {
        let text = self.segment_text.clone();
        self.last_emitted_text = text.clone();
        let message_id = self.ensure_assistant_message();
        let slot = self.segment_part;
        let mut placed = slot;
        self.update_current_message(|message| {
            if let Some(MessagePart::Text { content }) =
                slot.and_then(|index| message.parts.get_mut(index))
            {
                *content = text.clone();
                return;
            }
            placed = Some(message.parts.len());
            message.parts.push(MessagePart::text(text.clone()));
        });
        self.segment_part = placed;
        self.emit(ProcessorEvent::TextUpdate { message_id, text });
    }

    fn push_message(&mut self, message: UiMessage) {
        self.update_messages(|messages| messages.push(message));
    }

    fn update_current_message(&mut self, update: impl FnOnce(&mut UiMessage)) {
        let Some(id) = self.current_assistant_message_id.clone() else {
            return;
        };
        self.update_messages(|messages| {
            if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
                update(message);
            }
        });
    }

    /// Copy, mutate, and publish a new snapshot.
    fn update_messages(&mut self, update: impl FnOnce(&mut Vec<UiMessage>)) {
        let mut messages = self.messages.as_ref().clone();
        update(&mut messages);
        self.replace_messages(messages);
    }

    fn replace_messages(&mut self, messages: Vec<UiMessage>) {
        self.messages = Arc::new(messages);
        self.emit(ProcessorEvent::MessagesChanged {
            messages: Arc::clone(&self.messages),
        });
    }

    fn emit(&self, event: ProcessorEvent) {
        if let Some(sink) = &self.event_sink {
            sink(event);
        }
    }
}

impl std::fmt::Debug for StreamProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamProcessor")
            .field("messages", &self.messages.len())
            .field("current_assistant_message_id", &self.current_assistant_message_id)
            .field("tool_calls", &self.tool_calls.len())
            .field("finish_reason", &self.finish_reason)
            .field("is_done", &self.is_done)
            .finish()
    }
}

fn record_to_tool_call(record: &ToolCallRecord) -> ToolCall {
    ToolCall::new(&record.id, &record.name, &record.arguments)
}

/// Whether a text chunk after tool calls starts a fresh segment.
///
/// A chunk carrying full `content` continues the segment only if it extends
/// it or is a prefix of it. Delta-only chunks never restate earlier text.
fn starts_new_segment(delta: &str, content: Option<&str>, previous: &str) -> bool {
    match content {
        Some(content) => {
            content.len() < previous.len()
                || (!content.starts_with(previous) && !previous.starts_with(content))
        }
        None => !delta.is_empty(),
    }
}

/// Apply a chunk to accumulated text, preferring `delta` over `content`.
///
/// Repeating full content is a no-op, so the result never double-counts.
fn merge_text(current: &str, delta: &str, content: Option<&str>) -> String {
    if !delta.is_empty() {
        return format!("{current}{delta}");
    }
    match content {
        Some(content) if content.starts_with(current) => content.to_string(),
        Some(content) if current.starts_with(content) => current.to_string(),
        Some(content) => format!("{current}{content}"),
        None => current.to_string(),
    }
}
