//! Protocol events: one increment of model output per stream item.

use serde::{Deserialize, Serialize};

use super::message::Role;
use super::usage::Usage;

/// `CUSTOM` event name: a client-side tool has complete input and must be executed by the client.
pub const CUSTOM_TOOL_INPUT_AVAILABLE: &str = "tool-input-available";
/// `CUSTOM` event name: a tool call is waiting for user approval.
pub const CUSTOM_APPROVAL_REQUESTED: &str = "approval-requested";

/// Fields shared by every protocol event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Error payload carried by `RUN_ERROR`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A protocol event, discriminated by `type` on the wire.
///
/// `delta` is always a string (possibly empty). `content`, when present, is
/// the full accumulated value so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamChunk {
    #[serde(rename_all = "camelCase")]
    RunStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    TextMessageStart {
        #[serde(default)]
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    TextMessageContent {
        #[serde(default)]
        message_id: String,
        #[serde(default)]
        delta: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    TextMessageEnd {
        #[serde(default)]
        message_id: String,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    ToolCallStart {
        tool_call_id: String,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    ToolCallArgs {
        tool_call_id: String,
        #[serde(default)]
        delta: String,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    ToolCallEnd {
        tool_call_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    StepStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_type: Option<String>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    StepFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        #[serde(default)]
        delta: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    RunFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    #[serde(rename_all = "camelCase")]
    RunError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        error: RunErrorInfo,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    StateSnapshot {
        #[serde(default)]
        snapshot: serde_json::Value,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    StateDelta {
        #[serde(default)]
        delta: serde_json::Value,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
    Custom {
        name: String,
        #[serde(default)]
        data: serde_json::Value,
        #[serde(flatten)]
        meta: ChunkMeta,
    },
}

impl StreamChunk {
    pub fn run_started() -> Self {
        Self::RunStarted {
            run_id: None,
            meta: ChunkMeta::default(),
        }
    }

    /// Incremental text.
    pub fn text_delta(delta: impl Into<String>) -> Self {
        Self::TextMessageContent {
            message_id: String::new(),
            delta: delta.into(),
            content: None,
            meta: ChunkMeta::default(),
        }
    }

    /// Full accumulated text, without a delta.
    pub fn text_content(content: impl Into<String>) -> Self {
        Self::TextMessageContent {
            message_id: String::new(),
            delta: String::new(),
            content: Some(content.into()),
            meta: ChunkMeta::default(),
        }
    }

    /// Incremental text plus the accumulated value so far.
    pub fn text(delta: impl Into<String>, content: impl Into<String>) -> Self {
        Self::TextMessageContent {
            message_id: String::new(),
            delta: delta.into(),
            content: Some(content.into()),
            meta: ChunkMeta::default(),
        }
    }

    pub fn tool_call_start(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::ToolCallStart {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            index: None,
            meta: ChunkMeta::default(),
        }
    }

    pub fn tool_call_args(tool_call_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::ToolCallArgs {
            tool_call_id: tool_call_id.into(),
            delta: delta.into(),
            meta: ChunkMeta::default(),
        }
    }

    pub fn tool_call_end(tool_call_id: impl Into<String>) -> Self {
        Self::ToolCallEnd {
            tool_call_id: tool_call_id.into(),
            tool_name: None,
            input: None,
            result: None,
            meta: ChunkMeta::default(),
        }
    }

    /// `TOOL_CALL_END` carrying the tool's answer inline.
    pub fn tool_call_result(tool_call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::ToolCallEnd {
            tool_call_id: tool_call_id.into(),
            tool_name: None,
            input: None,
            result: Some(result.into()),
            meta: ChunkMeta::default(),
        }
    }

    pub fn thinking_delta(delta: impl Into<String>) -> Self {
        Self::StepFinished {
            step_id: None,
            delta: delta.into(),
            content: None,
            meta: ChunkMeta::default(),
        }
    }

    pub fn thinking_content(content: impl Into<String>) -> Self {
        Self::StepFinished {
            step_id: None,
            delta: String::new(),
            content: Some(content.into()),
            meta: ChunkMeta::default(),
        }
    }

    pub fn run_finished(finish_reason: impl Into<String>) -> Self {
        Self::RunFinished {
            run_id: None,
            finish_reason: Some(finish_reason.into()),
            usage: None,
            meta: ChunkMeta::default(),
        }
    }

    pub fn run_finished_with_usage(finish_reason: impl Into<String>, usage: Usage) -> Self {
        Self::RunFinished {
            run_id: None,
            finish_reason: Some(finish_reason.into()),
            usage: Some(usage),
            meta: ChunkMeta::default(),
        }
    }

    pub fn run_error(message: impl Into<String>) -> Self {
        Self::RunError {
            run_id: None,
            error: RunErrorInfo {
                message: message.into(),
                code: None,
            },
            meta: ChunkMeta::default(),
        }
    }

    pub fn custom(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            data,
            meta: ChunkMeta::default(),
        }
    }

    /// Shared metadata of this event.
    pub fn meta(&self) -> &ChunkMeta {
        match self {
            Self::RunStarted { meta, .. }
            | Self::TextMessageStart { meta, .. }
            | Self::TextMessageContent { meta, .. }
            | Self::TextMessageEnd { meta, .. }
            | Self::ToolCallStart { meta, .. }
            | Self::ToolCallArgs { meta, .. }
            | Self::ToolCallEnd { meta, .. }
            | Self::StepStarted { meta, .. }
            | Self::StepFinished { meta, .. }
            | Self::RunFinished { meta, .. }
            | Self::RunError { meta, .. }
            | Self::StateSnapshot { meta, .. }
            | Self::StateDelta { meta, .. }
            | Self::Custom { meta, .. } => meta,
        }
    }

    fn meta_mut(&mut self) -> &mut ChunkMeta {
        match self {
            Self::RunStarted { meta, .. }
            | Self::TextMessageStart { meta, .. }
            | Self::TextMessageContent { meta, .. }
            | Self::TextMessageEnd { meta, .. }
            | Self::ToolCallStart { meta, .. }
            | Self::ToolCallArgs { meta, .. }
            | Self::ToolCallEnd { meta, .. }
            | Self::StepStarted { meta, .. }
            | Self::StepFinished { meta, .. }
            | Self::RunFinished { meta, .. }
            | Self::RunError { meta, .. }
            | Self::StateSnapshot { meta, .. }
            | Self::StateDelta { meta, .. }
            | Self::Custom { meta, .. } => meta,
        }
    }

    /// Stamp the producing model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.meta_mut().model = Some(model.into());
        self
    }

    /// Stamp an explicit timestamp (ms since epoch).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.meta_mut().timestamp = Some(timestamp);
        self
    }

    /// Wire name of this event (`TEXT_MESSAGE_CONTENT`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "RUN_STARTED",
            Self::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Self::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Self::ToolCallStart { .. } => "TOOL_CALL_START",
            Self::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            Self::ToolCallEnd { .. } => "TOOL_CALL_END",
            Self::StepStarted { .. } => "STEP_STARTED",
            Self::StepFinished { .. } => "STEP_FINISHED",
            Self::RunFinished { .. } => "RUN_FINISHED",
            Self::RunError { .. } => "RUN_ERROR",
            Self::StateSnapshot { .. } => "STATE_SNAPSHOT",
            Self::StateDelta { .. } => "STATE_DELTA",
            Self::Custom { .. } => "CUSTOM",
        }
    }
}

/// Payload of a `tool-input-available` custom event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInputAvailable {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Approval handle inside an `approval-requested` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalHandle {
    pub id: String,
}

/// Payload of an `approval-requested` custom event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequested {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub input: serde_json::Value,
    pub approval: ApprovalHandle,
}
