//! UI messages: renderable, part-based turns that support streaming states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::message::MediaContent;

/// Role of a UI message. Tool results live inside assistant messages.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UiRole {
    System,
    User,
    Assistant,
}

/// Lifecycle of a tool-call part.
///
/// Declaration order is the only legal direction of travel: a part's state
/// only ever moves to a later variant.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ToolCallState {
    AwaitingInput,
    InputStreaming,
    InputComplete,
    ApprovalRequested,
    ApprovalResponded,
}

/// Lifecycle of a tool-result part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ToolResultState {
    Streaming,
    Complete,
    Error,
}

/// Approval metadata for tools that need user confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolApproval {
    pub id: String,
    pub needs_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

/// A tool call as rendered in the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    pub id: String,
    pub name: String,
    /// Raw JSON string; may be partial while streaming.
    pub arguments: String,
    pub state: ToolCallState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_arguments: Option<serde_json::Value>,
    /// Result of a client-side execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ToolApproval>,
}

impl ToolCallPart {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
        state: ToolCallState,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
            state,
            parsed_arguments: None,
            output: None,
            approval: None,
        }
    }

    /// A finished call whose arguments are parsed strictly.
    pub fn complete(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        let arguments = arguments.into();
        let parsed_arguments = serde_json::from_str(&arguments).ok();
        Self {
            parsed_arguments,
            ..Self::new(id, name, arguments, ToolCallState::InputComplete)
        }
    }

    /// Move to `next` unless that would regress the state.
    pub fn advance(&mut self, next: ToolCallState) {
        if next > self.state {
            self.state = next;
        }
    }

    /// Whether the user answered this call's approval request.
    pub fn approval_decision(&self) -> Option<bool> {
        if self.state != ToolCallState::ApprovalResponded {
            return None;
        }
        self.approval.as_ref().and_then(|approval| approval.approved)
    }
}

/// A tool result as rendered in the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPart {
    pub tool_call_id: String,
    pub content: String,
    pub state: ToolResultState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResultPart {
    pub fn complete(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            state: ToolResultState::Complete,
            error: None,
        }
    }
}

/// One typed part of a UI message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text { content: String },
    /// Reasoning trace; never sent back to the model.
    Thinking { content: String },
    ToolCall(ToolCallPart),
    ToolResult(ToolResultPart),
    Image(MediaContent),
    Audio(MediaContent),
    Video(MediaContent),
    Document(MediaContent),
}

impl MessagePart {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::Thinking {
            content: content.into(),
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCallPart> {
        match self {
            Self::ToolCall(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResultPart> {
        match self {
            Self::ToolResult(part) => Some(part),
            _ => None,
        }
    }

    /// Whether this is an image/audio/video/document part.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Image(_) | Self::Audio(_) | Self::Video(_) | Self::Document(_)
        )
    }
}

/// A renderable conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    pub role: UiRole,
    pub parts: Vec<MessagePart>,
    pub created_at: DateTime<Utc>,
}

/// Generate a fresh message id.
pub fn generate_message_id() -> String {
    format!("msg-{}", Uuid::new_v4())
}

impl UiMessage {
    pub fn new(role: UiRole, parts: Vec<MessagePart>) -> Self {
        Self {
            id: generate_message_id(),
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    /// Create a user message with one text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(UiRole::User, vec![MessagePart::text(text)])
    }

    /// Create an assistant message from parts.
    pub fn assistant(parts: Vec<MessagePart>) -> Self {
        Self::new(UiRole::Assistant, parts)
    }

    /// Concatenated content of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_call_parts(&self) -> impl Iterator<Item = &ToolCallPart> {
        self.parts.iter().filter_map(MessagePart::as_tool_call)
    }

    pub fn tool_result_parts(&self) -> impl Iterator<Item = &ToolResultPart> {
        self.parts.iter().filter_map(MessagePart::as_tool_result)
    }

    pub fn find_tool_call(&self, tool_call_id: &str) -> Option<&ToolCallPart> {
        self.tool_call_parts().find(|part| part.id == tool_call_id)
    }
}
