use crate::types::{
    ContentPart, MessageContent, MessagePart, ModelMessage, Role, ToolCallPart, ToolResultPart,
    UiMessage, UiRole,
};

/// Convert one wire message into a UI message.
///
/// A `tool` message becomes a single tool-result part inside an assistant
/// message. Tool calls become `input-complete` tool-call parts after any
/// text or media. `null` content yields no text part.
pub fn model_message_to_ui_message(message: &ModelMessage) -> UiMessage {
    let role = match message.role {
        Role::System => UiRole::System,
        Role::User => UiRole::User,
        Role::Assistant | Role::Tool => UiRole::Assistant,
    };
    UiMessage::new(role, message_parts(message))
}

fn message_parts(message: &ModelMessage) -> Vec<MessagePart> {
    if message.role == Role::Tool {
        return vec![tool_result_part(message)];
    }

    let mut parts = Vec::new();
    match &message.content {
        Some(MessageContent::Text(text)) if !text.is_empty() => parts.push(MessagePart::text(text)),
        Some(MessageContent::Parts(content)) => parts.extend(content.iter().map(content_part)),
        _ => {}
    }
    parts.extend(message.tool_calls().iter().map(|call| {
        MessagePart::ToolCall(ToolCallPart::complete(
            &call.id,
            &call.function.name,
            &call.function.arguments,
        ))
    }));
    parts
}

fn tool_result_part(message: &ModelMessage) -> MessagePart {
    MessagePart::ToolResult(ToolResultPart::complete(
        message.tool_call_id.clone().unwrap_or_default(),
        message.text(),
    ))
}

fn content_part(part: &ContentPart) -> MessagePart {
    match part {
        ContentPart::Text { content } => MessagePart::text(content),
        ContentPart::Image(media) => MessagePart::Image(media.clone()),
        ContentPart::Audio(media) => MessagePart::Audio(media.clone()),
        ContentPart::Video(media) => MessagePart::Video(media.clone()),
        ContentPart::Document(media) => MessagePart::Document(media.clone()),
    }
}

/// Fold a flat wire sequence into UI messages.
///
/// A `tool` message joins the immediately preceding assistant UI message;
/// any user or system message in between breaks the link. An orphaned
/// `tool` message becomes its own assistant message.
pub fn model_messages_to_ui_messages(messages: &[ModelMessage]) -> Vec<UiMessage> {
    let mut out: Vec<UiMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        if message.role == Role::Tool {
            if let Some(previous) = out.last_mut().filter(|m| m.role == UiRole::Assistant) {
                previous.parts.push(tool_result_part(message));
                continue;
            }
        }
        out.push(model_message_to_ui_message(message));
    }
    out
}
