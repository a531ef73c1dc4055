use std::collections::{HashMap, HashSet};

use crate::types::{
    ContentPart, MessageContent, MessagePart, ModelMessage, Role, ToolCall, ToolCallPart,
    ToolResultPart, UiMessage, UiRole,
};

/// Content of the wire `tool` message for a denied approval.
pub const APPROVAL_DENIED_MESSAGE: &str = "User denied this action";

/// Parts of one segment: text and media in order, then the tool calls that close it.
#[derive(Default)]
struct Segment<'a> {
    content: Vec<&'a MessagePart>,
    tool_calls: Vec<&'a ToolCallPart>,
}

impl Segment<'_> {
    fn is_empty(&self) -> bool {
        self.content.is_empty() && self.tool_calls.is_empty()
    }
}

/// Convert one UI message into wire messages.
///
/// System messages produce nothing. User messages produce exactly one wire
/// message. Assistant messages produce one wire message per segment, each
/// followed by a `tool` message per distinct tool-call id that has a result.
/// Results with no matching call in the message become standalone `tool`
/// messages after the segments.
pub fn ui_message_to_model_messages(message: &UiMessage) -> Vec<ModelMessage> {
    match message.role {
        UiRole::System => Vec::new(),
        UiRole::User => {
            let content: Vec<&MessagePart> = message
                .parts
                .iter()
                .filter(|part| matches!(part, MessagePart::Text { .. }) || part.is_media())
                .collect();
            vec![ModelMessage {
                role: Role::User,
                content: segment_content(&content),
                tool_calls: None,
                tool_call_id: None,
            }]
        }
        UiRole::Assistant => assistant_to_model_messages(message),
    }
}

fn assistant_to_model_messages(message: &UiMessage) -> Vec<ModelMessage> {
    let results: HashMap<&str, &ToolResultPart> = message
        .tool_result_parts()
        .fold(HashMap::new(), |mut acc, result| {
            acc.entry(result.tool_call_id.as_str()).or_insert(result);
            acc
        });

    let mut out = Vec::new();
    let mut emitted = HashSet::new();
    let mut segment = Segment::default();

    for part in &message.parts {
        match part {
            MessagePart::Text { .. }
            | MessagePart::Image(_)
            | MessagePart::Audio(_)
            | MessagePart::Video(_)
            | MessagePart::Document(_) => {
                if !segment.tool_calls.is_empty() {
                    flush_segment(std::mem::take(&mut segment), &results, &mut emitted, &mut out);
                }
                segment.content.push(part);
            }
            MessagePart::ToolCall(call) => segment.tool_calls.push(call),
            MessagePart::ToolResult(_) | MessagePart::Thinking { .. } => {}
        }
    }

    if !segment.is_empty() {
        flush_segment(segment, &results, &mut emitted, &mut out);
    }

    for result in message.tool_result_parts() {
        if emitted.insert(result.tool_call_id.as_str()) {
            out.push(ModelMessage::tool(&result.tool_call_id, result_part_content(result)));
        }
    }

    if out.is_empty() {
        out.push(ModelMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: None,
            tool_call_id: None,
        });
    }
    out
}

fn flush_segment<'a>(
    segment: Segment<'a>,
    results: &HashMap<&str, &ToolResultPart>,
    emitted: &mut HashSet<&'a str>,
    out: &mut Vec<ModelMessage>,
) {
    let tool_calls: Vec<ToolCall> = segment
        .tool_calls
        .iter()
        .map(|call| ToolCall::new(&call.id, &call.name, &call.arguments))
        .collect();

    out.push(ModelMessage {
        role: Role::Assistant,
        content: segment_content(&segment.content),
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: None,
    });

    for call in segment.tool_calls {
        if !emitted.insert(call.id.as_str()) {
            continue;
        }
        if let Some(content) = tool_result_content(call, results.get(call.id.as_str()).copied()) {
            out.push(ModelMessage::tool(&call.id, content));
        }
    }
}

/// A single text part becomes a string; anything else becomes a part list.
fn segment_content(parts: &[&MessagePart]) -> Option<MessageContent> {
    match parts {
        [] => return None,
        [MessagePart::Text { content }] => return Some(MessageContent::Text(content.clone())),
        _ => {}
    }
    let content = parts
        .iter()
        .filter_map(|part| match part {
            MessagePart::Text { content } => Some(ContentPart::Text {
                content: content.clone(),
            }),
            MessagePart::Image(media) => Some(ContentPart::Image(media.clone())),
            MessagePart::Audio(media) => Some(ContentPart::Audio(media.clone())),
            MessagePart::Video(media) => Some(ContentPart::Video(media.clone())),
            MessagePart::Document(media) => Some(ContentPart::Document(media.clone())),
            _ => None,
        })
        .collect();
    Some(MessageContent::Parts(content))
}

/// Result content for one call: a sibling tool-result part wins over an
/// inline `output`, which wins over an approval decision.
fn tool_result_content(call: &ToolCallPart, result: Option<&ToolResultPart>) -> Option<String> {
    if let Some(result) = result {
        return Some(result_part_content(result));
    }
    if let Some(output) = &call.output {
        return Some(match output {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        });
    }
    match call.approval_decision() {
        Some(true) => Some(
            serde_json::json!({ "approved": true, "pendingExecution": true }).to_string(),
        ),
        Some(false) => Some(
            serde_json::json!({ "approved": false, "message": APPROVAL_DENIED_MESSAGE })
                .to_string(),
        ),
        None => None,
    }
}

fn result_part_content(result: &ToolResultPart) -> String {
    match (&result.error, result.content.is_empty()) {
        (Some(error), true) => format!("Error: {error}"),
        _ => result.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentSource, MediaContent, ToolApproval, ToolCallState};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_parts_yield_one_null_message() {
        let msg = UiMessage::assistant(vec![]);
        let wire = ui_message_to_model_messages(&msg);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].content, None);
        assert_eq!(wire[0].role, Role::Assistant);
    }

    #[test]
    fn standalone_result_becomes_tool_message() {
        let msg = UiMessage::assistant(vec![MessagePart::ToolResult(ToolResultPart::complete(
            "tc-1", "late",
        ))]);
        let wire = ui_message_to_model_messages(&msg);
        assert_eq!(wire, vec![ModelMessage::tool("tc-1", "late")]);
    }

    #[test]
    fn thinking_is_never_sent() {
        let msg = UiMessage::assistant(vec![
            MessagePart::thinking("let me think"),
            MessagePart::text("Answer"),
        ]);
        let wire = ui_message_to_model_messages(&msg);
        assert_eq!(wire, vec![ModelMessage::assistant("Answer")]);
    }

    #[test]
    fn media_keeps_original_order() {
        let image = MediaContent::new(ContentSource::url("https://example.com/a.png"));
        let msg = UiMessage::new(
            UiRole::User,
            vec![
                MessagePart::text("before"),
                MessagePart::Image(image.clone()),
                MessagePart::text("after"),
            ],
        );
        let wire = ui_message_to_model_messages(&msg);
        assert_eq!(
            wire[0].content,
            Some(MessageContent::Parts(vec![
                ContentPart::text("before"),
                ContentPart::Image(image),
                ContentPart::text("after"),
            ]))
        );
    }

    #[test]
    fn approved_call_defers_execution() {
        let mut call = ToolCallPart::complete("tc-1", "deleteFile", r#"{"path":"/tmp/x"}"#);
        call.approval = Some(ToolApproval {
            id: "ap-1".into(),
            needs_approval: true,
            approved: Some(true),
        });
        call.advance(ToolCallState::ApprovalResponded);
        let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![MessagePart::ToolCall(call)]));
        assert_eq!(wire.len(), 2);
        let content: serde_json::Value = serde_json::from_str(&wire[1].text()).unwrap();
        assert_eq!(content, serde_json::json!({"approved": true, "pendingExecution": true}));
    }

    #[test]
    fn pending_call_emits_no_tool_message() {
        let call = ToolCallPart::new("tc-1", "search", r#"{"q":"#, ToolCallState::InputStreaming);
        let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![MessagePart::ToolCall(call)]));
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].tool_calls().len(), 1);
    }

    #[test]
    fn string_output_is_used_verbatim() {
        let mut call = ToolCallPart::complete("tc-1", "clock", "{}");
        call.output = Some(serde_json::json!("12:00"));
        let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![MessagePart::ToolCall(call)]));
        assert_eq!(wire[1], ModelMessage::tool("tc-1", "12:00"));
    }

    #[test]
    fn errored_result_without_content_reports_error() {
        let call = ToolCallPart::complete("tc-1", "clock", "{}");
        let result = ToolResultPart {
            tool_call_id: "tc-1".into(),
            content: String::new(),
            state: crate::types::ToolResultState::Error,
            error: Some("clock is broken".into()),
        };
        let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![
            MessagePart::ToolCall(call),
            MessagePart::ToolResult(result),
        ]));
        assert_eq!(wire[1].text(), "Error: clock is broken");
    }
}
