use crate::types::{MessageContent, ModelMessage, Role};

/// Merge consecutive same-role wire messages.
///
/// Merged content is the concatenation of both contents as a part list, and
/// tool calls are concatenated.
///
/// `tool` messages are the one exception to strict role alternation: each
/// carries exactly one tool-call id, so a run of results for parallel calls
/// stays as adjacent `tool` messages, one per id.
pub fn normalize_role_alternation(messages: Vec<ModelMessage>) -> Vec<ModelMessage> {
    let mut out: Vec<ModelMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        match out.last_mut() {
            Some(previous) if previous.role == message.role && message.role != Role::Tool => {
                merge_into(previous, message);
            }
            _ => out.push(message),
        }
    }
    out
}

fn merge_into(previous: &mut ModelMessage, next: ModelMessage) {
    let mut parts = previous
        .content
        .take()
        .map(MessageContent::into_parts)
        .unwrap_or_default();
    parts.extend(next.content.map(MessageContent::into_parts).unwrap_or_default());
    previous.content = if parts.is_empty() {
        None
    } else {
        Some(MessageContent::Parts(parts))
    };

    if let Some(calls) = next.tool_calls {
        previous.tool_calls.get_or_insert_with(Vec::new).extend(calls);
    }
}
