//! Conversion between UI messages and wire messages.
//!
//! The two directions are not symmetric: one UI message may expand into
//! several wire messages (one assistant message per segment, followed by its
//! tool results), while several wire messages fold back into one UI message
//! (tool results join the assistant turn that requested them).
//!
//! Contracts:
//! - Wire → UI → Wire is value-equal for normalized sequences.
//! - UI → Wire → UI preserves parts per segment.
//! - At most one wire `tool` message is emitted per tool-call id.

mod model_to_ui;
mod normalize;
mod ui_to_model;

pub use model_to_ui::{model_message_to_ui_message, model_messages_to_ui_messages};
pub use normalize::normalize_role_alternation;
pub use ui_to_model::{ui_message_to_model_messages, APPROVAL_DENIED_MESSAGE};

use crate::types::{ModelMessage, UiMessage};

/// Either shape of message, as accepted by [`convert_messages_to_model_messages`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    Ui(UiMessage),
    Model(ModelMessage),
}

impl From<UiMessage> for ChatMessage {
    fn from(message: UiMessage) -> Self {
        Self::Ui(message)
    }
}

impl From<ModelMessage> for ChatMessage {
    fn from(message: ModelMessage) -> Self {
        Self::Model(message)
    }
}

/// Flatten a mixed list of UI and wire messages into a normalized wire sequence.
///
/// Wire messages pass through unchanged; UI messages expand per segment.
/// Consecutive same-role turns are then merged (see [`normalize_role_alternation`]).
pub fn convert_messages_to_model_messages<I, M>(messages: I) -> Vec<ModelMessage>
where
    I: IntoIterator<Item = M>,
    M: Into<ChatMessage>,
{
    let flat = messages
        .into_iter()
        .flat_map(|message| match message.into() {
            ChatMessage::Ui(ui) => ui_message_to_model_messages(&ui),
            ChatMessage::Model(model) => vec![model],
        })
        .collect();
    normalize_role_alternation(flat)
}
