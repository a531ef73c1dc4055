//! Round-trip and shape tests for UI <-> wire message conversion.

use parley::convert::*;
use parley::types::*;
use pretty_assertions::assert_eq;

fn weather_call() -> ToolCall {
    ToolCall::new("tc-1", "getWeather", r#"{"city":"Paris"}"#)
}

/// Parts of every message, with ids and timestamps stripped.
fn all_parts(messages: &[UiMessage]) -> Vec<MessagePart> {
    messages.iter().flat_map(|m| m.parts.clone()).collect()
}

#[test]
fn wire_to_ui_to_wire_multi_round() {
    let wire = vec![
        ModelMessage::user("What's the weather in Paris?"),
        ModelMessage::assistant_with_tool_calls(
            Some("Let me check.".to_string()),
            vec![weather_call()],
        ),
        ModelMessage::tool("tc-1", r#"{"temp":22,"sky":"sunny"}"#),
        ModelMessage::assistant("It's sunny and 22 degrees."),
        ModelMessage::user("Thanks!"),
        ModelMessage::assistant("You're welcome."),
    ];

    let ui = model_messages_to_ui_messages(&wire);
    assert_eq!(ui.len(), 5);
    assert_eq!(ui[1].tool_result_parts().count(), 1);

    assert_eq!(convert_messages_to_model_messages(ui), wire);
}

#[test]
fn wire_to_ui_to_wire_multimodal_user() {
    let image = MediaContent::new(ContentSource::url("https://example.com/cat.png"));
    let wire = vec![
        ModelMessage::user_parts(vec![
            ContentPart::text("What is in this picture?"),
            ContentPart::Image(image.clone()),
        ]),
        ModelMessage::assistant("A cat."),
    ];

    let ui = model_messages_to_ui_messages(&wire);
    assert_eq!(ui[0].parts[1], MessagePart::Image(image));
    assert_eq!(convert_messages_to_model_messages(ui), wire);
}

#[test]
fn null_content_yields_no_text_part() {
    let wire = ModelMessage::assistant_with_tool_calls(None, vec![weather_call()]);
    let ui = model_message_to_ui_message(&wire);
    assert_eq!(ui.parts.len(), 1);
    let call = ui.parts[0].as_tool_call().unwrap();
    assert_eq!(call.state, ToolCallState::InputComplete);
    assert_eq!(
        call.parsed_arguments,
        Some(serde_json::json!({"city": "Paris"}))
    );
}

#[test]
fn orphaned_tool_message_becomes_its_own_assistant_message() {
    let wire = vec![
        ModelMessage::assistant_with_tool_calls(None, vec![weather_call()]),
        ModelMessage::user("interrupting"),
        ModelMessage::tool("tc-1", "late"),
    ];
    let ui = model_messages_to_ui_messages(&wire);
    assert_eq!(ui.len(), 3);
    assert_eq!(ui[2].role, UiRole::Assistant);
    assert_eq!(
        ui[2].parts,
        vec![MessagePart::ToolResult(ToolResultPart::complete("tc-1", "late"))]
    );

    // The late answer survives the trip back to the wire.
    assert_eq!(convert_messages_to_model_messages(ui), wire);
}

#[test]
fn text_only_part_list_round_trips() {
    let wire = vec![
        ModelMessage::user_parts(vec![ContentPart::text("first"), ContentPart::text("second")]),
        ModelMessage::assistant("Got both."),
    ];

    let ui = model_messages_to_ui_messages(&wire);
    assert_eq!(
        ui[0].parts,
        vec![MessagePart::text("first"), MessagePart::text("second")]
    );
    assert_eq!(convert_messages_to_model_messages(ui), wire);
}

#[test]
fn normalized_output_round_trips() {
    let normalized =
        convert_messages_to_model_messages(vec![UiMessage::user("first"), UiMessage::user("second")]);
    let again = convert_messages_to_model_messages(model_messages_to_ui_messages(&normalized));
    assert_eq!(again, normalized);
}

#[test]
fn ui_to_wire_to_ui_preserves_parts_per_segment() {
    let original = UiMessage::assistant(vec![
        MessagePart::text("Let me check."),
        MessagePart::ToolCall(ToolCallPart::complete(
            "tc-1",
            "getWeather",
            r#"{"city":"Paris"}"#,
        )),
        MessagePart::ToolResult(ToolResultPart::complete("tc-1", "sunny")),
        MessagePart::text("It's sunny."),
    ]);

    let wire = ui_message_to_model_messages(&original);
    assert_eq!(
        wire,
        vec![
            ModelMessage::assistant_with_tool_calls(
                Some("Let me check.".to_string()),
                vec![weather_call()],
            ),
            ModelMessage::tool("tc-1", "sunny"),
            ModelMessage::assistant("It's sunny."),
        ]
    );

    let back = model_messages_to_ui_messages(&wire);
    assert_eq!(back.len(), 2);
    assert_eq!(all_parts(&back), original.parts);
}

#[test]
fn tool_result_is_emitted_once_per_call() {
    let mut call = ToolCallPart::complete("tc-1", "getWeather", r#"{"city":"Paris"}"#);
    call.output = Some(serde_json::json!({"temp": 22}));
    let message = UiMessage::assistant(vec![
        MessagePart::ToolCall(call.clone()),
        MessagePart::ToolResult(ToolResultPart::complete("tc-1", "from result part")),
        MessagePart::ToolResult(ToolResultPart::complete("tc-1", "duplicate")),
        MessagePart::text("Done."),
        MessagePart::ToolCall(call),
    ]);

    let wire = ui_message_to_model_messages(&message);
    let tool_messages: Vec<&ModelMessage> =
        wire.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_messages.len(), 1);
    assert_eq!(tool_messages[0].text(), "from result part");
}

#[test]
fn output_is_used_when_no_result_part_exists() {
    let mut call = ToolCallPart::complete("tc-1", "getLocation", "{}");
    call.output = Some(serde_json::json!({"lat": 48.85, "lon": 2.35}));
    let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![MessagePart::ToolCall(
        call,
    )]));
    assert_eq!(wire.len(), 2);
    let value: serde_json::Value = serde_json::from_str(&wire[1].text()).unwrap();
    assert_eq!(value, serde_json::json!({"lat": 48.85, "lon": 2.35}));
}

#[test]
fn consecutive_user_messages_are_merged() {
    let wire = convert_messages_to_model_messages(vec![
        UiMessage::user("first"),
        UiMessage::user("second"),
    ]);
    assert_eq!(
        wire,
        vec![ModelMessage::user_parts(vec![
            ContentPart::text("first"),
            ContentPart::text("second"),
        ])]
    );
}

#[test]
fn system_ui_messages_are_dropped() {
    let wire = convert_messages_to_model_messages(vec![
        UiMessage::new(UiRole::System, vec![MessagePart::text("be nice")]),
        UiMessage::user("hi"),
    ]);
    assert_eq!(wire, vec![ModelMessage::user("hi")]);
}

#[test]
fn tool_round_trip_scenario() {
    // The model asked for a tool; the result came back in the same turn.
    let mut call = ToolCallPart::complete("tc-1", "getWeather", r#"{"city":"Paris"}"#);
    call.output = Some(serde_json::json!("22C"));
    let conversation = vec![
        UiMessage::user("Weather?"),
        UiMessage::assistant(vec![
            MessagePart::ToolCall(call),
            MessagePart::ToolResult(ToolResultPart::complete("tc-1", "22C")),
            MessagePart::text("It is 22C."),
        ]),
    ];

    let wire = convert_messages_to_model_messages(conversation);
    assert_eq!(
        wire,
        vec![
            ModelMessage::user("Weather?"),
            ModelMessage::assistant_with_tool_calls(None, vec![weather_call()]),
            ModelMessage::tool("tc-1", "22C"),
            ModelMessage::assistant("It is 22C."),
        ]
    );
}

#[test]
fn approval_denial_scenario() {
    let mut call = ToolCallPart::complete("tc-9", "deleteFile", r#"{"path":"/etc/hosts"}"#);
    call.approval = Some(ToolApproval {
        id: "approval_tc-9".into(),
        needs_approval: true,
        approved: Some(false),
    });
    call.advance(ToolCallState::ApprovalResponded);

    let wire = convert_messages_to_model_messages(vec![
        UiMessage::user("Clean up"),
        UiMessage::assistant(vec![MessagePart::ToolCall(call)]),
    ]);

    assert_eq!(wire.len(), 3);
    assert_eq!(wire[2].tool_call_id.as_deref(), Some("tc-9"));
    let value: serde_json::Value = serde_json::from_str(&wire[2].text()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"approved": false, "message": APPROVAL_DENIED_MESSAGE})
    );
}

#[test]
fn unanswered_approval_sends_no_tool_message() {
    let mut call = ToolCallPart::complete("tc-9", "deleteFile", "{}");
    call.approval = Some(ToolApproval {
        id: "approval_tc-9".into(),
        needs_approval: true,
        approved: None,
    });
    call.advance(ToolCallState::ApprovalRequested);

    let wire = ui_message_to_model_messages(&UiMessage::assistant(vec![MessagePart::ToolCall(
        call,
    )]));
    assert_eq!(wire.len(), 1);
    assert!(wire.iter().all(|m| m.role != Role::Tool));
}
