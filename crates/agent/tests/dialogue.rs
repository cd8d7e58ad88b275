//! End-to-end turn handling with scripted capabilities

mod common;

use std::time::Duration;

use common::*;
use dwani_agent::{AgentError, AgentEvent, DialogueState, FAILED_TURN_APOLOGY};
use dwani_config::AgentConfig;
use dwani_core::{
    Direction, GenerateResponse, ReplyAction, Role, SceneCache, SceneSnapshot, UrgencyLevel,
};
use serde_json::json;

fn fire(urgency: &str) -> serde_json::Value {
    json!({
        "is_emergency": true,
        "urgency_level": urgency,
        "detected_hazards": ["smoke", "flames"],
        "required_action": "evacuate",
        "emergency_type": "fire",
        "speak": "Leave the building"
    })
}

#[tokio::test]
async fn test_chat_turn_without_tools() {
    let mut h = harness();
    h.llm.calm().chat_text(
        r#"{"speak": "Turn left at the next corner.", "action": "navigate", "direction": "left", "distance": "50 meters", "urgency": "low"}"#,
    );

    let reply = h.orchestrator.handle_utterance("How do I get to the Rhine?").await.unwrap();

    assert_eq!(reply.speak, "Turn left at the next corner.");
    assert_eq!(reply.action, ReplyAction::Navigate);
    assert_eq!(reply.direction, Direction::Left);
    assert_eq!(reply.distance, 50.0);
    assert_eq!(h.tts.spoken(), vec!["Turn left at the next corner."]);

    let turns = h.orchestrator.context().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].content, "How do I get to the Rhine?");
    assert_eq!(turns[2].role, Role::Assistant);
    assert_eq!(h.orchestrator.state(), DialogueState::Idle);
}

#[tokio::test]
async fn test_plain_text_reply_is_spoken_verbatim() {
    let mut h = harness();
    h.llm.calm().chat_text("The Rhine is a ten minute walk west.");

    let reply = h.orchestrator.handle_utterance("Where is the river?").await.unwrap();
    assert_eq!(reply.speak, "The Rhine is a ten minute walk west.");
    assert_eq!(reply.action, ReplyAction::None);
    assert_eq!(reply.urgency, UrgencyLevel::Low);
}

#[tokio::test]
async fn test_fire_emergency_bypasses_chat() {
    let mut h = harness();
    h.llm.assess(fire("critical"));
    let mut events = h.orchestrator.subscribe();

    let reply = h
        .orchestrator
        .handle_utterance("There's smoke and flames everywhere!")
        .await
        .unwrap();

    assert!(reply
        .speak
        .starts_with("EMERGENCY ALERT: FIRE detected! Evacuate immediately and call emergency services."));
    assert!(reply.speak.contains("Destination: Fire Station Düsseldorf Central"));
    assert!(reply.speak.contains("1. Head south on Heinrich-Heine-Allee (300 m, ~3.6 min)"));
    assert_eq!(reply.action, ReplyAction::Navigate);
    assert_eq!(reply.distance, 640.0);
    assert_eq!(reply.urgency, UrgencyLevel::Critical);
    assert_eq!(reply.safe_direction, "Fire Station Düsseldorf Central");
    assert_eq!(h.llm.chat_calls(), 0);

    let spoken = h.tts.spoken();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].starts_with("EMERGENCY ALERT:"));
    assert!(!spoken[0].starts_with("EMERGENCY ALERT: EMERGENCY ALERT:"));

    let turns = h.orchestrator.context().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].content, "There's smoke and flames everywhere!");
    assert_eq!(turns[2].content, reply.speak);
    assert_eq!(h.orchestrator.session().emergency_count, 1);

    let mut saw_emergency = false;
    let mut saw_plan = false;
    while let Ok(event) = events.try_recv() {
        match event {
            AgentEvent::EmergencyDetected { .. } => saw_emergency = true,
            AgentEvent::EvacuationPlanned { live_route, .. } => saw_plan = live_route,
            _ => {}
        }
    }
    assert!(saw_emergency && saw_plan);
}

#[tokio::test]
async fn test_medium_urgency_is_a_warning() {
    let mut h = harness();
    h.llm.assess(fire("medium"));

    let reply = h.orchestrator.handle_utterance("I can smell smoke").await.unwrap();
    assert!(reply
        .speak
        .starts_with("Warning: fire detected. Please proceed with caution."));
    assert_eq!(reply.action, ReplyAction::Warn);
    assert_eq!(h.tts.spoken()[0], reply.speak);
}

#[tokio::test]
async fn test_unknown_location_uses_static_guidance() {
    let mut h = harness_with(AgentConfig::default(), MapGeocoder::knowing(&[FIRE_STATION]));
    h.llm.assess(fire("high"));

    let reply = h.orchestrator.handle_utterance("Fire in the stairwell!").await.unwrap();

    for mode in ["Public Transport", "Walking", "Taxi/Uber"] {
        assert!(reply.speak.contains(mode), "missing {mode}");
    }
    assert!(reply.speak.contains("Head to Fire Station Düsseldorf Central."));
    assert_eq!(reply.distance, 0.0);
    assert_eq!(h.llm.chat_calls(), 0);
}

#[tokio::test]
async fn test_tool_round_then_final_reply() {
    let mut h = harness();
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![tool_call("call_1", "get_current_time", json!({"timezone": "Europe/Berlin"}))],
        ))
        .chat_text(r#"{"speak": "It is just after ten in Berlin."}"#);

    let reply = h.orchestrator.handle_utterance("What time is it?").await.unwrap();
    assert_eq!(reply.speak, "It is just after ten in Berlin.");
    assert_eq!(h.llm.chat_calls(), 2);

    let turns = h.orchestrator.context().turns();
    let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert_eq!(turns[2].tool_calls[0].id, "call_1");
    assert_eq!(turns[3].tool_call_id.as_deref(), Some("call_1"));
    assert!(turns[3].content.contains("current_time"));
    assert!(!h.orchestrator.context().has_outstanding_calls());

    let second = h.llm.chat_requests.lock()[1].clone();
    assert!(second
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some("call_1")));
}

#[tokio::test]
async fn test_unknown_tool_becomes_error_payload() {
    let mut h = harness();
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![tool_call("call_9", "teleport", json!({"to": "Mars"}))],
        ))
        .chat_text("I can't do that, but I can give you directions.");

    let reply = h.orchestrator.handle_utterance("Teleport me out").await.unwrap();
    assert_eq!(reply.speak, "I can't do that, but I can give you directions.");

    let tool_turn = &h.orchestrator.context().turns()[3];
    assert_eq!(tool_turn.role, Role::Tool);
    let payload: serde_json::Value = serde_json::from_str(&tool_turn.content).unwrap();
    assert_eq!(payload, json!({"error": "Unknown tool: teleport"}));
}

#[tokio::test]
async fn test_only_one_extra_round() {
    let mut h = harness();
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![tool_call("call_1", "get_current_time", json!({}))],
        ))
        .chat(GenerateResponse::with_tool_calls(
            "Checking again",
            vec![tool_call("call_2", "get_current_time", json!({}))],
        ))
        .chat_text("never requested");

    let reply = h.orchestrator.handle_utterance("Time please").await.unwrap();
    assert_eq!(reply.speak, "Checking again");
    assert_eq!(h.llm.chat_calls(), 2);
    assert!(!h.orchestrator.context().has_outstanding_calls());
}

#[tokio::test]
async fn test_chat_failure_restores_context() {
    let mut h = harness();
    h.llm.calm().chat_text("First answer.");
    h.orchestrator.handle_utterance("Hello").await.unwrap();
    let before = h.orchestrator.context().turns().to_vec();

    h.llm.calm().chat_failure();
    let reply = h.orchestrator.handle_utterance("Are you there?").await.unwrap();

    assert_eq!(reply.speak, FAILED_TURN_APOLOGY);
    assert_eq!(h.orchestrator.context().turns(), before.as_slice());
    assert_eq!(h.tts.spoken().last().unwrap(), FAILED_TURN_APOLOGY);
    assert_eq!(h.orchestrator.state(), DialogueState::Idle);
}

#[tokio::test]
async fn test_failed_tool_round_restores_context() {
    let mut h = harness();
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![tool_call("call_1", "get_current_time", json!({}))],
        ))
        .chat_failure();

    let reply = h.orchestrator.handle_utterance("What time is it?").await.unwrap();
    assert_eq!(reply.speak, FAILED_TURN_APOLOGY);
    assert_eq!(h.orchestrator.context().len(), 1);
    assert!(!h.orchestrator.context().has_outstanding_calls());
}

#[tokio::test]
async fn test_cancelled_turn_leaves_context_unchanged() {
    let mut h = harness();
    h.llm.calm().chat_text("Hello, I'm here.");
    h.orchestrator.handle_utterance("Hello").await.unwrap();
    let before = h.orchestrator.context().turns().to_vec();

    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![tool_call("call_1", "get_current_time", json!({"timezone": "Europe/Berlin"}))],
        ))
        .stall_after_script();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(300),
        h.orchestrator.handle_utterance("What time is it?"),
    )
    .await;
    assert!(cancelled.is_err());

    assert_eq!(h.orchestrator.context().turns(), before.as_slice());
    assert!(!h.orchestrator.context().has_outstanding_calls());
    assert_eq!(h.orchestrator.state(), DialogueState::Idle);

    h.llm.calm().chat_text("Still here.");
    let reply = h.orchestrator.handle_utterance("Are you there?").await.unwrap();
    assert_eq!(reply.speak, "Still here.");

    let next = h.llm.chat_requests.lock().last().cloned().unwrap();
    let roles: Vec<Role> = next.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User]
    );
    assert!(next.messages.iter().all(|m| m.tool_calls.is_empty()));
}

#[tokio::test]
async fn test_every_tool_call_gets_one_result() {
    let mut h = harness();
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![
                tool_call("call_a", "get_current_time", json!({"timezone": "Asia/Kolkata"})),
                tool_call("call_b", "teleport", json!({})),
            ],
        ))
        .chat_text("It is evening in Kolkata.");

    let reply = h.orchestrator.handle_utterance("What time is it in Kolkata?").await.unwrap();
    assert_eq!(reply.speak, "It is evening in Kolkata.");
    assert_eq!(h.llm.chat_calls(), 2);

    let turns = h.orchestrator.context().turns();
    let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Tool,
            Role::Assistant
        ]
    );
    let requested: Vec<&str> = turns[2].tool_calls.iter().map(|c| c.id.as_str()).collect();
    let answered: Vec<&str> = turns[3..5]
        .iter()
        .filter_map(|t| t.tool_call_id.as_deref())
        .collect();
    assert_eq!(requested, answered);
    assert!(turns[3].content.contains("Asia/Kolkata"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&turns[4].content).unwrap(),
        json!({"error": "Unknown tool: teleport"})
    );

    let second = h.llm.chat_requests.lock()[1].clone();
    let results: Vec<&str> = second
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(results, vec!["call_a", "call_b"]);
}

#[tokio::test]
async fn test_small_window_keeps_question_through_tool_round() {
    let config = AgentConfig {
        max_context_turns: 2,
        ..AgentConfig::default()
    };
    let mut h = harness_with(config, MapGeocoder::knowing(&[HERE]));
    h.llm
        .calm()
        .chat(GenerateResponse::with_tool_calls(
            "",
            vec![
                tool_call("call_1", "get_current_time", json!({})),
                tool_call("call_2", "get_current_time", json!({"timezone": "Europe/Berlin"})),
            ],
        ))
        .chat_text("It is ten o'clock.");

    h.orchestrator.handle_utterance("What time is it?").await.unwrap();

    let second = h.llm.chat_requests.lock()[1].clone();
    assert!(second
        .messages
        .iter()
        .any(|m| m.role == Role::User && m.content.ends_with("What time is it?")));
    assert!(second
        .messages
        .iter()
        .any(|m| m.role == Role::Assistant && m.tool_calls.len() == 2));

    // Trimmed once the exchange is committed
    assert_eq!(h.orchestrator.context().len(), 3);
    assert_eq!(h.orchestrator.context().turns()[2].content, "It is ten o'clock.");
}

#[tokio::test]
async fn test_blank_utterance_is_rejected() {
    let mut h = harness();
    let err = h.orchestrator.handle_utterance("   ").await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyUtterance));
    assert_eq!(h.orchestrator.context().len(), 1);
    assert!(h.tts.spoken().is_empty());
    assert!(h.llm.classifier_requests.lock().is_empty());
}

#[tokio::test]
async fn test_context_stays_bounded() {
    let config = AgentConfig {
        max_context_turns: 4,
        ..AgentConfig::default()
    };
    let mut h = harness_with(config, MapGeocoder::knowing(&[HERE]));

    for i in 0..6 {
        h.llm.calm().chat_text(&format!("answer {}", i));
        h.orchestrator.handle_utterance(&format!("question {}", i)).await.unwrap();
    }

    let turns = h.orchestrator.context().turns();
    assert_eq!(turns.len(), 5);
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[4].content, "answer 5");
    assert_eq!(h.orchestrator.summary().total_exchanges, 2);
}

#[tokio::test]
async fn test_situation_preamble_is_not_stored() {
    let cache = SceneCache::new();
    cache.publish(SceneSnapshot::now("A crowded tram stop, no smoke visible"));
    let mut h = harness_with_scene(cache);
    h.llm.calm().chat_text("All clear around you.");

    h.orchestrator.handle_utterance("What's around me?").await.unwrap();

    let chat = h.llm.chat_requests.lock()[0].clone();
    let user = chat.messages.iter().rev().find(|m| m.role == Role::User).unwrap();
    assert!(user.content.starts_with("Live Situation:"));
    assert!(user.content.contains("Camera View: A crowded tram stop"));
    assert!(user.content.ends_with("User: What's around me?"));

    let classification = h.llm.classifier_requests.lock()[0].clone();
    assert!(classification.messages[0]
        .content
        .contains("Camera view=A crowded tram stop"));

    assert_eq!(h.orchestrator.context().turns()[1].content, "What's around me?");
}

#[tokio::test]
async fn test_set_location_changes_route_origin() {
    let mut h = harness_with(
        AgentConfig::default(),
        MapGeocoder::knowing(&["Burgplatz 1", FIRE_STATION]),
    );
    h.orchestrator.set_location("Burgplatz 1");
    h.llm.assess(fire("critical"));

    let reply = h.orchestrator.handle_utterance("Fire!").await.unwrap();
    assert!(reply.speak.contains("Total Distance: 640 meters"));
    assert_eq!(h.orchestrator.session().current_location, "Burgplatz 1");
}
