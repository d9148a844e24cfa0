// Integration tests for the conversation session engine
//
// These tests drive the engine the way a presentation layer would: discrete
// operations, event-sink assertions, and provider stubs with controllable
// completion timing for the turn-taking and cancellation paths.

use anyhow::{anyhow, Result};
use avatar_session::{
    shared, AvatarConfig, CannedResponder, ConversationEngine, EngineSettings, InputMode, Message,
    ResponseProvider, Role, SessionEvent, SharedConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{sleep, Instant};

/// Provider that blocks until the test releases a permit on the gate
struct GatedProvider {
    gate: Arc<Semaphore>,
    reply: String,
}

#[async_trait::async_trait]
impl ResponseProvider for GatedProvider {
    async fn generate_reply(&self, _context: &[Message]) -> Result<String> {
        self.gate
            .acquire()
            .await
            .map_err(|_| anyhow!("gate closed"))?
            .forget();
        Ok(self.reply.clone())
    }
}

/// Provider that always fails
struct FailingProvider;

#[async_trait::async_trait]
impl ResponseProvider for FailingProvider {
    async fn generate_reply(&self, _context: &[Message]) -> Result<String> {
        Err(anyhow!("backend unavailable"))
    }
}

fn test_settings() -> EngineSettings {
    EngineSettings {
        reply_timeout: Duration::from_secs(5),
        speaking_hold: Duration::from_millis(50),
    }
}

fn session_config() -> AvatarConfig {
    AvatarConfig {
        credential: "test-key".to_string(),
        ..AvatarConfig::default()
    }
}

fn start_engine(
    config: SharedConfig,
    provider: Arc<dyn ResponseProvider>,
) -> (ConversationEngine, mpsc::UnboundedReceiver<SessionEvent>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = ConversationEngine::new(config, provider, test_settings(), event_tx);
    (engine, event_rx)
}

fn fast_responder() -> Arc<dyn ResponseProvider> {
    Arc::new(CannedResponder::with_delay(Duration::from_millis(10)))
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_for_message_count(engine: &ConversationEngine, count: usize, limit: Duration) {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if engine.messages().await.len() == count {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "Timed out waiting for {} message(s); have {}",
        count,
        engine.messages().await.len()
    );
}

async fn wait_for_responding(engine: &ConversationEngine, responding: bool, limit: Duration) {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if engine.is_avatar_responding() == responding {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("Timed out waiting for is_avatar_responding == {}", responding);
}

#[tokio::test]
async fn test_text_round_trip_appends_user_then_avatar() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("Hello there").await;

    // The user message lands immediately.
    let messages = engine.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Hello there");
    assert!(!messages[0].voice_origin);

    // Responding is asserted strictly between the two appends.
    wait_for_responding(&engine, true, Duration::from_secs(1)).await;
    assert_eq!(engine.messages().await.len(), 1);

    wait_for_message_count(&engine, 2, Duration::from_secs(1)).await;
    let messages = engine.messages().await;
    assert_eq!(messages[1].role, Role::Avatar);

    // ...and cleared again after the speaking hold.
    wait_for_responding(&engine, false, Duration::from_secs(1)).await;

    assert!(drain(&mut events)
        .iter()
        .all(|e| !matches!(e, SessionEvent::AvatarTurnFailed { .. })));

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_blank_text_never_appends() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("").await;
    engine.submit_text("   ").await;

    sleep(Duration::from_millis(50)).await;
    assert!(engine.messages().await.is_empty());

    let empty_inputs = drain(&mut events)
        .iter()
        .filter(|e| matches!(e, SessionEvent::EmptyInput))
        .count();
    assert_eq!(empty_inputs, 2);

    Ok(())
}

#[tokio::test]
async fn test_voice_round_trip() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    // Start: no message yet, just the started event.
    engine.toggle_recording(None).await;
    assert!(engine.is_recording());
    assert!(engine.messages().await.is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::RecordingStarted)));

    // Stop: exactly one voice-origin user message, then one avatar reply.
    engine
        .toggle_recording(Some("I'd like to know more about your services."))
        .await;
    assert!(!engine.is_recording());

    let messages = engine.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].voice_origin);

    wait_for_message_count(&engine, 2, Duration::from_secs(1)).await;
    assert_eq!(engine.messages().await[1].role, Role::Avatar);

    wait_for_responding(&engine, false, Duration::from_secs(1)).await;
    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_stop_recording_with_empty_transcript() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.toggle_recording(None).await;
    engine.toggle_recording(Some("   ")).await;

    // Recording stopped, nothing captured, nothing appended.
    assert!(!engine.is_recording());
    assert!(engine.messages().await.is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::EmptyInput)));

    Ok(())
}

#[tokio::test]
async fn test_speech_output_disabled_suppresses_all_replies() -> Result<()> {
    let config = AvatarConfig {
        speech_output_enabled: false,
        ..session_config()
    };
    let (engine, _events) = start_engine(shared(config), fast_responder());

    engine.toggle_recording(None).await;
    engine.toggle_recording(Some("First voice message")).await;

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("First text message").await;
    engine.submit_text("Second text message").await;

    sleep(Duration::from_millis(100)).await;

    let messages = engine.messages().await;
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.role == Role::User));
    assert!(!engine.is_avatar_responding());

    Ok(())
}

#[tokio::test]
async fn test_config_change_applies_on_next_operation() -> Result<()> {
    let config = shared(session_config());
    let (engine, _events) = start_engine(Arc::clone(&config), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("Reply to this one").await;
    wait_for_message_count(&engine, 2, Duration::from_secs(1)).await;

    // Flip the output flag mid-session; the engine must see it.
    config.write().await.speech_output_enabled = false;
    engine.submit_text("But not this one").await;

    sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.messages().await.len(), 3);

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_voice_mode_rejected_when_speech_input_disabled() -> Result<()> {
    let config = AvatarConfig {
        speech_input_enabled: false,
        ..session_config()
    };
    let (engine, mut events) = start_engine(shared(config), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    drain(&mut events);

    engine.set_input_mode(InputMode::Voice).await;
    assert_eq!(engine.input_mode().await, InputMode::Text);
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::ModeUnavailable)));

    Ok(())
}

#[tokio::test]
async fn test_mode_locked_while_recording() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.toggle_recording(None).await;
    drain(&mut events);

    engine.set_input_mode(InputMode::Text).await;
    assert_eq!(engine.input_mode().await, InputMode::Voice);
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::ModeUnavailable)));

    Ok(())
}

#[tokio::test]
async fn test_recording_unavailable_outside_voice_mode() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    drain(&mut events);

    engine.toggle_recording(None).await;
    assert!(!engine.is_recording());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::RecordingUnavailable)));

    // Same signal when speech input is disabled under voice mode.
    let config = AvatarConfig {
        speech_input_enabled: false,
        ..session_config()
    };
    let (engine, mut events) = start_engine(shared(config), fast_responder());
    engine.toggle_recording(None).await;
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::RecordingUnavailable)));

    Ok(())
}

#[tokio::test]
async fn test_submit_text_rejected_in_voice_mode() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), fast_responder());

    engine.submit_text("Typed while in voice mode").await;

    assert!(engine.messages().await.is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::ModeUnavailable)));

    Ok(())
}

#[tokio::test]
async fn test_provider_failure_keeps_user_message() -> Result<()> {
    let (engine, mut events) = start_engine(shared(session_config()), Arc::new(FailingProvider));

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("This one gets no reply").await;

    // Exactly +1, never +2, and the turn resolves cleanly.
    let deadline = Instant::now() + Duration::from_secs(1);
    let mut failed = false;
    while Instant::now() < deadline && !failed {
        failed = drain(&mut events)
            .iter()
            .any(|e| matches!(e, SessionEvent::AvatarTurnFailed { .. }));
        sleep(Duration::from_millis(5)).await;
    }
    assert!(failed, "Expected an AvatarTurnFailed event");

    assert_eq!(engine.messages().await.len(), 1);
    assert!(!engine.is_avatar_responding());

    Ok(())
}

#[tokio::test]
async fn test_clear_history_discards_inflight_reply() -> Result<()> {
    let gate = Arc::new(Semaphore::new(0));
    let provider = Arc::new(GatedProvider {
        gate: Arc::clone(&gate),
        reply: "Too late".to_string(),
    });
    let (engine, mut events) = start_engine(shared(session_config()), provider);

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("Question").await;
    wait_for_responding(&engine, true, Duration::from_secs(1)).await;

    engine.clear_history().await;
    assert!(engine.messages().await.is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::HistoryCleared)));

    // Let the provider complete; its reply must not reach the cleared log.
    gate.add_permits(1);
    sleep(Duration::from_millis(100)).await;
    assert!(engine.messages().await.is_empty());
    assert!(!engine.is_avatar_responding());

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_clear_during_speaking_hold_releases_indicator() -> Result<()> {
    // A long hold so the clear lands while the indicator is still up.
    let settings = EngineSettings {
        reply_timeout: Duration::from_secs(5),
        speaking_hold: Duration::from_millis(300),
    };
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let engine = ConversationEngine::new(
        shared(session_config()),
        fast_responder(),
        settings,
        event_tx,
    );

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("Question").await;
    wait_for_message_count(&engine, 2, Duration::from_secs(1)).await;
    assert!(engine.is_avatar_responding());

    engine.clear_history().await;
    assert!(engine.messages().await.is_empty());

    // The hold window must still expire and drop the speaking indicator.
    wait_for_responding(&engine, false, Duration::from_secs(1)).await;

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_stop_recording_after_input_disabled_mid_recording() -> Result<()> {
    let config = shared(session_config());
    let (engine, mut events) = start_engine(Arc::clone(&config), fast_responder());

    engine.toggle_recording(None).await;
    assert!(engine.is_recording());

    // Pulling the input flag mid-recording must not wedge the recorder on.
    config.write().await.speech_input_enabled = false;
    engine.toggle_recording(Some("Captured before the flag flipped")).await;

    assert!(!engine.is_recording());
    let messages = engine.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].voice_origin);
    assert!(drain(&mut events)
        .iter()
        .all(|e| !matches!(e, SessionEvent::RecordingUnavailable)));

    // Starting again, however, is rejected.
    engine.toggle_recording(None).await;
    assert!(!engine.is_recording());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::RecordingUnavailable)));

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_second_turn_queues_behind_inflight_turn() -> Result<()> {
    let gate = Arc::new(Semaphore::new(0));
    let provider = Arc::new(GatedProvider {
        gate: Arc::clone(&gate),
        reply: "Canned answer".to_string(),
    });
    let (engine, _events) = start_engine(shared(session_config()), provider);

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("First question").await;
    wait_for_responding(&engine, true, Duration::from_secs(1)).await;

    // Input stays usable during a reply; the message appends immediately
    // while the second turn waits its turn.
    engine.submit_text("Second question").await;
    assert_eq!(engine.messages().await.len(), 2);

    gate.add_permits(1);
    wait_for_message_count(&engine, 3, Duration::from_secs(1)).await;

    gate.add_permits(1);
    wait_for_message_count(&engine, 4, Duration::from_secs(1)).await;

    let roles: Vec<Role> = engine.messages().await.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::User, Role::Avatar, Role::Avatar]
    );

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_end_session_saves_then_resets() -> Result<()> {
    let config = AvatarConfig {
        speech_output_enabled: false,
        ..session_config()
    };
    let (engine, mut events) = start_engine(shared(config), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("Keep this for the save").await;
    drain(&mut events);

    engine.end_session().await;

    let after = drain(&mut events);
    let save_pos = after
        .iter()
        .position(|e| matches!(e, SessionEvent::SaveRequested { .. }))
        .expect("SaveRequested should be emitted");
    let end_pos = after
        .iter()
        .position(|e| matches!(e, SessionEvent::SessionEnded))
        .expect("SessionEnded should be emitted");
    assert!(save_pos < end_pos, "Auto-save must precede session end");

    if let SessionEvent::SaveRequested { messages } = &after[save_pos] {
        assert_eq!(messages.len(), 1);
    }

    // Back to initial values with a fresh clock.
    let status = engine.status().await;
    assert_eq!(status.message_count, 0);
    assert_eq!(status.elapsed_seconds, 0);
    assert_eq!(status.input_mode, InputMode::Voice);
    assert!(!status.is_recording);
    assert!(!status.is_avatar_responding);
    assert!(engine.elapsed_now().await < 2);

    Ok(())
}

#[tokio::test]
async fn test_request_save_is_a_pure_snapshot() -> Result<()> {
    let config = AvatarConfig {
        speech_output_enabled: false,
        ..session_config()
    };
    let (engine, mut events) = start_engine(shared(config), fast_responder());

    engine.set_input_mode(InputMode::Text).await;
    engine.submit_text("One").await;
    engine.submit_text("Two").await;
    drain(&mut events);

    engine.request_save().await;

    let saved = drain(&mut events)
        .into_iter()
        .find_map(|e| match e {
            SessionEvent::SaveRequested { messages } => Some(messages),
            _ => None,
        })
        .expect("SaveRequested should be emitted");
    assert_eq!(saved.len(), 2);

    // No mutation: the log is untouched.
    assert_eq!(engine.messages().await.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_clear_leaves_mode_and_recording_alone() -> Result<()> {
    let (engine, _events) = start_engine(shared(session_config()), fast_responder());

    engine.toggle_recording(None).await;
    engine.clear_history().await;

    assert!(engine.is_recording());
    assert_eq!(engine.input_mode().await, InputMode::Voice);

    Ok(())
}

#[test]
fn test_entry_gate_requires_trimmed_credential() {
    let mut config = AvatarConfig::default();
    assert!(!config.can_start_session());

    config.credential = "  ".to_string();
    assert!(!config.can_start_session());

    config.credential = "abc".to_string();
    assert!(config.can_start_session());
}
