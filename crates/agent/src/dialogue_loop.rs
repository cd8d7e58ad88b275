//! Listening loop over a shared orchestrator
//!
//! The orchestrator lock is held only while an utterance is handled, so
//! other callers (the HTTP API) can take turns between utterances.

use std::sync::Arc;

use dwani_core::SpeechToText;
use tokio::sync::{watch, Mutex};

use crate::events::DialogueState;
use crate::orchestrator::DialogueOrchestrator;
use crate::session::{SessionSummary, StopReason};
use crate::transcript::TranscriptStore;
use crate::AgentError;

/// Orchestrator shared between the voice loop and other front ends
pub type SharedOrchestrator = Arc<Mutex<DialogueOrchestrator>>;

/// Consecutive speech-input failures before the loop gives up
pub const MAX_INPUT_FAILURES: u32 = 5;

/// Listen and respond until a stop phrase, `shutdown`, or repeated input
/// failure. The transcript is flushed to `store` on exit.
pub async fn run_dialogue(
    orchestrator: SharedOrchestrator,
    stt: Arc<dyn SpeechToText>,
    mut shutdown: watch::Receiver<bool>,
    store: Option<&dyn TranscriptStore>,
) -> Result<SessionSummary, AgentError> {
    let config = {
        let agent = orchestrator.lock().await;
        tracing::info!(
            persona = %agent.config().persona_name,
            stt = stt.model_name(),
            tts = agent.speaker_name(),
            "Dialogue loop started"
        );
        agent
            .say(&format!(
                "Hello, I'm {}. I'm watching out for your safety. How can I help?",
                agent.config().persona_name
            ))
            .await;
        agent.config().clone()
    };

    let mut input_failures = 0u32;
    let stop_reason = loop {
        if *shutdown.borrow() {
            break StopReason::Shutdown;
        }

        orchestrator.lock().await.set_state(DialogueState::Listening);
        let heard = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break StopReason::Shutdown;
                }
                continue;
            }
            heard = stt.transcribe() => heard,
        };

        let text = match heard {
            Ok(Some(text)) if !text.trim().is_empty() => {
                input_failures = 0;
                text
            }
            Ok(_) => continue,
            Err(e) => {
                input_failures += 1;
                metrics::counter!("dwani_capability_failures_total", "capability" => "stt").increment(1);
                tracing::warn!(error = %e, failures = input_failures, "Speech input failed");
                if input_failures >= MAX_INPUT_FAILURES {
                    break StopReason::InputUnavailable;
                }
                continue;
            }
        };

        if config.is_stop_phrase(&text) {
            orchestrator.lock().await.say("Goodbye! Stay safe.").await;
            break StopReason::StopPhrase;
        }

        let mut agent = orchestrator.lock().await;
        match agent.handle_utterance(&text).await {
            Ok(_) | Err(AgentError::EmptyUtterance) => {}
            Err(e) => {
                tracing::error!(error = %e, "Utterance handling failed");
            }
        }
    };

    let agent = orchestrator.lock().await;
    agent.set_state(DialogueState::Idle);

    let transcript_saved = match store {
        Some(store) => match store.save(agent.context().turns()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to save transcript");
                false
            }
        },
        None => false,
    };

    tracing::info!(?stop_reason, turns = agent.session().turn_count, "Dialogue loop stopped");

    Ok(SessionSummary {
        stop_reason,
        session: agent.session().clone(),
        conversation: agent.summary(),
        transcript_saved,
    })
}
