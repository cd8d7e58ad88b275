//! Dialogue orchestrator
//!
//! One utterance is handled at a time:
//!
//! ```text
//! Idle -> Listening -> Classifying -> EmergencyBranch -> Responding -> Idle
//!                                  \-> ChatBranch ------/
//! ```
//!
//! The emergency branch plans an evacuation and speaks an alert without
//! consulting the chat model. The chat branch allows exactly one extra
//! model round after tool calls. Each branch works on a staged copy of
//! the context that is committed only when the branch succeeds, so a
//! failed or cancelled turn leaves the conversation as it was. A failed
//! turn is answered with a spoken apology.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dwani_config::constants::{dialogue, models};
use dwani_config::AgentConfig;
use dwani_core::capability::guard;
use dwani_core::{
    ConversationContext, EmergencyAssessment, Error, GenerateRequest, LanguageModel, Message,
    ReplyAction, Role, SceneCache, StructuredReply, TextToSpeech, ToolCall, Turn,
};
use dwani_llm::{persona_prompt, Situation};
use dwani_navigation::EvacuationPlanner;
use dwani_tools::ToolExecutor;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::classifier::EmergencyClassifier;
use crate::events::{AgentEvent, DialogueState};
use crate::session::{ConversationSummary, SessionState};
use crate::AgentError;

/// Spoken when a turn could not be completed
pub const FAILED_TURN_APOLOGY: &str =
    "I'm sorry, I couldn't process that right now. If you are in danger, move to a safe place and call 112.";

/// Safe places listed in the live-situation preamble
const SITUATION_SAFE_PLACES: usize = 3;

/// Text produced by a branch, ready for the Responding state
struct BranchOutcome {
    reply: StructuredReply,
    /// Spoken through `speak_alert`
    alert: bool,
}

/// Puts the machine back to Idle when a turn future is dropped mid-way
struct IdleOnDrop<'a> {
    state: &'a Mutex<DialogueState>,
    events: &'a broadcast::Sender<AgentEvent>,
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        let from = std::mem::replace(&mut *self.state.lock(), DialogueState::Idle);
        if from != DialogueState::Idle {
            tracing::warn!(state = ?from, "Turn cancelled before completion");
            let _ = self.events.send(AgentEvent::StateChanged {
                from,
                to: DialogueState::Idle,
            });
        }
    }
}

pub struct OrchestratorBuilder {
    config: AgentConfig,
    llm: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    planner: Arc<EvacuationPlanner>,
    tts: Arc<dyn TextToSpeech>,
    scene: Option<SceneCache>,
    context: Option<ConversationContext>,
    max_tokens: u32,
    temperature: f32,
}

impl OrchestratorBuilder {
    pub fn scene_cache(mut self, cache: SceneCache) -> Self {
        self.scene = Some(cache);
        self
    }

    /// Continue from a restored conversation instead of a fresh one
    pub fn context(mut self, context: ConversationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn build(self) -> DialogueOrchestrator {
        let timeout = Duration::from_secs(self.config.capability_timeout_secs);
        let system_prompt = self
            .config
            .system_prompt
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| persona_prompt(&self.config.persona_name));

        let context = self
            .context
            .unwrap_or_else(|| ConversationContext::new(system_prompt, self.config.max_context_turns));

        let (event_tx, _) = broadcast::channel(100);

        DialogueOrchestrator {
            classifier: EmergencyClassifier::new(self.llm.clone(), timeout),
            session: SessionState::new(self.config.current_location.clone()),
            config: self.config,
            llm: self.llm,
            tools: self.tools,
            planner: self.planner,
            tts: self.tts,
            scene: self.scene,
            context,
            state: Mutex::new(DialogueState::Idle),
            event_tx,
            timeout,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

pub struct DialogueOrchestrator {
    config: AgentConfig,
    llm: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    planner: Arc<EvacuationPlanner>,
    tts: Arc<dyn TextToSpeech>,
    classifier: EmergencyClassifier,
    scene: Option<SceneCache>,
    context: ConversationContext,
    session: SessionState,
    state: Mutex<DialogueState>,
    event_tx: broadcast::Sender<AgentEvent>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl DialogueOrchestrator {
    pub fn builder(
        config: AgentConfig,
        llm: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
        planner: Arc<EvacuationPlanner>,
        tts: Arc<dyn TextToSpeech>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            llm,
            tools,
            planner,
            tts,
            scene: None,
            context: None,
            max_tokens: models::MAX_TOKENS,
            temperature: models::TEMPERATURE,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Name of the speech output backend
    pub fn speaker_name(&self) -> &str {
        self.tts.model_name()
    }

    pub fn state(&self) -> DialogueState {
        *self.state.lock()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.event_tx.subscribe()
    }

    /// Change the origin used for evacuation routes
    pub fn set_location(&mut self, location: impl Into<String>) {
        let location = location.into();
        tracing::info!(location = %location, "Location updated");
        self.session.current_location = location;
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary::from_history(self.context.history(), self.session.emergency_count)
    }

    /// Forget the conversation but keep the session counters
    pub fn reset_conversation(&mut self) {
        self.context.reset();
        tracing::info!("Conversation reset");
    }

    pub(crate) fn set_state(&self, to: DialogueState) {
        let from = std::mem::replace(&mut *self.state.lock(), to);
        if from != to {
            tracing::trace!(?from, ?to, "Dialogue state");
            let _ = self.event_tx.send(AgentEvent::StateChanged { from, to });
        }
    }

    fn situation(&self) -> Situation {
        let emergency_type = self
            .session
            .last_assessment
            .as_ref()
            .map(|a| a.emergency_type)
            .unwrap_or_default();

        let catalog = self.planner.catalog();
        let safe_places = catalog
            .priority_for(emergency_type)
            .iter()
            .filter_map(|key| catalog.get(key))
            .take(SITUATION_SAFE_PLACES)
            .map(|p| p.name.clone())
            .collect();

        Situation {
            location: self.session.current_location.clone(),
            hazards: self.session.hazards().to_vec(),
            safe_places,
            scene: self
                .scene
                .as_ref()
                .and_then(|cache| cache.fresh(dialogue::SCENE_MAX_AGE_SECS))
                .map(|s| s.description.clone()),
        }
    }

    /// Handle one utterance through classification, a branch and the
    /// spoken response.
    ///
    /// Returns [`AgentError::EmptyUtterance`] for blank input (nothing is
    /// recorded) and [`AgentError::InvalidTurn`] when a branch violates the
    /// conversation invariants. Capability failures never surface here.
    ///
    /// Dropping the returned future leaves the context unchanged and the
    /// state back at Idle.
    pub async fn handle_utterance(&mut self, text: &str) -> Result<StructuredReply, AgentError> {
        let utterance = text.trim();
        if utterance.is_empty() {
            return Err(AgentError::EmptyUtterance);
        }

        let _idle = IdleOnDrop {
            state: &self.state,
            events: &self.event_tx,
        };
        let started = Instant::now();
        self.session.turn_count += 1;

        self.set_state(DialogueState::Classifying);
        let situation = self.situation();
        let assessment = self.classifier.assess(utterance, Some(&situation)).await;
        let is_emergency = assessment.is_emergency;
        self.session.last_assessment = Some(assessment.clone());

        let mut exchange = self.context.stage();
        let (branch, result) = if is_emergency {
            self.session.emergency_count += 1;
            let _ = self.event_tx.send(AgentEvent::EmergencyDetected {
                emergency_type: assessment.emergency_type,
                urgency: assessment.urgency_level,
            });
            self.set_state(DialogueState::EmergencyBranch);
            ("emergency", self.emergency_branch(&mut exchange, utterance, &assessment).await)
        } else {
            self.set_state(DialogueState::ChatBranch);
            ("chat", self.chat_branch(&mut exchange, utterance, &situation).await)
        };

        metrics::counter!("dwani_utterances_total", "branch" => branch).increment(1);

        let outcome = match result {
            Ok(outcome) => {
                self.context.commit(exchange);
                outcome
            }
            Err(Error::InvalidTurn(message)) => {
                tracing::error!(branch = branch, error = %message, "Invalid turn");
                let _ = self.event_tx.send(AgentEvent::Error(message.clone()));
                self.set_state(DialogueState::Idle);
                return Err(AgentError::InvalidTurn(message));
            }
            Err(e) => {
                tracing::warn!(branch = branch, error = %e, "Turn failed, context unchanged");
                if e.is_capability_failure() {
                    metrics::counter!("dwani_capability_failures_total", "capability" => "chat")
                        .increment(1);
                }
                let _ = self.event_tx.send(AgentEvent::Error(e.to_string()));
                BranchOutcome {
                    reply: StructuredReply::spoken(FAILED_TURN_APOLOGY),
                    alert: false,
                }
            }
        };

        self.respond(&outcome).await;

        metrics::histogram!("dwani_turn_latency_seconds", "branch" => branch)
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            branch = branch,
            action = ?outcome.reply.action,
            latency_ms = started.elapsed().as_millis() as u64,
            "Turn complete"
        );

        self.set_state(DialogueState::Idle);
        Ok(outcome.reply)
    }

    async fn respond(&self, outcome: &BranchOutcome) {
        self.set_state(DialogueState::Responding);

        let speech = if outcome.alert {
            guard("tts", self.timeout, self.tts.speak_alert(&outcome.reply.speak)).await
        } else {
            guard("tts", self.timeout, self.tts.speak(&outcome.reply.speak)).await
        };

        match speech {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Speech output skipped"),
            Err(e) => {
                metrics::counter!("dwani_capability_failures_total", "capability" => "tts").increment(1);
                tracing::warn!(error = %e, "Speech output failed");
            }
        }

        let _ = self.event_tx.send(AgentEvent::Response(outcome.reply.clone()));
    }

    async fn emergency_branch(
        &self,
        exchange: &mut ConversationContext,
        utterance: &str,
        assessment: &EmergencyAssessment,
    ) -> Result<BranchOutcome, Error> {
        let emergency_type = assessment.emergency_type;
        let plan = self
            .planner
            .plan(&self.session.current_location, emergency_type)
            .await;

        let destination = plan.destination().map(|p| p.name.clone());
        let _ = self.event_tx.send(AgentEvent::EvacuationPlanned {
            destination: destination.clone(),
            live_route: plan.is_live(),
        });

        let urgent = assessment.urgency_level.requires_evacuation();
        let headline = if urgent {
            format!(
                "EMERGENCY ALERT: {} detected! Evacuate immediately and call emergency services.",
                emergency_type.spoken().to_uppercase()
            )
        } else {
            format!(
                "Warning: {} detected. Please proceed with caution.",
                emergency_type.spoken()
            )
        };
        let alert = format!(
            "{}\n\n{}",
            headline,
            plan.voice_instructions(self.config.max_alert_steps)
        );

        exchange.append(Turn::user(utterance))?;
        exchange.append(Turn::assistant(alert.clone()))?;

        tracing::warn!(
            emergency_type = %emergency_type,
            urgency = %assessment.urgency_level,
            destination = ?destination,
            live_route = plan.is_live(),
            "Emergency alert issued"
        );

        Ok(BranchOutcome {
            reply: StructuredReply {
                speak: alert,
                action: if urgent { ReplyAction::Navigate } else { ReplyAction::Warn },
                direction: Default::default(),
                distance: plan.total_distance_m().map(f64::from).unwrap_or(0.0),
                urgency: assessment.urgency_level,
                hazards_detected: assessment.detected_hazards.clone(),
                safe_direction: destination.unwrap_or_else(|| "none".to_string()),
            },
            alert: urgent,
        })
    }

    /// Rendered context with the live-situation preamble on the latest
    /// user message. The preamble is never stored in the context.
    fn render_with_situation(context: &ConversationContext, situation: &Situation) -> Vec<Message> {
        let mut messages = context.render_for_model();
        if let Some(last_user) = messages.iter_mut().rev().find(|m| m.role == Role::User) {
            last_user.content = format!("{}\nUser: {}", situation.preamble(), last_user.content);
        }
        messages
    }

    fn chat_request(&self, exchange: &ConversationContext, situation: &Situation) -> GenerateRequest {
        GenerateRequest::from_messages(Self::render_with_situation(exchange, situation))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }

    async fn chat_branch(
        &self,
        exchange: &mut ConversationContext,
        utterance: &str,
        situation: &Situation,
    ) -> Result<BranchOutcome, Error> {
        exchange.append(Turn::user(utterance))?;

        let tools = self.tools.list_specs();
        let response = guard(
            "chat",
            self.timeout,
            self.llm.generate_with_tools(self.chat_request(exchange, situation), &tools),
        )
        .await?;

        let final_text = if response.has_tool_calls() {
            exchange.append(Turn::tool_request(response.text.clone(), response.tool_calls.clone()))?;

            for call in &response.tool_calls {
                let payload = self.run_tool(call).await;
                exchange.append(Turn::tool(call.id.clone(), payload.to_string()))?;
            }

            let followup = guard(
                "chat",
                self.timeout,
                self.llm.generate_with_tools(self.chat_request(exchange, situation), &tools),
            )
            .await?;

            if followup.has_tool_calls() {
                tracing::warn!(
                    ignored = followup.tool_calls.len(),
                    "Model asked for more tools after the extra round; ignoring"
                );
            }
            followup.text
        } else {
            response.text
        };

        let reply = StructuredReply::from_model_text(&final_text);
        let content = match final_text.trim() {
            "" => reply.speak.clone(),
            text => text.to_string(),
        };
        exchange.append(Turn::assistant(content))?;

        Ok(BranchOutcome { reply, alert: false })
    }

    /// Dispatch one call; every outcome becomes a JSON payload
    async fn run_tool(&self, call: &ToolCall) -> Value {
        let _ = self.event_tx.send(AgentEvent::ToolCall {
            name: call.name.clone(),
            call_id: call.id.clone(),
        });

        let (payload, outcome) = match self.tools.dispatch(call).await {
            Ok(value) if value.get("error").is_some() => (value, "error"),
            Ok(value) => (value, "ok"),
            Err(Error::UnknownTool(name)) => {
                tracing::warn!(tool = %name, "Model requested an unknown tool");
                (json!({ "error": format!("Unknown tool: {}", name) }), "unknown")
            }
            Err(e) => (json!({ "error": e.to_string() }), "error"),
        };

        metrics::counter!("dwani_tool_calls_total", "tool" => call.name.clone(), "outcome" => outcome)
            .increment(1);
        let _ = self.event_tx.send(AgentEvent::ToolResult {
            name: call.name.clone(),
            call_id: call.id.clone(),
            success: outcome == "ok",
        });

        payload
    }

    /// Speak outside of a turn (greeting, farewell)
    pub(crate) async fn say(&self, text: &str) {
        if let Err(e) = guard("tts", self.timeout, self.tts.speak(text)).await {
            tracing::warn!(error = %e, "Speech output failed");
        }
    }
}
