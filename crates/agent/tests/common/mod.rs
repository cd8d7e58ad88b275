//! Scripted capability doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dwani_agent::DialogueOrchestrator;
use dwani_config::{AgentConfig, SafePlaceCatalog};
use dwani_core::{
    Coordinates, Error, GenerateRequest, GenerateResponse, Geocoder, LanguageModel, Result,
    RouteProfile, Router, SceneCache, SpeechToText, TextToSpeech, ToolCall, ToolDefinition,
};
use dwani_navigation::EvacuationPlanner;
use dwani_tools::create_default_registry;
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const HERE: &str = "Heinrich-Heine-Allee, Düsseldorf";
pub const FIRE_STATION: &str = "Berger Allee 25, 40213 Düsseldorf";

/// Classifier and chat replies are scripted separately; a request is a
/// classification when it has no system message.
#[derive(Default)]
pub struct ScriptedLlm {
    pub assessments: Mutex<VecDeque<Result<GenerateResponse>>>,
    pub chats: Mutex<VecDeque<Result<GenerateResponse>>>,
    pub chat_requests: Mutex<Vec<GenerateRequest>>,
    pub classifier_requests: Mutex<Vec<GenerateRequest>>,
    /// Chat calls past the end of the script never return
    pub stall_when_exhausted: AtomicBool,
}

impl ScriptedLlm {
    pub fn assess(&self, json: Value) -> &Self {
        self.assessments
            .lock()
            .push_back(Ok(GenerateResponse::text(json.to_string())));
        self
    }

    pub fn calm(&self) -> &Self {
        self.assess(json!({
            "is_emergency": false,
            "urgency_level": "low",
            "detected_hazards": [],
            "required_action": "none",
            "emergency_type": "general",
            "speak": ""
        }))
    }

    pub fn chat(&self, response: GenerateResponse) -> &Self {
        self.chats.lock().push_back(Ok(response));
        self
    }

    pub fn chat_text(&self, text: &str) -> &Self {
        self.chat(GenerateResponse::text(text))
    }

    pub fn chat_failure(&self) -> &Self {
        self.chats
            .lock()
            .push_back(Err(Error::unavailable("chat", "HTTP 503")));
        self
    }

    pub fn stall_after_script(&self) -> &Self {
        self.stall_when_exhausted.store(true, Ordering::SeqCst);
        self
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_requests.lock().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        _tools: &[ToolDefinition],
    ) -> Result<GenerateResponse> {
        let is_chat = request
            .messages
            .first()
            .map(|m| m.role == dwani_core::Role::System)
            .unwrap_or(false);

        if is_chat {
            self.chat_requests.lock().push(request);
            let next = self.chats.lock().pop_front();
            match next {
                Some(response) => response,
                None if self.stall_when_exhausted.load(Ordering::SeqCst) => {
                    std::future::pending().await
                }
                None => Err(Error::unavailable("chat", "script exhausted")),
            }
        } else {
            self.classifier_requests.lock().push(request);
            self.assessments
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(GenerateResponse::text("{\"is_emergency\": false}")))
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub struct RecordingTts {
    pub spoken: Mutex<Vec<String>>,
}

impl RecordingTts {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl TextToSpeech for RecordingTts {
    async fn speak(&self, text: &str) -> Result<bool> {
        self.spoken.lock().push(text.to_string());
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

/// Lines handed out in order; afterwards input is unavailable
pub struct ScriptedStt {
    lines: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedStt {
    pub fn new(lines: &[Option<&str>]) -> Self {
        Self {
            lines: Mutex::new(lines.iter().map(|l| l.map(str::to_string)).collect()),
        }
    }
}

#[async_trait]
impl SpeechToText for ScriptedStt {
    async fn transcribe(&self) -> Result<Option<String>> {
        match self.lines.lock().pop_front() {
            Some(line) => Ok(line),
            None => Err(Error::unavailable("stt", "input closed")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Never hears anything
pub struct SilentStt;

#[async_trait]
impl SpeechToText for SilentStt {
    async fn transcribe(&self) -> Result<Option<String>> {
        std::future::pending().await
    }

    fn model_name(&self) -> &str {
        "silent"
    }
}

pub struct MapGeocoder {
    known: HashMap<String, Coordinates>,
}

impl MapGeocoder {
    pub fn knowing(addresses: &[&str]) -> Self {
        Self {
            known: addresses
                .iter()
                .enumerate()
                .map(|(i, a)| (a.to_string(), Coordinates::new(6.77 + i as f64 / 100.0, 51.22)))
                .collect(),
        }
    }
}

#[async_trait]
impl Geocoder for MapGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        Ok(self.known.get(address).copied())
    }
}

pub struct FixedRouter;

#[async_trait]
impl Router for FixedRouter {
    async fn route(&self, _: Coordinates, _: Coordinates, _: RouteProfile) -> Result<Option<Value>> {
        Ok(Some(json!({
            "routes": [{
                "summary": {"distance": 640.0, "duration": 462.0},
                "segments": [{"steps": [
                    {"instruction": "Head south on Heinrich-Heine-Allee", "distance": 300.0, "duration": 216.0},
                    {"instruction": "Turn right onto Berger Allee", "distance": 340.0, "duration": 246.0}
                ]}]
            }]
        })))
    }
}

pub fn tool_call(id: &str, name: &str, args: Value) -> ToolCall {
    let arguments: HashMap<String, Value> = serde_json::from_value(args).unwrap_or_default();
    ToolCall::new(id, name, arguments)
}

pub struct Harness {
    pub llm: Arc<ScriptedLlm>,
    pub tts: Arc<RecordingTts>,
    pub orchestrator: DialogueOrchestrator,
}

pub fn harness_with(config: AgentConfig, geocoder: MapGeocoder) -> Harness {
    build_harness(config, geocoder, None)
}

pub fn harness_with_scene(scene: SceneCache) -> Harness {
    build_harness(
        AgentConfig::default(),
        MapGeocoder::knowing(&[HERE, FIRE_STATION]),
        Some(scene),
    )
}

fn build_harness(config: AgentConfig, geocoder: MapGeocoder, scene: Option<SceneCache>) -> Harness {
    let llm = Arc::new(ScriptedLlm::default());
    let tts = Arc::new(RecordingTts::default());
    let planner = Arc::new(EvacuationPlanner::new(
        Arc::new(SafePlaceCatalog::default()),
        Arc::new(geocoder),
        Arc::new(FixedRouter),
    ));
    let tools = Arc::new(create_default_registry(planner.clone(), None));

    let mut builder = DialogueOrchestrator::builder(config, llm.clone(), tools, planner, tts.clone());
    if let Some(scene) = scene {
        builder = builder.scene_cache(scene);
    }
    let orchestrator = builder.build();

    Harness {
        llm,
        tts,
        orchestrator,
    }
}

pub fn harness() -> Harness {
    harness_with(AgentConfig::default(), MapGeocoder::knowing(&[HERE, FIRE_STATION]))
}
