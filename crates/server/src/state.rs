//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use dwani_agent::{DialogueOrchestrator, SharedOrchestrator};
use dwani_config::{SafePlaceCatalog, Settings};
use dwani_core::SceneCache;
use dwani_tools::ToolRegistry;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Also driven by the console loop; held for one utterance at a time
    pub orchestrator: SharedOrchestrator,
    pub tools: Arc<ToolRegistry>,
    pub catalog: Arc<SafePlaceCatalog>,
    pub scene: SceneCache,
}

impl AppState {
    pub fn new(
        settings: Settings,
        orchestrator: DialogueOrchestrator,
        tools: Arc<ToolRegistry>,
        catalog: Arc<SafePlaceCatalog>,
        scene: SceneCache,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            tools,
            catalog,
            scene,
        }
    }
}
