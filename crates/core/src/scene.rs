//! Latest scene description shared between the background monitor and
//! the dialogue loop

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// One description of the camera view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl SceneSnapshot {
    pub fn now(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    /// Seconds since the snapshot was taken
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.timestamp).num_seconds()
    }
}

/// Single-slot cache. Writers replace the whole snapshot, so readers see
/// either the previous value or the new one.
#[derive(Debug, Clone, Default)]
pub struct SceneCache {
    latest: Arc<RwLock<Option<Arc<SceneSnapshot>>>>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: SceneSnapshot) {
        *self.latest.write() = Some(Arc::new(snapshot));
    }

    /// Most recent snapshot, if any
    pub fn latest(&self) -> Option<Arc<SceneSnapshot>> {
        self.latest.read().clone()
    }

    /// Latest snapshot no older than `max_age_secs`
    pub fn fresh(&self, max_age_secs: i64) -> Option<Arc<SceneSnapshot>> {
        self.latest().filter(|s| s.age_secs() <= max_age_secs)
    }
}
