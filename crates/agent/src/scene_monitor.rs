//! Background scene description
//!
//! Captures and describes a frame on a fixed interval. Results land in the
//! capture's `SceneCache`; the dialogue loop only ever reads that cache.

use std::sync::Arc;
use std::time::Duration;

use dwani_tools::SceneCapture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Run until `shutdown` flips to `true` or its sender is dropped
pub fn spawn_scene_monitor(
    capture: Arc<SceneCapture>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = interval.as_secs(), "Scene monitor started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match capture.capture_and_describe().await {
                        Ok(snapshot) => {
                            tracing::debug!(description = %snapshot.description, "Scene updated");
                        }
                        Err(e) => {
                            metrics::counter!("dwani_capability_failures_total", "capability" => "vision")
                                .increment(1);
                            tracing::warn!(error = %e, "Scene capture failed");
                        }
                    }
                }
            }
        }

        tracing::info!("Scene monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dwani_core::{FrameSource, Result, SceneCache, VisionModel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Frames;

    #[async_trait]
    impl FrameSource for Frames {
        async fn capture(&self) -> Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }
    }

    #[derive(Default)]
    struct CountingVision {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VisionModel for CountingVision {
        async fn describe(&self, _image: &[u8], _mime: &str, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("frame {}", n))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_monitor_publishes_and_stops() {
        let cache = SceneCache::new();
        let vision = Arc::new(CountingVision::default());
        let capture = Arc::new(
            SceneCapture::new(Arc::new(Frames), vision.clone(), Duration::from_secs(1))
                .with_cache(cache.clone()),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_scene_monitor(capture, Duration::from_millis(20), shutdown_rx);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.latest().unwrap().description.starts_with("frame "));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let calls = vision.calls.load(Ordering::SeqCst);
        assert!(calls >= 2);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(vision.calls.load(Ordering::SeqCst), calls);
    }
}
