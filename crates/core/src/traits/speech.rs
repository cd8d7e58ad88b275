//! Speech processing traits

use async_trait::async_trait;

use crate::Result;

/// Prefix spoken before urgent evacuation guidance
pub const ALERT_PREFIX: &str = "EMERGENCY ALERT:";

/// Speech-to-Text interface
///
/// Each call listens for one utterance. `Ok(None)` means nothing usable
/// was heard (silence, noise, recognition failure); the caller simply
/// listens again.
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(ConsoleTranscriber::stdin());
/// if let Some(text) = stt.transcribe().await? {
///     println!("Heard: {}", text);
/// }
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    async fn transcribe(&self) -> Result<Option<String>>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Speak `text`; `Ok(false)` when playback did not happen
    async fn speak(&self, text: &str) -> Result<bool>;

    /// Speak an urgent alert, prefixed so it cannot be mistaken for chat
    async fn speak_alert(&self, text: &str) -> Result<bool> {
        if text.starts_with(ALERT_PREFIX) {
            self.speak(text).await
        } else {
            self.speak(&format!("{} {}", ALERT_PREFIX, text)).await
        }
    }

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTts {
        spoken: Mutex<Vec<String>>,
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

    #[tokio::test]
    async fn test_speak_alert_adds_prefix_once() {
        let tts = RecordingTts::default();
        tts.speak_alert("Evacuate now").await.unwrap();
        tts.speak_alert("EMERGENCY ALERT: FIRE detected!").await.unwrap();

        let spoken = tts.spoken.lock();
        assert_eq!(spoken[0], "EMERGENCY ALERT: Evacuate now");
        assert_eq!(spoken[1], "EMERGENCY ALERT: FIRE detected!");
    }
}
