//! Console speech backends
//!
//! Typed lines stand in for speech recognition and replies are printed
//! instead of synthesized.

use async_trait::async_trait;
use dwani_core::{Error, Result, SpeechToText, TextToSpeech};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// One line of input per utterance
pub struct ConsoleTranscriber<R = BufReader<Stdin>> {
    reader: Mutex<R>,
}

impl ConsoleTranscriber {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ConsoleTranscriber<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> SpeechToText for ConsoleTranscriber<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn transcribe(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| Error::unavailable("stt", e.to_string()))?;

        if read == 0 {
            return Err(Error::unavailable("stt", "console input closed"));
        }

        let text = line.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    fn model_name(&self) -> &str {
        "console"
    }
}

/// Prints replies prefixed with the persona name
pub struct ConsoleSpeaker {
    persona: String,
}

impl ConsoleSpeaker {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }
}

#[async_trait]
impl TextToSpeech for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{}: {}\n", self.persona, text).as_bytes())
            .await
            .map_err(|e| Error::unavailable("tts", e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| Error::unavailable("tts", e.to_string()))?;
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "console"
    }
}
