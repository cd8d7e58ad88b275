//! Best-effort decoding of structured model output
//!
//! Models are asked for JSON but frequently wrap it in Markdown fences or
//! surround it with prose. Text is only ever parsed as JSON, never
//! evaluated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid fence regex")
});

static OBJECT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

/// Strip Markdown fences and isolate the outermost `{...}` block
pub fn extract_json_block(text: &str) -> Option<&str> {
    let inner = FENCED_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    OBJECT_BLOCK.find(inner).map(|m| m.as_str())
}

/// Decode the JSON object embedded in `text`.
///
/// When prose after the object contains a stray `}`, the outermost block
/// does not parse; the first complete object is used instead.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let block = extract_json_block(text).ok_or_else(|| {
        Error::MalformedModelOutput(format!("no JSON object in: {}", preview(text, 100)))
    })?;

    match serde_json::from_str(block) {
        Ok(value) => Ok(value),
        Err(e) => serde_json::Deserializer::from_str(block)
            .into_iter::<T>()
            .next()
            .and_then(|first| first.ok())
            .ok_or_else(|| Error::MalformedModelOutput(e.to_string())),
    }
}

/// Decode `text`, or build the call site's fallback when it is not valid
pub fn decode_or<T, F>(text: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match decode(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Structured decode failed, using fallback");
            fallback()
        }
    }
}

/// First `max_chars` characters of `text`
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
