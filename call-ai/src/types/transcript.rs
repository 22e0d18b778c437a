//! Types for speech-to-text transcription results.

use serde::{Deserialize, Serialize};

/// Speaker role attributed to a transcript line.
///
/// Calls are assumed to be two-party (advisor and client); `Silence` marks
/// gaps long enough to be rendered as explicit markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Advisor,
    Client,
    Silence,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Advisor => write!(fmt, "Asesor"),
            Speaker::Client => write!(fmt, "Cliente"),
            Speaker::Silence => write!(fmt, "Silencio"),
        }
    }
}

/// One timed segment as returned by the speech-to-text provider, before
/// speaker attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    pub text: String,
    /// Start offset in seconds from the beginning of the audio
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

/// Complete provider transcription result.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawTranscript {
    /// Full flattened text
    pub text: String,
    /// Timed segments; empty when the provider returned text only
    pub segments: Vec<RawSegment>,
    /// Audio duration in seconds when reported by the provider
    pub duration_seconds: Option<f64>,
    /// Detected language code when reported
    pub language: Option<String>,
}

/// A transcription request carrying downloaded audio bytes.
///
/// The pipeline downloads audio itself (with its own timeout budget) so that
/// download failures are distinguishable from provider failures.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Domain-priming prompt biasing diarization toward the expected
    /// advisor/client call structure
    pub prompt: Option<String>,
    pub language: Option<String>,
}

impl TranscribeRequest {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            prompt: None,
            language: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
