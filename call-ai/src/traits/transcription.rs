//! Speech-to-text provider trait.

use crate::types::transcript::{RawTranscript, TranscribeRequest};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for speech-to-text transcription services.
///
/// Implementations convert audio bytes to text with segment-level timestamps.
/// Speaker attribution is deliberately NOT part of this trait: diarization is
/// a pipeline-side heuristic so the keyword tables can evolve (or be replaced
/// by a proper diarization model) without touching providers.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio file synchronously.
    ///
    /// The audio must already be downloaded; upstream owns the download
    /// timeout so transport failures are reported distinctly.
    async fn transcribe(&self, request: TranscribeRequest) -> Result<RawTranscript, Error>;

    /// Unique lowercase identifier for this provider (e.g. "openai_whisper").
    fn provider_id(&self) -> &str;
}
