//! Call AI abstraction layer for transcription and text-completion providers.
//!
//! This crate provides trait-based abstractions for the call-analysis pipeline:
//! - Speech-to-text transcription with segment-level timestamps
//! - Text-completion models with cost-tier selection (capable vs. economy)
//!
//! The design is provider-agnostic, enabling the pipeline to swap between
//! different service providers (OpenAI, Deepgram, local models, etc.) without
//! changing the analysis code, and to mock model calls in tests.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::Error;
pub use traits::completion::CompletionModel;
pub use traits::transcription::Transcriber;
pub use types::completion::{CompletionRequest, ModelTier};
pub use types::transcript::{RawSegment, RawTranscript, Speaker};

#[cfg(feature = "mock")]
pub use traits::completion::MockCompletionModel;
#[cfg(feature = "mock")]
pub use traits::transcription::MockTranscriber;
