pub mod completion;
pub mod transcription;
