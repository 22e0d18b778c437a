use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of a call recording through the analysis pipeline.
#[derive(
    Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "call_status")]
pub enum CallStatus {
    /// Call row created, audio not yet picked up by the pipeline
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Audio is being downloaded and transcribed
    #[sea_orm(string_value = "transcribing")]
    Transcribing,
    /// Transcript available, summarization / feedback generation in flight
    #[sea_orm(string_value = "analyzing")]
    Analyzing,
    /// All pipeline stages finished
    #[sea_orm(string_value = "complete")]
    Complete,
    /// Unrecoverable failure at some stage
    #[sea_orm(string_value = "error")]
    Error,
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallStatus::Pending => write!(fmt, "pending"),
            CallStatus::Transcribing => write!(fmt, "transcribing"),
            CallStatus::Analyzing => write!(fmt, "analyzing"),
            CallStatus::Complete => write!(fmt, "complete"),
            CallStatus::Error => write!(fmt, "error"),
        }
    }
}
