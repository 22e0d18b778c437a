use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which pipeline stage a stored prompt row configures.
#[derive(Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "prompt_type")]
pub enum PromptType {
    #[sea_orm(string_value = "summary")]
    Summary,
    #[sea_orm(string_value = "feedback")]
    Feedback,
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptType::Summary => write!(fmt, "summary"),
            PromptType::Feedback => write!(fmt, "feedback"),
        }
    }
}
