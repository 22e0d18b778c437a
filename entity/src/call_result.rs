use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Commercial outcome of a call as inferred by the feedback stage.
/// Stored as NULL while the call has not been classified.
#[derive(Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "call_result")]
pub enum CallResult {
    #[serde(rename = "venta")]
    #[sea_orm(string_value = "venta")]
    Venta,
    #[serde(rename = "no venta")]
    #[sea_orm(string_value = "no venta")]
    NoVenta,
}

impl std::fmt::Display for CallResult {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallResult::Venta => write!(fmt, "venta"),
            CallResult::NoVenta => write!(fmt, "no venta"),
        }
    }
}
