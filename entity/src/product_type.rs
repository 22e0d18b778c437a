use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product line discussed on a call, inferred by the feedback stage.
/// Stored as NULL while the call has not been classified.
#[derive(Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "product_type")]
pub enum ProductType {
    #[serde(rename = "fijo")]
    #[sea_orm(string_value = "fijo")]
    Fijo,
    #[serde(rename = "móvil")]
    #[sea_orm(string_value = "móvil")]
    Movil,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Fijo => write!(fmt, "fijo"),
            ProductType::Movil => write!(fmt, "móvil"),
        }
    }
}
