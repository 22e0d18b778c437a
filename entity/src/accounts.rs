//! SeaORM Entity for accounts table.
//! An account is the tenant boundary for calls, behaviors and prompts.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::accounts::Model)]
#[sea_orm(schema_name = "call_qa", table_name = "accounts")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    pub name: String,

    /// URL-safe identifier used to prefix object storage keys
    #[sea_orm(unique)]
    pub slug: String,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::calls::Entity")]
    Calls,

    #[sea_orm(has_many = "super::behaviors::Entity")]
    Behaviors,

    #[sea_orm(has_many = "super::prompts::Entity")]
    Prompts,
}

impl Related<super::calls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calls.def()
    }
}

impl Related<super::behaviors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Behaviors.def()
    }
}

impl Related<super::prompts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prompts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
