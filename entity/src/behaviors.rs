//! SeaORM Entity for behaviors table.
//! A behavior is a named rubric criterion evaluated against call transcripts.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::behaviors::Model)]
#[sea_orm(schema_name = "call_qa", table_name = "behaviors")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    /// Owning account; NULL means the behavior is global (shared across accounts)
    #[schema(value_type = Option<Uuid>)]
    pub account_id: Option<Id>,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Natural-language evaluation criterion sent to the model
    #[sea_orm(column_type = "Text")]
    pub prompt: String,

    /// Only active behaviors are eligible for analysis
    pub is_active: bool,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
