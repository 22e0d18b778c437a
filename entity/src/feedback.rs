//! SeaORM Entity for feedback table.
//! The single aggregate quality-assessment record per call.
//!
//! Uniqueness on `call_id` is enforced by the schema; the behavior analysis
//! path and the general feedback path both patch this row (read-merge-write)
//! rather than replacing it.

use crate::behavior_evaluation::BehaviorEvaluations;
use crate::phrase_list::PhraseList;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::feedback::Model)]
#[sea_orm(schema_name = "call_qa", table_name = "feedback")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    #[sea_orm(unique)]
    #[schema(value_type = Uuid)]
    pub call_id: Id,

    /// Percentage of behaviors evaluated as "cumple" (0-100)
    pub score: i32,

    /// Positive findings
    #[sea_orm(column_type = "JsonBinary")]
    pub positive: PhraseList,

    /// Negative findings
    #[sea_orm(column_type = "JsonBinary")]
    pub negative: PhraseList,

    /// Improvement opportunities
    #[sea_orm(column_type = "JsonBinary")]
    pub opportunities: PhraseList,

    /// One evaluation per analyzed behavior; non-empty means final
    #[sea_orm(column_type = "JsonBinary")]
    pub behaviors_analysis: BehaviorEvaluations,

    pub sentiment: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub topics: Option<PhraseList>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub entities: Option<PhraseList>,

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
        belongs_to = "super::calls::Entity",
        from = "Column::CallId",
        to = "super::calls::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Calls,
}

impl Related<super::calls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
