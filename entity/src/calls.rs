//! SeaORM Entity for calls table.
//! One uploaded audio recording and its derived analysis artifacts.

use crate::call_result::CallResult;
use crate::call_status::CallStatus;
use crate::phrase_list::PhraseList;
use crate::product_type::ProductType;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::calls::Model)]
#[sea_orm(schema_name = "call_qa", table_name = "calls")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    #[schema(value_type = Uuid)]
    pub account_id: Id,

    /// Derived from the uploaded filename; unique per account
    pub title: String,

    /// Original filename as uploaded
    pub filename: String,

    /// Public URL of the audio object in storage
    pub audio_url: Option<String>,

    /// Audio duration in seconds, filled in after transcription
    pub duration_seconds: Option<f64>,

    /// Current pipeline status
    pub status: CallStatus,

    /// Pipeline progress 0-100, monotonically non-decreasing under normal operation
    pub progress: i32,

    /// Rendered speaker-attributed transcript ("[mm:ss] Asesor: ..." lines)
    #[sea_orm(column_type = "Text", nullable)]
    pub transcription: Option<String>,

    /// Narrative summary produced by the summarization stage
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Overall sentiment tag from the general feedback path
    pub sentiment: Option<String>,

    /// Topic tags derived from the summary/feedback
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub topics: Option<PhraseList>,

    /// Named entities mentioned on the call
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub entities: Option<PhraseList>,

    /// Sale / no-sale classification; NULL until classified
    pub result: Option<CallResult>,

    /// Product line classification; NULL until classified
    pub product: Option<ProductType>,

    /// Short phrase explaining a non-sale outcome
    pub non_sale_reason: Option<String>,

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

    #[sea_orm(has_one = "super::feedback::Entity")]
    Feedback,

    #[sea_orm(has_many = "super::usage_tracking::Entity")]
    UsageTracking,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl Related<super::usage_tracking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageTracking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
