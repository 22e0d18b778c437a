//! CRUD operations for usage_tracking table.

use super::error::Error;
use entity::usage_tracking::{ActiveModel, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, TryIntoModel};

/// Records transcribed audio seconds for a call.
pub async fn record(
    db: &DatabaseConnection,
    account_id: Id,
    call_id: Id,
    audio_seconds: f64,
) -> Result<Model, Error> {
    debug!("Recording {audio_seconds:.1}s of transcribed audio for call {call_id}");

    let active_model = ActiveModel {
        account_id: Set(account_id),
        call_id: Set(call_id),
        audio_seconds: Set(audio_seconds),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}
