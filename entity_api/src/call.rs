//! CRUD operations for calls table.

use super::error::{EntityApiErrorKind, Error};
use entity::call_result::CallResult;
use entity::call_status::CallStatus;
use entity::calls::{ActiveModel, Column, Entity, Model};
use entity::phrase_list::PhraseList;
use entity::product_type::ProductType;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, IntoActiveModel, TryIntoModel,
};

/// Creates a new call record. Status and progress are taken from the model so
/// the upload coordinator can insert directly at `transcribing`/10.
pub async fn create(db: &DatabaseConnection, call_model: Model) -> Result<Model, Error> {
    debug!(
        "Creating new call '{}' for account {}",
        call_model.title, call_model.account_id
    );

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        account_id: Set(call_model.account_id),
        title: Set(call_model.title),
        filename: Set(call_model.filename),
        audio_url: Set(call_model.audio_url),
        duration_seconds: Set(call_model.duration_seconds),
        status: Set(call_model.status),
        progress: Set(call_model.progress),
        transcription: Set(call_model.transcription),
        summary: Set(call_model.summary),
        sentiment: Set(call_model.sentiment),
        topics: Set(call_model.topics),
        entities: Set(call_model.entities),
        result: Set(call_model.result),
        product: Set(call_model.product),
        non_sale_reason: Set(call_model.non_sale_reason),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Exact title match within an account, used for upload deduplication.
pub async fn find_by_title(
    db: &DatabaseConnection,
    account_id: Id,
    title: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::AccountId.eq(account_id))
        .filter(Column::Title.eq(title))
        .one(db)
        .await?)
}

/// Advances the pipeline status and progress for a call.
pub async fn update_stage(
    db: &DatabaseConnection,
    id: Id,
    status: CallStatus,
    progress: i32,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    debug!("Updating call {id} stage to {status} ({progress}%)");

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        status: Set(status),
        progress: Set(progress),
        updated_at: Set(chrono::Utc::now().into()),
        ..existing.into_active_model()
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Stores the transcription artifacts produced by the transcription stage.
pub async fn update_transcription(
    db: &DatabaseConnection,
    id: Id,
    transcription: String,
    duration_seconds: Option<f64>,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        transcription: Set(Some(transcription)),
        duration_seconds: Set(duration_seconds.or(existing.duration_seconds)),
        updated_at: Set(chrono::Utc::now().into()),
        ..existing.into_active_model()
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

pub async fn update_summary(
    db: &DatabaseConnection,
    id: Id,
    summary: String,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        summary: Set(Some(summary)),
        updated_at: Set(chrono::Utc::now().into()),
        ..existing.into_active_model()
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Stores the derived classification tags produced by the feedback stage.
#[allow(clippy::too_many_arguments)]
pub async fn update_classification(
    db: &DatabaseConnection,
    id: Id,
    sentiment: Option<String>,
    topics: Option<PhraseList>,
    entities: Option<PhraseList>,
    result: Option<CallResult>,
    product: Option<ProductType>,
    non_sale_reason: Option<String>,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        sentiment: Set(sentiment.or(existing.sentiment.clone())),
        topics: Set(topics.or(existing.topics.clone())),
        entities: Set(entities.or(existing.entities.clone())),
        result: Set(result.or(existing.result.clone())),
        product: Set(product.or(existing.product.clone())),
        non_sale_reason: Set(non_sale_reason.or(existing.non_sale_reason.clone())),
        updated_at: Set(chrono::Utc::now().into()),
        ..existing.into_active_model()
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Moves a call to the error status, preserving whatever artifacts exist.
pub async fn mark_error(db: &DatabaseConnection, id: Id, detail: String) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    warn!("Marking call {id} as errored: {detail}");

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        status: Set(CallStatus::Error),
        transcription: Set(existing.transcription.clone().or(Some(detail))),
        updated_at: Set(chrono::Utc::now().into()),
        ..existing.into_active_model()
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn call_row(account_id: Id, title: &str) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            account_id,
            title: title.to_string(),
            filename: format!("{title}.mp3"),
            audio_url: None,
            duration_seconds: None,
            status: CallStatus::Pending,
            progress: 0,
            transcription: None,
            summary: None,
            sentiment: None,
            topics: None,
            entities: None,
            result: None,
            product: None,
            non_sale_reason: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn find_by_title_is_scoped_to_account_and_exact_title() {
        let account_id = Id::new_v4();
        let row = call_row(account_id, "llamada_enero");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let found = find_by_title(&db, account_id, "llamada_enero").await.unwrap();
        assert_eq!(found.map(|call| call.id), Some(row.id));

        let missing = find_by_title(&db, account_id, "otra_llamada").await.unwrap();
        assert!(missing.is_none());

        let log = db.into_transaction_log();
        let select = format!("{:?}", log[0]);
        assert!(select.contains("\"account_id\""));
        assert!(select.contains("\"title\""));
    }
}
