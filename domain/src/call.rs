use crate::calls::Model;
use crate::error::Error;
use entity_api::query::IntoQueryFilterMap;
use entity_api::{calls, query};
use sea_orm::DatabaseConnection;

pub use entity_api::call::{
    create, find_by_id, find_by_title, mark_error, update_classification, update_stage,
    update_summary, update_transcription,
};

pub async fn find_by(
    db: &DatabaseConnection,
    params: impl IntoQueryFilterMap,
) -> Result<Vec<Model>, Error> {
    let calls =
        query::find_by::<calls::Entity, calls::Column>(db, params.into_query_filter_map()).await?;

    Ok(calls)
}
