use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::{AppState, Error};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::gateway::object_store::ObjectStoreClient;
use domain::pipeline::Processor;
use domain::upload::{self, UploadLimits, UploadedFile};
use domain::Id;
use service::config::ApiVersion;
use std::sync::Arc;

use log::*;

/// POST a batch of audio files for an account.
///
/// Each file is validated, deduplicated by derived title, stored in the
/// object store and registered as a Call whose analysis pipeline starts
/// in the background. Returns a per-file summary; one bad file never
/// fails the batch.
#[utoipa::path(
    post,
    path = "/accounts/{account_id}/uploads",
    params(
        ApiVersion,
        ("account_id" = String, Path, description = "Account id that owns the uploaded calls")
    ),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch accepted; body reports per-file outcomes"),
        (status = 422, description = "Malformed multipart payload"),
        (status = 500, description = "Object storage is not configured")
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(account_id): Path<Id>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| domain::error::Error::invalid(format!("Malformed multipart payload: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            // Non-file fields (e.g. form metadata) are ignored
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            domain::error::Error::invalid(format!("Failed to read file {filename}: {e}"))
        })?;

        files.push(UploadedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    info!(
        "POST upload of {} files for account {account_id}",
        files.len()
    );

    let config = &app_state.config;
    let base_url = config
        .object_store_base_url()
        .ok_or_else(|| domain::error::Error::internal("Object store URL is not configured"))?;
    let api_key = config
        .object_store_api_key()
        .ok_or_else(|| domain::error::Error::internal("Object store API key is not configured"))?;

    let store = Arc::new(ObjectStoreClient::new(
        api_key,
        base_url,
        &config.object_store_bucket,
    )?);
    let processor = Arc::new(Processor::from_config(
        config,
        Arc::clone(&app_state.database_connection),
    )?);
    let limits = UploadLimits::from_config(config);

    let summary = upload::upload_batch(
        Arc::clone(&app_state.database_connection),
        store,
        processor,
        account_id,
        files,
        limits,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), summary)))
}
