use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::call::IndexParams;
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::pipeline::{ProcessRequest, Processor};
use domain::{call as CallApi, Id};
use serde::Deserialize;
use service::config::ApiVersion;
use std::sync::Arc;
use utoipa::ToSchema;

use log::*;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct ProcessParams {
    /// Overrides the stored audio URL, e.g. to reprocess from a new object
    audio_url: Option<String>,
    summary_prompt_override: Option<String>,
    feedback_prompt_override: Option<String>,
    #[schema(value_type = Option<Vec<Uuid>>)]
    selected_behavior_ids: Option<Vec<Id>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct AnalyzeParams {
    #[schema(value_type = Option<Vec<Uuid>>)]
    selected_behavior_ids: Option<Vec<Id>>,
}

/// GET all calls for an account
#[utoipa::path(
    get,
    path = "/calls",
    params(ApiVersion, IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved all Calls for the account", body = [domain::calls::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Calls with filter: {params:?}");

    let calls = CallApi::find_by(app_state.db_conn_ref(), params).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), calls)))
}

/// GET a particular Call specified by its id.
#[utoipa::path(
    get,
    path = "/calls/{id}",
    params(
        ApiVersion,
        ("id" = String, Path, description = "Call id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a specific Call by its id", body = [domain::calls::Model]),
        (status = 404, description = "Call not found"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Call by id: {id}");

    let call = CallApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), call)))
}

/// POST run the analysis pipeline for a call.
///
/// Runs transcription, summarization, general feedback and automatic
/// behavior analysis, returning the pipeline outcome when it finishes.
#[utoipa::path(
    post,
    path = "/calls/{id}/process",
    params(
        ApiVersion,
        ("id" = String, Path, description = "Call id to process")
    ),
    request_body = ProcessParams,
    responses(
        (status = 200, description = "Pipeline finished; outcome reports whether the call had analyzable content"),
        (status = 404, description = "Call not found"),
        (status = 422, description = "Call has no audio URL"),
        (status = 502, description = "A provider call failed")
    )
)]
pub async fn process(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    params: Option<Json<ProcessParams>>,
) -> Result<impl IntoResponse, Error> {
    let Json(params) = params.unwrap_or_default();
    debug!("POST process Call {id}");

    let call = CallApi::find_by_id(app_state.db_conn_ref(), id).await?;
    let audio_url = params
        .audio_url
        .or(call.audio_url)
        .ok_or_else(|| domain::error::Error::invalid("The call has no audio URL to process"))?;

    let processor = Processor::from_config(
        &app_state.config,
        Arc::clone(&app_state.database_connection),
    )?;

    let request = ProcessRequest {
        call_id: id,
        audio_url,
        summary_prompt_override: params.summary_prompt_override,
        feedback_prompt_override: params.feedback_prompt_override,
        selected_behavior_ids: params.selected_behavior_ids,
    };

    let outcome = processor.process(request).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), outcome)))
}

/// POST run behavior analysis for a call that already has a transcript.
///
/// Idempotent: once a call's feedback carries evaluations, re-invoking
/// returns the existing record without new model calls.
#[utoipa::path(
    post,
    path = "/calls/{id}/analyze",
    params(
        ApiVersion,
        ("id" = String, Path, description = "Call id to analyze")
    ),
    request_body = AnalyzeParams,
    responses(
        (status = 200, description = "Successfully analyzed the call", body = [domain::feedback::Model]),
        (status = 404, description = "Call not found"),
        (status = 422, description = "No transcript or no active behaviors"),
        (status = 502, description = "A provider call failed")
    )
)]
pub async fn analyze(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    params: Option<Json<AnalyzeParams>>,
) -> Result<impl IntoResponse, Error> {
    let Json(params) = params.unwrap_or_default();
    debug!("POST analyze behaviors for Call {id}");

    let processor = Processor::from_config(
        &app_state.config,
        Arc::clone(&app_state.database_connection),
    )?;

    let feedback = processor.analyze(id, params.selected_behavior_ids).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), feedback)))
}
