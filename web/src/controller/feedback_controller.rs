use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{feedback as FeedbackApi, Id};
use service::config::ApiVersion;

use log::*;

/// GET the Feedback record for a Call.
#[utoipa::path(
    get,
    path = "/calls/{id}/feedback",
    params(
        ApiVersion,
        ("id" = String, Path, description = "Call id whose feedback to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Feedback for the Call", body = [domain::feedback::Model]),
        (status = 404, description = "No feedback exists for the Call"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn read_by_call(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Feedback by call id: {id}");

    let feedback = FeedbackApi::find_by_call_id(app_state.db_conn_ref(), id)
        .await?
        .ok_or_else(|| domain::error::Error::not_found())?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), feedback)))
}
