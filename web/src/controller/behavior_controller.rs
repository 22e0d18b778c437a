use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::behavior::IndexParams;
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{behavior as BehaviorApi, behaviors::Model, Id};
use service::config::ApiVersion;

use log::*;

/// GET all Behaviors visible to an account.
///
/// Includes the account's own behaviors and the global catalog rows
/// that are not bound to any account.
#[utoipa::path(
    get,
    path = "/behaviors",
    params(ApiVersion, IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved all Behaviors for the account", body = [domain::behaviors::Model]),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Behaviors for account: {}", params.account_id);

    let behaviors =
        BehaviorApi::find_for_account(app_state.db_conn_ref(), params.account_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), behaviors)))
}

/// CREATE a new Behavior.
#[utoipa::path(
    post,
    path = "/behaviors",
    params(ApiVersion),
    request_body = domain::behaviors::Model,
    responses(
        (status = 201, description = "Successfully created a new Behavior", body = [domain::behaviors::Model]),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Json(behavior_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new Behavior: {behavior_model:?}");

    let behavior = BehaviorApi::create(app_state.db_conn_ref(), behavior_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), behavior)))
}

/// UPDATE a Behavior specified by its id.
#[utoipa::path(
    put,
    path = "/behaviors/{id}",
    params(
        ApiVersion,
        ("id" = String, Path, description = "Behavior id to update")
    ),
    request_body = domain::behaviors::Model,
    responses(
        (status = 200, description = "Successfully updated the Behavior", body = [domain::behaviors::Model]),
        (status = 404, description = "Behavior not found"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(behavior_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("UPDATE Behavior with id: {id}");

    let behavior = BehaviorApi::update(app_state.db_conn_ref(), id, behavior_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), behavior)))
}
