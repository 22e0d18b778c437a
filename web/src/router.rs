use crate::{controller::health_check_controller, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::controller::{
    behavior_controller, call_controller, feedback_controller, upload_controller,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Call Quality Analysis API"
        ),
        paths(
            behavior_controller::index,
            behavior_controller::create,
            behavior_controller::update,
            call_controller::index,
            call_controller::read,
            call_controller::process,
            call_controller::analyze,
            feedback_controller::read_by_call,
            upload_controller::create,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::accounts::Model,
                domain::behaviors::Model,
                domain::calls::Model,
                domain::prompts::Model,
                domain::feedback::Model,
            )
        ),
        tags(
            (name = "call_qa_platform", description = "Call Quality Analysis & Feedback API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(behavior_routes(app_state.clone()))
        .merge(call_routes(app_state.clone()))
        .merge(health_routes())
        .merge(upload_routes(app_state.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(static_routes())
}

fn behavior_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/behaviors", get(behavior_controller::index))
        .route("/behaviors", post(behavior_controller::create))
        .route("/behaviors/{id}", put(behavior_controller::update))
        .with_state(app_state)
}

fn call_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/calls", get(call_controller::index))
        .route("/calls/{id}", get(call_controller::read))
        .route("/calls/{id}/process", post(call_controller::process))
        .route("/calls/{id}/analyze", post(call_controller::analyze))
        .route("/calls/{id}/feedback", get(feedback_controller::read_by_call))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn upload_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/accounts/{account_id}/uploads",
            post(upload_controller::create),
        )
        .with_state(app_state)
}

// This will serve static files that we can use as a "fallback" for when the server panics
pub fn static_routes() -> Router {
    Router::new().nest_service("/", ServeDir::new("./"))
}
