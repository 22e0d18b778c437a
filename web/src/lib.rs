//! Web layer: axum controllers, routing and OpenAPI docs for the
//! call-quality analysis API.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use log::*;
use tower_http::cors::CorsLayer;

pub use self::error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod extractors;
mod params;
mod router;

pub async fn init_server(app_state: AppState) -> Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;
    let server_url = format!("{host}:{port}");

    let listen_addr = server_url.parse::<std::net::SocketAddr>().map_err(|_| {
        Error::from(domain::error::Error::internal(format!(
            "Invalid listen address: {server_url}"
        )))
    })?;

    info!("Server starting... listening for connections on http://{server_url}");

    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| warn!("Ignoring invalid CORS origin '{origin}': {e}"))
                .ok()
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(service::config::X_VERSION),
        ])
        .allow_credentials(true)
        .allow_origin(origins);

    let router = router::define_routes(app_state).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await.map_err(|e| {
        Error::from(domain::error::Error::internal(format!(
            "Failed to bind {server_url}: {e}"
        )))
    })?;

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| {
            Error::from(domain::error::Error::internal(format!(
                "Server terminated: {e}"
            )))
        })?;

    Ok(())
}
