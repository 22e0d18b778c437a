use config::Config;
use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// Opens the Postgres connection pool with the tuning values from `Config`.
/// All queries run against the `call_qa` schema.
pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    Database::connect(pool_options(config)).await
}

fn pool_options(config: &Config) -> ConnectOptions {
    info!(
        "Database pool: max={} min={} connect_timeout={}s acquire_timeout={}s \
         idle_timeout={}s max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let mut options = ConnectOptions::new::<&str>(config.database_url());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Info)
        .set_schema_search_path("call_qa");

    options
}

/// Infrastructure state shared with the router. Clone is required by axum's
/// State extractor; the pool itself is behind an Arc so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, db: &Arc<DatabaseConnection>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}
