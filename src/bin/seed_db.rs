use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

/// Seeds a development database with a demo account, the default behavior
/// set and example prompts. Not intended for production databases.
#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Seeding database [{}] with demo data...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    entity_api::seed_database(db.as_ref()).await;

    info!("Seeding complete");
}
