//! # Workflows API Main Entry Point
//!
//! This is the main entry point for the Workflows API service.

use migration::{Migrator, MigratorTrait};
use workflows::{config::ConfigLoader, db, seeds, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!("Configuration: {}", redacted_json);
    }

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;
    seeds::seed_compliance_rules(&db).await?;

    // Start the server with the loaded configuration
    run_server(config, db).await
}
