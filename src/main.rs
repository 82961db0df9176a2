use std::sync::Arc;

use tracing::{error, info};

use drive::web::{AppState, WebServer};
use drive::{Config, Database, FileStorage};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = drive::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        drive::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> drive::Result<()> {
    config.validate()?;
    info!("Drive {}", env!("CARGO_PKG_VERSION"));

    let db = Arc::new(Database::open(&config.database.path, config.database.max_connections).await?);
    info!("Database schema version {}", db.schema_version().await?);

    let storage = FileStorage::new(&config.files.storage_path)?;
    info!("Blob storage at {}", config.files.storage_path);

    let state = AppState::new(db.clone(), storage, config.files.max_upload_bytes());
    let server = WebServer::new(&config.server, state)?;
    server.run(shutdown_signal()).await?;

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}
