//! HBnB API server binary

use anyhow::{Context, Result};
use axum::{extract::Request, ServiceExt};
use hbnb_server::{app, config::ServerConfig, storage, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting HBnB API server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, storage={}",
        config.bind_address(),
        config.type_storage
    );

    let storage = storage::open(&config)
        .await
        .with_context(|| format!("Failed to open {} storage", config.type_storage))?;
    info!(
        "{} storage ready with {} objects",
        storage.name(),
        storage.count(None)
    );

    let router = app(AppState::new(storage));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", config.bind_address());

    axum::serve(listener, ServiceExt::<Request>::into_make_service(router))
        .await
        .context("Server error")?;
    Ok(())
}
