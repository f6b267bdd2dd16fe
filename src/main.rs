//! places-rs: place autocomplete server
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use clap::Parser;
use places_rs::{
    config::{self, Settings},
    network::HttpClient,
    service::HttpPlacesService,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "places-rs",
    version,
    about = "Place autocomplete and place details server",
    after_help = "Settings are also read from PLACES_SETTINGS_PATH and overridden by PLACES_* \
                  environment variables. Log filtering follows RUST_LOG (default: info)."
)]
struct Args {
    /// Path to configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting places-rs v{}", places_rs::VERSION);

    // Load configuration
    let settings = match args.config {
        Some(path) => {
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            settings
        }
        None => config::load()?,
    };
    info!("Loaded configuration for instance: {}", settings.general.instance_name);
    config::init(settings)?;
    let settings = config::get().context("settings not initialized")?;

    // Initialize HTTP client and service
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let service = HttpPlacesService::new(client, &settings.service)?;
    info!("Using places service at {}", settings.service.base_url);

    // Create application state and connect
    let state = AppState::new(settings.clone(), Arc::new(service));
    state.connection.connect().await;
    if !state.connection.is_connected() {
        warn!(
            "Service connection is {}; requests will be rejected",
            state.connection.state()
        );
    }

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
