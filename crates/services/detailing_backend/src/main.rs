// File: crates/services/detailing_backend/src/main.rs
mod app;

use detailing_admin::SessionGuard;
use detailing_common::{Context, DetailingError};
use detailing_config::load_config;
use detailing_square::{SquareApi, SquareClient};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), DetailingError> {
    let config = load_config().context("Failed to load config")?;

    // Keeps the file writer flushing until shutdown.
    let _log_guard = match config.server.log_dir.as_deref() {
        Some(dir) => Some(detailing_common::init_with_file(Level::INFO, Path::new(dir), "detailing")),
        None => {
            detailing_common::init();
            None
        }
    };
    info!("Starting detailing backend in {:?} mode", config.run_mode);

    let square: Arc<dyn SquareApi> = Arc::new(SquareClient::from_config(&config.square)?);
    let guard = Arc::new(SessionGuard::from_config(&config));
    let app = app::build_router(&config, square, guard)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
