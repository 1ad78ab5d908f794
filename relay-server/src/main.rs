//! upload-relay binary entry point.
//!
//! Usage:
//! ```bash
//! SUPABASE_URL=https://xyz.supabase.co upload-relay
//! upload-relay --config relay.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upload_relay_server::config::Config;
use upload_relay_server::http::health::init_start_time;
use upload_relay_server::server::{serve, UploadRelay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = get_config_path();
    let config = Config::load(config_path.as_deref())?;
    tracing::info!(
        "upload-relay v{} relaying to bucket {}",
        env!("CARGO_PKG_VERSION"),
        config.destination.bucket
    );

    init_start_time();
    let relay = Arc::new(UploadRelay::from_config(config)?);
    serve(relay, shutdown_signal()).await?;
    Ok(())
}

fn get_config_path() -> Option<PathBuf> {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
