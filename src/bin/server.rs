#![forbid(unsafe_code)]

//! HTTP entry point: resolves configuration, then serves the frontend page and
//! `/api/videos` until Ctrl+C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use channel_extractor::api::{AppState, router};
use channel_extractor::config::{API_KEY_VAR, RuntimeOverrides, resolve_runtime_settings};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "channel-extractor")]
#[command(about = "Serve a YouTube channel video lister over HTTP")]
#[command(version)]
struct ServerArgs {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Path of the .env file to read
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = ServerArgs::parse();
    let settings = resolve_runtime_settings(RuntimeOverrides {
        port: args.port,
        host: args.host,
        env_path: args.env_file,
    })?;

    if settings.youtube_api_key.is_none() {
        warn!("{API_KEY_VAR} is not set; /api/videos will answer with an error");
    }

    let addr = settings.listen_addr()?;
    let app = router(AppState::from_settings(&settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", err);
    }
}
