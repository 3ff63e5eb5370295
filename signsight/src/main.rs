use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use signsight::api::{create_router, AppState};
use signsight::config::{log_json_from_env, Config};
use signsight::ocr::OcrProvider;
use signsight::recognition::{LocalEngine, RecognitionBackend, RemoteEngine};

#[derive(Parser)]
#[command(name = "signsight")]
#[command(about = "Reads signage and transcribes voice commands for accessible navigation")]
struct Args {
    /// Bind host (overrides SIGNSIGHT_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SIGNSIGHT_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Settings file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let fmt_layer = if log_json_from_env() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signsight=info,tower_http=debug".into()),
        )
        .with(fmt_layer)
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing offline OCR ({})...", config.ocr.languages);
    let ocr = OcrProvider::new(&config.ocr);
    if !ocr.is_available() {
        tracing::warn!("Offline OCR unavailable - /api/ocr will answer 501");
    }
    let offline: Arc<dyn RecognitionBackend> = Arc::new(LocalEngine::new(ocr));

    tracing::info!(
        "Initializing remote model: {} ({:?} audio)...",
        config.remote.model,
        config.remote.audio_mode
    );
    if config.remote.api_key.is_none() {
        tracing::warn!(
            "GENAI_API_KEY is not set - /api/analyze_sign and /api/transcribe will fail until it is configured"
        );
    }
    let cloud: Arc<dyn RecognitionBackend> = Arc::new(RemoteEngine::new(&config.remote)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, offline, cloud);
    let app = create_router(state);

    tracing::info!("Signsight starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, stopping server...");
}
