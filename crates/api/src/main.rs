use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use api::{AppState, build_router};
use services::{AppServices, Clock, Collaborators};

#[derive(Parser, Debug)]
#[command(name = "interview-api")]
#[command(about = "Interview practice backend")]
#[command(version)]
struct Args {
    /// SQLite connection string
    #[arg(long, default_value = "sqlite://interviews.db?mode=rwc", env = "INTERVIEW_DB_URL")]
    database_url: String,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080", env = "INTERVIEW_BIND_ADDR")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Starting interview-api v{}", env!("CARGO_PKG_VERSION"));

    let collaborators = Collaborators::from_env();
    let services = AppServices::new_sqlite(&args.database_url, Clock::system(), collaborators)
        .await
        .with_context(|| format!("opening database {}", args.database_url))?;

    let app = build_router(AppState::new(services));

    info!(addr = %args.bind, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
