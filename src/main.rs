use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use realtydesk::backend::BackendFactory;
use realtydesk::backend::firebase::FirebaseBackend;
use realtydesk::backend::memory::MemoryBackend;
use realtydesk::config::{BackendConfig, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting RealtyDesk");

    let backends: Arc<dyn BackendFactory> = match &config.backend {
        BackendConfig::Firebase(firebase) => Arc::new(FirebaseBackend::new(firebase.clone())?),
        BackendConfig::Memory => {
            tracing::warn!("Using the in-memory backend; data is lost on restart");
            Arc::new(MemoryBackend::new())
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let state = realtydesk::build_state(backends, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = realtydesk::sweeper::spawn(state.clone(), shutdown_rx);

    let app = realtydesk::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
