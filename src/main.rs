//! Gateway binary: load configuration, pick a store, serve.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shopify_app_gateway::server::{self, AppState};
use shopify_app_gateway::{
    AppConfig, FileStore, KeyValueStore, LogFormat, MemoryStore, SessionStore, ShopifyHttpClient,
    StoreBackend,
};

const FALLBACK_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is the normal case outside local development.
    let _ = dotenvy::dotenv();

    init_tracing();

    let (router, addr) = match AppConfig::from_env() {
        Ok(config) => {
            let addr = config.listen_addr();
            (build_app(config).await?, addr)
        }
        Err(error) => {
            tracing::error!(%error, "configuration invalid, serving diagnostics only");
            let lookup = |name: &str| std::env::var(name).ok();
            let addr = match lookup("LISTEN_ADDR").and_then(|v| v.trim().parse().ok()) {
                Some(addr) => addr,
                None => FALLBACK_LISTEN_ADDR.parse::<SocketAddr>()?,
            };
            let variables = AppConfig::required_env_status(lookup);
            (server::misconfigured_router(error, variables), addr)
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("gateway listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("gateway stopped");
    Ok(())
}

/// Initializes `tracing` from `RUST_LOG` (default `info`) and `LOG_FORMAT`.
///
/// Read straight from the environment so a broken configuration is still
/// logged in the requested format.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();

    let json_layer = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (format == LogFormat::Pretty).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn build_app(config: AppConfig) -> anyhow::Result<axum::Router> {
    let backend: Arc<dyn KeyValueStore> = match config.store_backend() {
        StoreBackend::File => Arc::new(
            FileStore::open(config.data_dir(), config.table_name().as_ref())
                .await
                .context("failed to open file store")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("memory store selected; sessions are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let platform = Arc::new(
        ShopifyHttpClient::new(&config).context("failed to create HTTP client")?,
    );

    tracing::info!(
        api_version = %config.api_version(),
        verify_state = config.verify_state(),
        backend = ?config.store_backend(),
        "configuration loaded"
    );
    if !config.api_version().is_stable() {
        tracing::warn!(
            api_version = %config.api_version(),
            "API version is not a known stable release"
        );
    }

    let state = AppState::new(Arc::new(config), SessionStore::new(backend), platform);
    Ok(server::router(state))
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
