use std::sync::Arc;

use prefecture_fortune::api::{self, AppState};
use prefecture_fortune::config::{AppConfig, LogFormat};
use prefecture_fortune::metrics::Metrics;
use prefecture_fortune::state::ProfileStore;
use prefecture_fortune::{FortuneClient, ImageCache, ImageClient};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // A missing image search key is fatal here, before anything is served.
    let cfg = AppConfig::from_env()?;
    init_tracing(cfg.log_format);

    let metrics = Metrics::new()?;
    let image_cache = ImageCache::new();
    let fortune_api = FortuneClient::try_new(cfg.fortune_api.clone(), metrics.clone())?;
    let images = ImageClient::try_new(
        cfg.image_search.clone(),
        image_cache.clone(),
        metrics.clone(),
    )?;

    let profiles = ProfileStore::new();
    if cfg.seed_sample_profiles {
        let seeded = profiles.seed_samples().await;
        tracing::info!(seeded, "seeded sample profiles");
    }

    let state = AppState::new(
        profiles,
        Arc::new(fortune_api),
        Arc::new(images),
        image_cache,
        metrics,
    );

    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listen_addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    tracing::info!(
        %listen_addr,
        fortune_api = %cfg.fortune_api.base_url,
        "starting prefecture fortune service"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("prefecture fortune service exited cleanly");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term_signal) => term_signal.recv().await,
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                None
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
