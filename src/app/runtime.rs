//! Service wiring and the serve loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use audio_fetch_core::{
    AppState, ArtifactStreamer, AudioService, Escalator, FileStore, LocalFileStore, YtDlpClient,
    router,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::ServerConfig;

/// Builds shared state from resolved settings.
pub(crate) async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());

    for dir in [&config.downloads_dir, &config.scratch_dir] {
        store
            .ensure_dir(dir)
            .await
            .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
    }

    let client = YtDlpClient::new(
        config.extractor.clone(),
        config.attempt_timeout,
        config.scratch_dir.clone(),
        Arc::clone(&store),
    );
    let service = AudioService::new(
        Arc::new(client),
        Arc::clone(&store),
        Escalator::new(config.max_attempts),
        config.downloads_dir.clone(),
    );
    let streamer = ArtifactStreamer::new(store, config.cleanup_grace, config.artifact_max_lifetime);

    Ok(AppState::new(Arc::new(service), streamer))
}

/// Binds, serves until Ctrl-C, then drains in-flight requests.
pub(crate) async fn serve(config: ServerConfig) -> Result<()> {
    let state = build_state(&config).await?;
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(
        addr = %listener.local_addr().unwrap_or(config.bind),
        downloads_dir = %config.downloads_dir.display(),
        extractor = %config.extractor.display(),
        max_attempts = config.max_attempts,
        "audio-fetch listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("audio-fetch stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
