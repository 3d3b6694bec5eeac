// sitewright-engine: standalone mode entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use sitewright_engine::config::EngineConfig;
use sitewright_engine::rpc::methods::EngineState;
use sitewright_engine::rpc::ws;
use sitewright_engine::store::DiskStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let project_root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = EngineConfig::load(&project_root).context("failed to load engine config")?;

    let store = Arc::new(DiskStore::with_extensions(
        config.project_root.clone(),
        config.source_extensions.clone(),
    ));
    let state = EngineState::new(store, config.upload_dir.clone(), config.upload_stale_secs);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, root = %config.project_root.display(), "sitewright engine started");

    ws::serve(listener, state).await.context("engine terminated unexpectedly")
}
