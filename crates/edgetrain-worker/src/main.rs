//! edgetrain worker.
//!
//! Usage: `edgetrain-worker [CONFIG]`. The config path may also come from
//! `EDGETRAIN_CONFIG`; without either, built-in defaults apply. Secrets and
//! the database path are overlaid from the environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use edgetrain_core::config::EdgeTrainConfig;
use edgetrain_core::constants::VERSION;
use edgetrain_observability::init_tracing_from_config;
use edgetrain_orchestrator::EdgeTrainEngine;
use edgetrain_remote::{HttpClientConfig, HttpTrainingClient, VirtualDeviceClient};
use edgetrain_storage::StorageEngine;

const CONFIG_ENV_VAR: &str = "EDGETRAIN_CONFIG";

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EdgeTrainConfig> {
    let mut config = match path {
        Some(path) => EdgeTrainConfig::load(path)?,
        None => EdgeTrainConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn build_engine(config: &EdgeTrainConfig) -> anyhow::Result<EdgeTrainEngine> {
    let store = StorageEngine::open_with_config(Path::new(&config.storage.db_path), &config.storage)
        .with_context(|| format!("opening database {}", config.storage.db_path))?;
    let client = Arc::new(
        HttpTrainingClient::new(&config.remote).context("building training platform client")?,
    );

    let mut builder = EdgeTrainEngine::builder(Arc::new(store), client.clone())
        .config(config.training.clone())
        .uploader(client);
    let retry = HttpClientConfig::from(&config.remote);
    if let Some(source) = VirtualDeviceClient::from_config(&config.virtual_device, &retry)
        .context("building virtual device client")?
    {
        builder = builder.virtual_device(Arc::new(source));
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let config = load_config(path.as_deref())?;
    init_tracing_from_config(&config.observability);
    tracing::info!(
        version = VERSION,
        config = %path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "defaults".into()),
        db_path = %config.storage.db_path,
        threshold = config.training.threshold,
        poll_interval_secs = config.training.poll_interval_secs,
        "edgetrain worker starting"
    );

    let engine = tokio::task::spawn_blocking({
        let config = config.clone();
        move || build_engine(&config)
    })
    .await??;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(engine.poller().run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutdown requested");
    // Receivers may already be gone if the poller exited on its own.
    let _ = shutdown_tx.send(true);
    poller.await.context("poller task failed")?;

    let metrics = engine.metrics();
    tracing::info!(
        poll_cycles = metrics.poll_cycles,
        jobs_deployed = metrics.jobs_deployed,
        jobs_failed = metrics.jobs_failed,
        "edgetrain worker stopped"
    );
    Ok(())
}
