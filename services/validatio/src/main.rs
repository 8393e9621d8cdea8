use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use kv::FileBackedStorage;
use validatio::config::AppConfig;
use validatio::object_store::S3Client;
use validatio::provider::KippProvider;
use validatio::provider_placeholder::PlaceholderProvider;
use validatio::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let storage = FileBackedStorage::new(&cfg.data_path)
        .with_context(|| format!("Failed to open store at {}", cfg.data_path.display()))?;
    let objects = S3Client::from_config(&cfg);
    if let Err(e) = check_s3_http(&cfg.s3_endpoint).await {
        warn!(error = %format!("{e:#}"), "startup: S3 endpoint not reachable; uploads will fail");
    }
    let kipp = PlaceholderProvider::new();
    info!(
        data_path = %cfg.data_path.display(),
        bucket = %cfg.s3_bucket,
        provider = %kipp.info().name,
        "startup: ok"
    );

    let app_state = Arc::new(AppState::new(
        cfg.clone(),
        Box::new(storage),
        Arc::new(objects),
        Arc::new(kipp),
    ));
    let app = validatio::build_router(app_state);

    let addr = &cfg.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("validatio listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Any HTTP answer counts; only transport errors fail.
async fn check_s3_http(base: &str) -> Result<()> {
    let resp = reqwest::get(base).await.context("S3 endpoint request failed")?;
    info!(status = %resp.status(), "s3: endpoint reachable");
    Ok(())
}
