//! Idea Inbox — Binary Entrypoint
//! Boots the Axum HTTP server: config, tracing, store, adapters, routes.

use anyhow::{Context, Result};
use idea_inbox::api::{self, AppState};
use idea_inbox::config::{AppConfig, LogFormat};
use idea_inbox::ingest::providers::{build_adapter, http_client};
use idea_inbox::ingest::Ingestor;
use idea_inbox::metrics::Metrics;
use idea_inbox::store::build_store;
use idea_inbox::Source;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("idea_inbox=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let cfg = AppConfig::load()?;
    init_tracing(cfg.log_format);

    let http = http_client(&cfg.http)?;
    let store = build_store(&cfg.store, http.clone())?;
    let ingestor = Ingestor::new(store, cfg.ingest.max_attempts, cfg.ingest.backoff());

    if cfg.providers.producthunt_api_key.is_none() {
        tracing::warn!("PH_API_KEY is not set; Product Hunt ingestion will report fetch errors");
    }
    let adapters = Source::ALL
        .into_iter()
        .map(|s| build_adapter(s, http.clone(), &cfg.providers, cfg.owner.clone()))
        .collect();

    let mut app = api::router(AppState::new(ingestor, adapters));
    match Metrics::init() {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "metrics disabled"),
    }

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "idea inbox listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
