mod config;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use envconfig::Envconfig;
use quorum_api::{HttpApi, ServiceAdapter};
use quorum_core::LabelingService;
use quorum_observe::logger_init;
use quorum_prometheus::PrometheusMetrics;
use quorum_store::{MemoryStore, RedbStore, SeedLoader, Store};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Environment
    dotenvy::dotenv().ok();
    let cfg = AppConfig::init_from_env().context("failed to read configuration")?;

    // 2) Logger
    logger_init(&cfg.logger())?;
    info!("logger initialized");
    debug!("configuration:\n{cfg}");

    // 3) Store
    let store: Arc<dyn Store> = match cfg.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Redb => Arc::new(
            RedbStore::open(&cfg.store_path)
                .with_context(|| format!("failed to open {}", cfg.store_path.display()))?,
        ),
    };
    info!(backend = ?cfg.store_backend, "store ready");

    if let Some(dir) = &cfg.seed_dir {
        let items = SeedLoader::load(dir, store.as_ref())
            .await
            .with_context(|| format!("failed to seed from {}", dir.display()))?;
        info!(items, dir = %dir.display(), "store seeded");
    }

    // 4) Service
    let metrics = PrometheusMetrics::new()?;
    let service = LabelingService::with_metrics(store, cfg.core(), Arc::new(metrics.clone()))?;
    let handler = Arc::new(ServiceAdapter::new(Arc::new(service)));

    // 5) Router
    let app = HttpApi::new(handler, cfg.dispatch()).router().merge(
        Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(metrics),
    );

    // 6) Serve
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutting down...");

    Ok(())
}

/// GET /metrics
async fn serve_metrics(State(metrics): State<PrometheusMetrics>) -> Response {
    match metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
    info!("ctrl-c received");
}
