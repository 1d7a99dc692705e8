mod config;
mod db;
mod errors;
mod judging;
mod models;
mod planning;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{apply_schema, create_pool};
use crate::judging::pg_store::PgStore;
use crate::judging::store::{JudgingStore, MemoryStore};
use crate::planning::store::PlanStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BreakEven / InnovateHer API v{}", env!("CARGO_PKG_VERSION"));

    let judging = build_judging_store(&config).await?;
    info!("Judging store: {}", judging.backend());

    let plans = PlanStore::new(config.plan_store_capacity);
    info!("Plan store capacity: {}", config.plan_store_capacity);

    let state = AppState { plans, judging };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres when `DATABASE_URL` is set, in-process memory otherwise.
async fn build_judging_store(config: &Config) -> Result<Arc<dyn JudgingStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            apply_schema(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; judging records are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
