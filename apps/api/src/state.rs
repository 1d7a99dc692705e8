use std::sync::Arc;

use crate::judging::store::JudgingStore;
use crate::planning::store::PlanStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generated BreakEven plans, bounded by `PLAN_STORE_CAPACITY`.
    pub plans: PlanStore,
    /// InnovateHer records. Postgres when `DATABASE_URL` is set, memory otherwise.
    pub judging: Arc<dyn JudgingStore>,
}
