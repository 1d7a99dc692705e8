//! Axum route handlers for the BreakEven API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::planning::demo::{
    connect_bank, demo_profile, demo_transactions, spend_by_category, BankConnection, DemoProfile,
    Transaction,
};
use crate::planning::generator::{generate_bundle, PlanBundle, PlanResult};
use crate::planning::rules::{Mode, PlanInput};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub plans_stored: usize,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub mode: Option<Mode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub source: &'static str,
    pub spend_by_category: BTreeMap<String, f64>,
}

/// GET /v1/health
pub async fn handle_health(State(state): State<AppState>) -> Json<PlanningHealth> {
    Json(PlanningHealth {
        status: "ok",
        service: "breakeven-api",
        plans_stored: state.plans.count().await,
    })
}

/// GET /v1/profile
pub async fn handle_profile() -> Json<DemoProfile> {
    Json(demo_profile())
}

/// GET /v1/transactions
///
/// Demo data regardless of mode.
pub async fn handle_transactions(
    Query(params): Query<TransactionsQuery>,
) -> Json<TransactionsResponse> {
    debug!("Serving demo transactions (mode={:?})", params.mode);
    let transactions = demo_transactions();
    let spend_by_category = spend_by_category(&transactions);
    Json(TransactionsResponse {
        transactions,
        source: "demo",
        spend_by_category,
    })
}

/// POST /v1/nessie/connect
pub async fn handle_nessie_connect() -> Json<BankConnection> {
    let connection = connect_bank();
    info!("Simulated bank link {}", connection.account_link_id);
    Json(connection)
}

/// POST /v1/plan/generate
///
/// Generates FAST and STEADY plans from one input and stores both.
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    Json(input): Json<PlanInput>,
) -> Result<Json<PlanBundle>, AppError> {
    input.validate()?;

    let bundle = generate_bundle(&input);
    info!(
        "Generated plans {} ({:.2}/mo) and {} ({:.2}/mo)",
        bundle.fast.plan_id,
        bundle.fast.monthly_savings,
        bundle.steady.plan_id,
        bundle.steady.monthly_savings
    );

    state
        .plans
        .save_bundle([bundle.fast.clone(), bundle.steady.clone()])
        .await;

    Ok(Json(bundle))
}

/// GET /v1/plan/:plan_id
pub async fn handle_get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResult>, AppError> {
    state
        .plans
        .get(&plan_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Plan {plan_id} not found")))
}
