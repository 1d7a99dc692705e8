pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::judging::handlers as judging;
use crate::planning::handlers as planning;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // BreakEven
        .route("/v1/health", get(planning::handle_health))
        .route("/v1/profile", get(planning::handle_profile))
        .route("/v1/transactions", get(planning::handle_transactions))
        .route("/v1/nessie/connect", post(planning::handle_nessie_connect))
        .route("/v1/plan/generate", post(planning::handle_generate_plan))
        .route("/v1/plan/:plan_id", get(planning::handle_get_plan))
        // InnovateHer
        .route("/api/health", get(judging::handle_health))
        .route(
            "/api/hackathons",
            get(judging::handle_list_hackathons).post(judging::handle_create_hackathon),
        )
        .route(
            "/api/hackathons/:id",
            get(judging::handle_get_hackathon)
                .put(judging::handle_update_hackathon)
                .delete(judging::handle_delete_hackathon),
        )
        .route(
            "/api/hackathons/:id/rubric",
            get(judging::handle_get_rubric).put(judging::handle_update_rubric),
        )
        .route("/api/hackathons/:id/results", get(judging::handle_results))
        .route(
            "/api/hackathons/:id/results.csv",
            get(judging::handle_results_csv),
        )
        .route(
            "/api/projects",
            get(judging::handle_list_projects).post(judging::handle_create_project),
        )
        .route(
            "/api/projects/:id",
            get(judging::handle_get_project)
                .put(judging::handle_update_project)
                .delete(judging::handle_delete_project),
        )
        .route(
            "/api/projects/:id/judges/:judge_id",
            post(judging::handle_assign_judge).delete(judging::handle_unassign_judge),
        )
        .route(
            "/api/projects/:id/scores",
            get(judging::handle_list_scores).post(judging::handle_submit_score),
        )
        .route(
            "/api/judges",
            get(judging::handle_list_judges).post(judging::handle_create_judge),
        )
        .route("/api/judges/unassigned", get(judging::handle_list_unassigned))
        .route(
            "/api/judges/:id",
            get(judging::handle_get_judge)
                .put(judging::handle_update_judge)
                .delete(judging::handle_delete_judge),
        )
        .with_state(state)
}
