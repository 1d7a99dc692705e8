//! Axum route handlers for the InnovateHer judging API.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::judging::models::{
    Hackathon, HackathonUpdate, Judge, JudgeUpdate, NewHackathon, NewJudge, NewProject, Project,
    ProjectUpdate, Score, ScoreSubmission,
};
use crate::judging::rubric::{validate_rubric, validate_scores, RubricCategory};
use crate::judging::scoring::{build_leaderboard, leaderboard_csv, LeaderboardEntry};
use crate::judging::store::{
    hackathon_not_found, judge_not_found, project_not_found, JudgingStore,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgingHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub store: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub initials: String,
}

impl From<&Judge> for JudgeSummary {
    fn from(judge: &Judge) -> Self {
        Self {
            id: judge.id,
            first_name: judge.first_name.clone(),
            last_name: judge.last_name.clone(),
            email: judge.email.clone(),
            specialty: judge.specialty.clone(),
            initials: judge.initials.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub assigned_judges: Vec<JudgeSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeView {
    #[serde(flatten)]
    pub judge: Judge,
    pub full_name: String,
    pub assigned_project: Option<ProjectSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub hackathon_id: Uuid,
    pub rubric: Vec<RubricCategory>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsQuery {
    pub hackathon_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RubricUpdate {
    pub rubric: Vec<RubricCategory>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lookups
// ────────────────────────────────────────────────────────────────────────────

async fn require_hackathon(store: &dyn JudgingStore, id: Uuid) -> Result<Hackathon, AppError> {
    store
        .get_hackathon(id)
        .await?
        .ok_or_else(|| hackathon_not_found(id))
}

async fn require_project(store: &dyn JudgingStore, id: Uuid) -> Result<Project, AppError> {
    store
        .get_project(id)
        .await?
        .ok_or_else(|| project_not_found(id))
}

async fn require_judge(store: &dyn JudgingStore, id: Uuid) -> Result<Judge, AppError> {
    store
        .get_judge(id)
        .await?
        .ok_or_else(|| judge_not_found(id))
}

async fn project_view(store: &dyn JudgingStore, project: Project) -> Result<ProjectView, AppError> {
    let judges = store.judges_for_project(project.id).await?;
    Ok(ProjectView {
        assigned_judges: judges.iter().map(JudgeSummary::from).collect(),
        project,
    })
}

async fn judge_view(store: &dyn JudgingStore, judge: Judge) -> Result<JudgeView, AppError> {
    let assigned_project = match judge.assigned_project_id {
        Some(project_id) => store
            .get_project(project_id)
            .await?
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name,
                category: p.category,
            }),
        None => None,
    };
    Ok(JudgeView {
        full_name: judge.full_name(),
        judge,
        assigned_project,
    })
}

/// Builds judge views for a list, reading each project once.
async fn judge_views(
    store: &dyn JudgingStore,
    judges: Vec<Judge>,
) -> Result<Vec<JudgeView>, AppError> {
    let projects: HashMap<Uuid, ProjectSummary> = store
        .list_projects(None)
        .await?
        .into_iter()
        .map(|p| {
            (
                p.id,
                ProjectSummary {
                    id: p.id,
                    name: p.name,
                    category: p.category,
                },
            )
        })
        .collect();

    Ok(judges
        .into_iter()
        .map(|judge| JudgeView {
            full_name: judge.full_name(),
            assigned_project: judge
                .assigned_project_id
                .and_then(|id| projects.get(&id).cloned()),
            judge,
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Health
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/health
pub async fn handle_health(State(state): State<AppState>) -> Json<JudgingHealth> {
    Json(JudgingHealth {
        status: "ok",
        service: "innovateher-api",
        store: state.judging.backend(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Hackathons
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/hackathons
pub async fn handle_list_hackathons(
    State(state): State<AppState>,
) -> Result<Json<Vec<Hackathon>>, AppError> {
    Ok(Json(state.judging.list_hackathons().await?))
}

/// POST /api/hackathons
pub async fn handle_create_hackathon(
    State(state): State<AppState>,
    Json(body): Json<NewHackathon>,
) -> Result<(StatusCode, Json<Hackathon>), AppError> {
    let hackathon = body.into_hackathon()?;
    state.judging.insert_hackathon(&hackathon).await?;
    info!("Created hackathon {} ({})", hackathon.id, hackathon.name);
    Ok((StatusCode::CREATED, Json(hackathon)))
}

/// GET /api/hackathons/:id
pub async fn handle_get_hackathon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hackathon>, AppError> {
    Ok(Json(require_hackathon(state.judging.as_ref(), id).await?))
}

/// PUT /api/hackathons/:id
pub async fn handle_update_hackathon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<HackathonUpdate>,
) -> Result<Json<Hackathon>, AppError> {
    let store = state.judging.as_ref();
    let mut hackathon = require_hackathon(store, id).await?;
    body.apply(&mut hackathon)?;
    if !store.update_hackathon(&hackathon).await? {
        return Err(hackathon_not_found(id));
    }
    // re-read so the body carries the stored rubric
    Ok(Json(require_hackathon(store, id).await?))
}

/// DELETE /api/hackathons/:id
pub async fn handle_delete_hackathon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    if !state.judging.delete_hackathon(id).await? {
        return Err(hackathon_not_found(id));
    }
    info!("Deleted hackathon {id}");
    Ok(Message::new("Hackathon deleted successfully"))
}

/// GET /api/hackathons/:id/rubric
pub async fn handle_get_rubric(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RubricCategory>>, AppError> {
    let hackathon = require_hackathon(state.judging.as_ref(), id).await?;
    Ok(Json(hackathon.rubric))
}

/// PUT /api/hackathons/:id/rubric
///
/// Existing scores for categories that disappear are kept but no longer
/// count toward results.
pub async fn handle_update_rubric(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RubricUpdate>,
) -> Result<Json<Vec<RubricCategory>>, AppError> {
    validate_rubric(&body.rubric)?;
    if !state.judging.update_rubric(id, &body.rubric).await? {
        return Err(hackathon_not_found(id));
    }
    info!("Updated rubric of hackathon {id} ({} categories)", body.rubric.len());
    Ok(Json(body.rubric))
}

async fn leaderboard(
    store: &dyn JudgingStore,
    id: Uuid,
) -> Result<(Hackathon, Vec<LeaderboardEntry>), AppError> {
    let hackathon = require_hackathon(store, id).await?;
    let projects = store.list_projects(Some(id)).await?;
    let scores = store.scores_for_hackathon(id).await?;
    let entries = build_leaderboard(&hackathon.rubric, &projects, &scores);
    Ok((hackathon, entries))
}

/// GET /api/hackathons/:id/results
pub async fn handle_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Results>, AppError> {
    let (hackathon, leaderboard) = leaderboard(state.judging.as_ref(), id).await?;
    Ok(Json(Results {
        hackathon_id: hackathon.id,
        rubric: hackathon.rubric,
        leaderboard,
    }))
}

/// GET /api/hackathons/:id/results.csv
pub async fn handle_results_csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (hackathon, leaderboard) = leaderboard(state.judging.as_ref(), id).await?;
    let csv = leaderboard_csv(&hackathon.rubric, &leaderboard);
    let disposition = format!("attachment; filename=\"results-{id}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/projects?hackathonId=
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectsQuery>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let store = state.judging.as_ref();
    let projects = store.list_projects(params.hackathon_id).await?;

    let mut panels: HashMap<Uuid, Vec<JudgeSummary>> = HashMap::new();
    let mut judges = store.list_judges().await?;
    judges.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
    for judge in &judges {
        if let Some(project_id) = judge.assigned_project_id {
            panels.entry(project_id).or_default().push(judge.into());
        }
    }

    Ok(Json(
        projects
            .into_iter()
            .map(|project| ProjectView {
                assigned_judges: panels.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect(),
    ))
}

/// POST /api/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    Json(body): Json<NewProject>,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let project = body.into_project()?;
    state.judging.insert_project(&project).await?;
    info!("Created project {} ({})", project.id, project.name);
    Ok((
        StatusCode::CREATED,
        Json(ProjectView {
            project,
            assigned_judges: Vec::new(),
        }),
    ))
}

/// GET /api/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let store = state.judging.as_ref();
    let project = require_project(store, id).await?;
    Ok(Json(project_view(store, project).await?))
}

/// PUT /api/projects/:id
///
/// `assignedJudges`, when present, replaces the whole panel; listed judges
/// are moved off any other project.
pub async fn handle_update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProjectUpdate>,
) -> Result<Json<ProjectView>, AppError> {
    let store = state.judging.as_ref();
    let mut project = require_project(store, id).await?;
    body.apply(&mut project)?;

    if let Some(judge_ids) = &body.assigned_judges {
        store.set_project_judges(id, judge_ids).await?;
        info!("Replaced panel of project {id} ({} judges)", judge_ids.len());
    }
    if !store.update_project(&project).await? {
        return Err(project_not_found(id));
    }

    Ok(Json(project_view(store, project).await?))
}

/// DELETE /api/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    if !state.judging.delete_project(id).await? {
        return Err(project_not_found(id));
    }
    info!("Deleted project {id}");
    Ok(Message::new("Project deleted successfully"))
}

/// POST /api/projects/:id/judges/:judge_id
pub async fn handle_assign_judge(
    State(state): State<AppState>,
    Path((id, judge_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProjectView>, AppError> {
    let store = state.judging.as_ref();
    match store.assign_judge(id, judge_id).await? {
        Some(previous) => info!("Moved judge {judge_id} from project {previous} to {id}"),
        None => info!("Assigned judge {judge_id} to project {id}"),
    }
    let project = require_project(store, id).await?;
    Ok(Json(project_view(store, project).await?))
}

/// DELETE /api/projects/:id/judges/:judge_id
pub async fn handle_unassign_judge(
    State(state): State<AppState>,
    Path((id, judge_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProjectView>, AppError> {
    let store = state.judging.as_ref();
    if store.unassign_judge(id, judge_id).await? {
        info!("Removed judge {judge_id} from project {id}");
    }
    let project = require_project(store, id).await?;
    Ok(Json(project_view(store, project).await?))
}

/// GET /api/projects/:id/scores
pub async fn handle_list_scores(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Score>>, AppError> {
    let store = state.judging.as_ref();
    require_project(store, id).await?;
    Ok(Json(store.scores_for_project(id).await?))
}

/// POST /api/projects/:id/scores
///
/// Only a judge currently on the project's panel may score it.
pub async fn handle_submit_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ScoreSubmission>,
) -> Result<(StatusCode, Json<Score>), AppError> {
    let store = state.judging.as_ref();
    let project = require_project(store, id).await?;
    let judge = require_judge(store, body.judge_id).await?;
    if judge.assigned_project_id != Some(project.id) {
        warn!("Judge {} tried to score project {id} without being assigned", judge.id);
        return Err(AppError::Validation(format!(
            "{} is not assigned to this project",
            judge.full_name()
        )));
    }

    let hackathon = require_hackathon(store, project.hackathon_id).await?;
    validate_scores(&hackathon.rubric, &body.scores)?;

    // the store re-checks the panel when it writes
    let score = body.into_score(id);
    store.upsert_score(&score).await?;
    info!("Judge {} scored project {id}", score.judge_id);
    Ok((StatusCode::CREATED, Json(score)))
}

// ────────────────────────────────────────────────────────────────────────────
// Judges
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/judges
pub async fn handle_list_judges(
    State(state): State<AppState>,
) -> Result<Json<Vec<JudgeView>>, AppError> {
    let store = state.judging.as_ref();
    let judges = store.list_judges().await?;
    Ok(Json(judge_views(store, judges).await?))
}

/// GET /api/judges/unassigned
pub async fn handle_list_unassigned(
    State(state): State<AppState>,
) -> Result<Json<Vec<JudgeView>>, AppError> {
    let judges = state.judging.list_unassigned_judges().await?;
    Ok(Json(
        judges
            .into_iter()
            .map(|judge| JudgeView {
                full_name: judge.full_name(),
                judge,
                assigned_project: None,
            })
            .collect(),
    ))
}

/// POST /api/judges
pub async fn handle_create_judge(
    State(state): State<AppState>,
    Json(body): Json<NewJudge>,
) -> Result<(StatusCode, Json<JudgeView>), AppError> {
    let judge = body.into_judge()?;
    state.judging.insert_judge(&judge).await?;
    info!("Created judge {} <{}>", judge.id, judge.email);
    Ok((
        StatusCode::CREATED,
        Json(JudgeView {
            full_name: judge.full_name(),
            judge,
            assigned_project: None,
        }),
    ))
}

/// GET /api/judges/:id
pub async fn handle_get_judge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JudgeView>, AppError> {
    let store = state.judging.as_ref();
    let judge = require_judge(store, id).await?;
    Ok(Json(judge_view(store, judge).await?))
}

/// PUT /api/judges/:id
pub async fn handle_update_judge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<JudgeUpdate>,
) -> Result<Json<JudgeView>, AppError> {
    let store = state.judging.as_ref();
    let mut judge = require_judge(store, id).await?;
    body.apply(&mut judge)?;
    if !store.update_judge_profile(&judge).await? {
        return Err(judge_not_found(id));
    }
    // re-read so the view reflects the stored assignment
    let judge = require_judge(store, id).await?;
    Ok(Json(judge_view(store, judge).await?))
}

/// DELETE /api/judges/:id
pub async fn handle_delete_judge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    if !state.judging.delete_judge(id).await? {
        return Err(judge_not_found(id));
    }
    info!("Deleted judge {id}");
    Ok(Message::new("Judge deleted successfully"))
}
