//! Judging Store: pluggable persistence for hackathons, projects, judges and scores.
//!
//! `MemoryStore` keeps everything in process and serialises every mutation
//! under one write lock. `PgStore` (see `pg_store`) is used when
//! `DATABASE_URL` is set.
//!
//! `AppState` holds an `Arc<dyn JudgingStore>`, chosen at startup.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::judging::models::{Hackathon, Judge, Project, Score};
use crate::judging::rubric::RubricCategory;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Assignment invariant every backend upholds: a judge is on at most one
/// project, and moving them is a single atomic step.
#[async_trait]
pub trait JudgingStore: Send + Sync {
    /// Short label for health output.
    fn backend(&self) -> &'static str;

    async fn insert_hackathon(&self, hackathon: &Hackathon) -> Result<(), AppError>;
    /// Newest first.
    async fn list_hackathons(&self) -> Result<Vec<Hackathon>, AppError>;
    async fn get_hackathon(&self, id: Uuid) -> Result<Option<Hackathon>, AppError>;
    /// Writes the hackathon's own fields; the rubric is left as stored.
    /// Returns `false` when the hackathon does not exist.
    async fn update_hackathon(&self, hackathon: &Hackathon) -> Result<bool, AppError>;
    /// Replaces the rubric only. Returns `false` when the hackathon does not exist.
    async fn update_rubric(&self, id: Uuid, rubric: &[RubricCategory]) -> Result<bool, AppError>;
    /// Also deletes its projects (and with them their scores).
    async fn delete_hackathon(&self, id: Uuid) -> Result<bool, AppError>;

    /// Fails with `NotFound` when the hackathon does not exist.
    async fn insert_project(&self, project: &Project) -> Result<(), AppError>;
    /// Oldest first, so ranking ties follow submission order.
    async fn list_projects(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Project>, AppError>;
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, AppError>;
    /// Writes the project's own fields. Panels are untouched.
    async fn update_project(&self, project: &Project) -> Result<bool, AppError>;
    /// Releases the project's judges and drops its scores.
    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_judge(&self, judge: &Judge) -> Result<(), AppError>;
    /// Newest first.
    async fn list_judges(&self) -> Result<Vec<Judge>, AppError>;
    async fn list_unassigned_judges(&self) -> Result<Vec<Judge>, AppError>;
    async fn get_judge(&self, id: Uuid) -> Result<Option<Judge>, AppError>;
    /// Writes profile fields only; the assignment is left as stored.
    async fn update_judge_profile(&self, judge: &Judge) -> Result<bool, AppError>;
    /// Drops the judge's scores too.
    async fn delete_judge(&self, id: Uuid) -> Result<bool, AppError>;

    async fn judges_for_project(&self, project_id: Uuid) -> Result<Vec<Judge>, AppError>;
    /// Moves the judge onto the project. Returns the project they left, if any.
    async fn assign_judge(&self, project_id: Uuid, judge_id: Uuid)
        -> Result<Option<Uuid>, AppError>;
    /// Returns `false` when the judge was not on this project.
    async fn unassign_judge(&self, project_id: Uuid, judge_id: Uuid) -> Result<bool, AppError>;
    /// Replaces the project's panel. All-or-nothing.
    async fn set_project_judges(&self, project_id: Uuid, judge_ids: &[Uuid])
        -> Result<(), AppError>;

    /// Inserts or replaces the (project, judge) scorecard. Fails with
    /// `Validation` unless the judge is on the project's panel at write time.
    async fn upsert_score(&self, score: &Score) -> Result<(), AppError>;
    async fn scores_for_project(&self, project_id: Uuid) -> Result<Vec<Score>, AppError>;
    async fn scores_for_hackathon(&self, hackathon_id: Uuid) -> Result<Vec<Score>, AppError>;
}

pub(crate) fn project_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Project {id} not found"))
}

pub(crate) fn judge_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Judge {id} not found"))
}

pub(crate) fn hackathon_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Hackathon {id} not found"))
}

pub(crate) fn not_on_panel(project_id: Uuid, judge_id: Uuid) -> AppError {
    AppError::Validation(format!(
        "Judge {judge_id} is not assigned to project {project_id}"
    ))
}

/// Removes duplicate ids, keeping first occurrence.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    hackathons: HashMap<Uuid, Hackathon>,
    projects: HashMap<Uuid, Project>,
    judges: HashMap<Uuid, Judge>,
    scores: HashMap<(Uuid, Uuid), Score>,
}

impl Tables {
    fn remove_project(&mut self, id: Uuid) -> bool {
        if self.projects.remove(&id).is_none() {
            return false;
        }
        let now = Utc::now();
        for judge in self.judges.values_mut() {
            if judge.assigned_project_id == Some(id) {
                judge.assigned_project_id = None;
                judge.updated_at = now;
            }
        }
        self.scores.retain(|(project_id, _), _| *project_id != id);
        true
    }
}

/// In-process store. One lock guards all tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl JudgingStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_hackathon(&self, hackathon: &Hackathon) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.hackathons.insert(hackathon.id, hackathon.clone());
        Ok(())
    }

    async fn list_hackathons(&self) -> Result<Vec<Hackathon>, AppError> {
        let tables = self.tables.read().await;
        let mut hackathons: Vec<_> = tables.hackathons.values().cloned().collect();
        newest_first(&mut hackathons, |h| (h.created_at, h.id));
        Ok(hackathons)
    }

    async fn get_hackathon(&self, id: Uuid) -> Result<Option<Hackathon>, AppError> {
        Ok(self.tables.read().await.hackathons.get(&id).cloned())
    }

    async fn update_hackathon(&self, hackathon: &Hackathon) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.hackathons.get_mut(&hackathon.id) else {
            return Ok(false);
        };
        existing.name = hackathon.name.clone();
        existing.description = hackathon.description.clone();
        existing.start_date = hackathon.start_date;
        existing.end_date = hackathon.end_date;
        existing.status = hackathon.status;
        existing.updated_at = hackathon.updated_at;
        Ok(true)
    }

    async fn update_rubric(&self, id: Uuid, rubric: &[RubricCategory]) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.hackathons.get_mut(&id) else {
            return Ok(false);
        };
        existing.rubric = rubric.to_vec();
        existing.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_hackathon(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.hackathons.remove(&id).is_none() {
            return Ok(false);
        }
        let project_ids: Vec<Uuid> = tables
            .projects
            .values()
            .filter(|p| p.hackathon_id == id)
            .map(|p| p.id)
            .collect();
        for project_id in project_ids {
            tables.remove_project(project_id);
        }
        Ok(true)
    }

    async fn insert_project(&self, project: &Project) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.hackathons.contains_key(&project.hackathon_id) {
            return Err(hackathon_not_found(project.hackathon_id));
        }
        tables.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn list_projects(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<_> = tables
            .projects
            .values()
            .filter(|p| hackathon_id.map_or(true, |h| p.hackathon_id == h))
            .cloned()
            .collect();
        projects.sort_by_key(|p| (p.created_at, p.id));
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn update_project(&self, project: &Project) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.projects.get_mut(&project.id) {
            Some(existing) => {
                *existing = project.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.remove_project(id))
    }

    async fn insert_judge(&self, judge: &Judge) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.judges.values().any(|j| j.email == judge.email) {
            return Err(AppError::Conflict(format!(
                "A judge with email {} already exists",
                judge.email
            )));
        }
        tables.judges.insert(judge.id, judge.clone());
        Ok(())
    }

    async fn list_judges(&self) -> Result<Vec<Judge>, AppError> {
        let tables = self.tables.read().await;
        let mut judges: Vec<_> = tables.judges.values().cloned().collect();
        newest_first(&mut judges, |j| (j.created_at, j.id));
        Ok(judges)
    }

    async fn list_unassigned_judges(&self) -> Result<Vec<Judge>, AppError> {
        let mut judges = self.list_judges().await?;
        judges.retain(|j| j.assigned_project_id.is_none());
        Ok(judges)
    }

    async fn get_judge(&self, id: Uuid) -> Result<Option<Judge>, AppError> {
        Ok(self.tables.read().await.judges.get(&id).cloned())
    }

    async fn update_judge_profile(&self, judge: &Judge) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.judges.get_mut(&judge.id) else {
            return Ok(false);
        };
        existing.first_name = judge.first_name.clone();
        existing.last_name = judge.last_name.clone();
        existing.specialty = judge.specialty.clone();
        existing.initials = judge.initials.clone();
        existing.updated_at = judge.updated_at;
        Ok(true)
    }

    async fn delete_judge(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.judges.remove(&id).is_none() {
            return Ok(false);
        }
        tables.scores.retain(|(_, judge_id), _| *judge_id != id);
        Ok(true)
    }

    async fn judges_for_project(&self, project_id: Uuid) -> Result<Vec<Judge>, AppError> {
        let tables = self.tables.read().await;
        let mut judges: Vec<_> = tables
            .judges
            .values()
            .filter(|j| j.assigned_project_id == Some(project_id))
            .cloned()
            .collect();
        judges.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(judges)
    }

    async fn assign_judge(
        &self,
        project_id: Uuid,
        judge_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(project_not_found(project_id));
        }
        let judge = tables
            .judges
            .get_mut(&judge_id)
            .ok_or_else(|| judge_not_found(judge_id))?;
        let previous = judge.assigned_project_id.replace(project_id);
        judge.updated_at = Utc::now();
        Ok(previous.filter(|p| *p != project_id))
    }

    async fn unassign_judge(&self, project_id: Uuid, judge_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(project_not_found(project_id));
        }
        let judge = tables
            .judges
            .get_mut(&judge_id)
            .ok_or_else(|| judge_not_found(judge_id))?;
        if judge.assigned_project_id != Some(project_id) {
            return Ok(false);
        }
        judge.assigned_project_id = None;
        judge.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_project_judges(
        &self,
        project_id: Uuid,
        judge_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(project_not_found(project_id));
        }
        let wanted = dedup_ids(judge_ids);
        if let Some(missing) = wanted.iter().find(|id| !tables.judges.contains_key(*id)) {
            return Err(judge_not_found(*missing));
        }

        let now = Utc::now();
        for judge in tables.judges.values_mut() {
            let listed = wanted.contains(&judge.id);
            let target = if listed {
                Some(project_id)
            } else if judge.assigned_project_id == Some(project_id) {
                None
            } else {
                continue;
            };
            if judge.assigned_project_id != target {
                judge.assigned_project_id = target;
                judge.updated_at = now;
            }
        }
        Ok(())
    }

    async fn upsert_score(&self, score: &Score) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&score.project_id) {
            return Err(project_not_found(score.project_id));
        }
        let judge = tables
            .judges
            .get(&score.judge_id)
            .ok_or_else(|| judge_not_found(score.judge_id))?;
        if judge.assigned_project_id != Some(score.project_id) {
            return Err(not_on_panel(score.project_id, score.judge_id));
        }
        tables
            .scores
            .insert((score.project_id, score.judge_id), score.clone());
        Ok(())
    }

    async fn scores_for_project(&self, project_id: Uuid) -> Result<Vec<Score>, AppError> {
        let tables = self.tables.read().await;
        let mut scores: Vec<_> = tables
            .scores
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        scores.sort_by_key(|s| (s.submitted_at, s.judge_id));
        Ok(scores)
    }

    async fn scores_for_hackathon(&self, hackathon_id: Uuid) -> Result<Vec<Score>, AppError> {
        let tables = self.tables.read().await;
        let mut scores: Vec<_> = tables
            .scores
            .values()
            .filter(|s| {
                tables
                    .projects
                    .get(&s.project_id)
                    .is_some_and(|p| p.hackathon_id == hackathon_id)
            })
            .cloned()
            .collect();
        scores.sort_by_key(|s| (s.submitted_at, s.project_id, s.judge_id));
        Ok(scores)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
