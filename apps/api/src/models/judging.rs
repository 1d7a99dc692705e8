//! Database rows for the judging tables and their conversion into records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::judging::models::{Hackathon, HackathonStatus, Judge, Project, ProjectStatus, Score};
use crate::judging::rubric::RubricCategory;

#[derive(Debug, Clone, FromRow)]
pub struct HackathonRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub rubric: Json<Vec<RubricCategory>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct JudgeRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub initials: String,
    pub assigned_project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ScoreRow {
    pub project_id: Uuid,
    pub judge_id: Uuid,
    pub scores: Json<BTreeMap<String, f64>>,
    pub comments: Json<BTreeMap<String, String>>,
    pub general_comments: String,
    pub submitted_at: DateTime<Utc>,
}

impl TryFrom<HackathonRow> for Hackathon {
    type Error = anyhow::Error;

    fn try_from(row: HackathonRow) -> Result<Self, Self::Error> {
        let status = HackathonStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("unknown hackathon status '{}'", row.status))?;
        Ok(Hackathon {
            id: row.id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            rubric: row.rubric.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = anyhow::Error;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = ProjectStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("unknown project status '{}'", row.status))?;
        Ok(Project {
            id: row.id,
            hackathon_id: row.hackathon_id,
            name: row.name,
            category: row.category,
            description: row.description,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<JudgeRow> for Judge {
    fn from(row: JudgeRow) -> Self {
        Judge {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            specialty: row.specialty,
            initials: row.initials,
            assigned_project_id: row.assigned_project_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ScoreRow> for Score {
    fn from(row: ScoreRow) -> Self {
        Score {
            project_id: row.project_id,
            judge_id: row.judge_id,
            scores: row.scores.0,
            comments: row.comments.0,
            general_comments: row.general_comments,
            submitted_at: row.submitted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_rejected() {
        let now = Utc::now();
        let row = ProjectRow {
            id: Uuid::new_v4(),
            hackathon_id: Uuid::new_v4(),
            name: "n".to_string(),
            category: "c".to_string(),
            description: "d".to_string(),
            status: "archived".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(Project::try_from(row).is_err());
    }

    #[test]
    fn test_hackathon_row_converts() {
        let now = Utc::now();
        let row = HackathonRow {
            id: Uuid::new_v4(),
            name: "InnovateHer".to_string(),
            description: "d".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            status: "under_way".to_string(),
            rubric: Json(crate::judging::rubric::default_rubric()),
            created_at: now,
            updated_at: now,
        };
        assert!(Hackathon::try_from(row.clone()).is_err());

        let ok = HackathonRow {
            status: "active".to_string(),
            ..row
        };
        let hackathon = Hackathon::try_from(ok).unwrap();
        assert_eq!(hackathon.status, HackathonStatus::Active);
        assert_eq!(hackathon.rubric.len(), 4);
    }
}
