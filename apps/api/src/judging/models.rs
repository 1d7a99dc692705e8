use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::judging::rubric::{default_rubric, validate_rubric, RubricCategory};

const MAX_INITIALS_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HackathonStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
}

impl HackathonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HackathonStatus::Upcoming => "upcoming",
            HackathonStatus::Active => "active",
            HackathonStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "upcoming" => Some(HackathonStatus::Upcoming),
            "active" => Some(HackathonStatus::Active),
            "completed" => Some(HackathonStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Judged,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Submitted => "submitted",
            ProjectStatus::UnderReview => "under_review",
            ProjectStatus::Judged => "judged",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(ProjectStatus::Draft),
            "submitted" => Some(ProjectStatus::Submitted),
            "under_review" => Some(ProjectStatus::UnderReview),
            "judged" => Some(ProjectStatus::Judged),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: HackathonStatus,
    pub rubric: Vec<RubricCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A judge sits on at most one project panel, recorded by
/// `assigned_project_id`. Project panels are derived from this field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Judge {
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

impl Judge {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One judge's scorecard for one project. Resubmitting replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub project_id: Uuid,
    pub judge_id: Uuid,
    pub scores: BTreeMap<String, f64>,
    pub comments: BTreeMap<String, String>,
    pub general_comments: String,
    pub submitted_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHackathon {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<HackathonStatus>,
    pub rubric: Option<Vec<RubricCategory>>,
}

impl NewHackathon {
    pub fn into_hackathon(self) -> Result<Hackathon, AppError> {
        let rubric = self.rubric.unwrap_or_else(default_rubric);
        validate_rubric(&rubric)?;
        check_date_range(self.start_date, self.end_date)?;
        let now = Utc::now();
        Ok(Hackathon {
            id: Uuid::new_v4(),
            name: require_text("name", &self.name)?,
            description: require_text("description", &self.description)?,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.unwrap_or_default(),
            rubric,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackathonUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<HackathonStatus>,
}

impl HackathonUpdate {
    pub fn apply(self, hackathon: &mut Hackathon) -> Result<(), AppError> {
        if let Some(name) = self.name {
            hackathon.name = require_text("name", &name)?;
        }
        if let Some(description) = self.description {
            hackathon.description = require_text("description", &description)?;
        }
        if let Some(start) = self.start_date {
            hackathon.start_date = start;
        }
        if let Some(end) = self.end_date {
            hackathon.end_date = end;
        }
        if let Some(status) = self.status {
            hackathon.status = status;
        }
        check_date_range(hackathon.start_date, hackathon.end_date)?;
        hackathon.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub category: String,
    pub description: String,
    pub hackathon_id: Uuid,
    pub status: Option<ProjectStatus>,
}

impl NewProject {
    pub fn into_project(self) -> Result<Project, AppError> {
        let now = Utc::now();
        Ok(Project {
            id: Uuid::new_v4(),
            hackathon_id: self.hackathon_id,
            name: require_text("name", &self.name)?,
            category: require_text("category", &self.category)?,
            description: require_text("description", &self.description)?,
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    /// Replaces the whole panel when present.
    pub assigned_judges: Option<Vec<Uuid>>,
}

impl ProjectUpdate {
    /// Applies the field changes; the panel is handled by the caller.
    pub fn apply(&self, project: &mut Project) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            project.name = require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            project.category = require_text("category", category)?;
        }
        if let Some(description) = &self.description {
            project.description = require_text("description", description)?;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJudge {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    pub initials: String,
}

impl NewJudge {
    pub fn into_judge(self) -> Result<Judge, AppError> {
        let now = Utc::now();
        Ok(Judge {
            id: Uuid::new_v4(),
            first_name: require_text("firstName", &self.first_name)?,
            last_name: require_text("lastName", &self.last_name)?,
            email: normalize_email(&self.email)?,
            specialty: require_text("specialty", &self.specialty)?,
            initials: normalize_initials(&self.initials)?,
            assigned_project_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialty: Option<String>,
    pub initials: Option<String>,
}

impl JudgeUpdate {
    pub fn apply(self, judge: &mut Judge) -> Result<(), AppError> {
        if let Some(first) = self.first_name {
            judge.first_name = require_text("firstName", &first)?;
        }
        if let Some(last) = self.last_name {
            judge.last_name = require_text("lastName", &last)?;
        }
        if let Some(specialty) = self.specialty {
            judge.specialty = require_text("specialty", &specialty)?;
        }
        if let Some(initials) = self.initials {
            judge.initials = normalize_initials(&initials)?;
        }
        judge.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub judge_id: Uuid,
    pub scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub comments: BTreeMap<String, String>,
    #[serde(default)]
    pub general_comments: String,
}

impl ScoreSubmission {
    pub fn into_score(self, project_id: Uuid) -> Score {
        Score {
            project_id,
            judge_id: self.judge_id,
            scores: self.scores,
            comments: self.comments,
            general_comments: self.general_comments.trim().to_string(),
            submitted_at: Utc::now(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field helpers
// ────────────────────────────────────────────────────────────────────────────

fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = require_text("email", raw)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation(format!("'{email}' is not an email address"))),
    }
}

fn normalize_initials(raw: &str) -> Result<String, AppError> {
    let initials = require_text("initials", raw)?.to_uppercase();
    if initials.chars().count() > MAX_INITIALS_LEN {
        return Err(AppError::Validation(format!(
            "initials must be at most {MAX_INITIALS_LEN} characters"
        )));
    }
    Ok(initials)
}

fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::Validation(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_judge(email: &str, initials: &str) -> NewJudge {
        NewJudge {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            specialty: "Systems".to_string(),
            initials: initials.to_string(),
        }
    }

    #[test]
    fn test_judge_fields_normalized() {
        let judge = new_judge(" Ada@Example.COM ", "al").into_judge().unwrap();
        assert_eq!(judge.first_name, "Ada");
        assert_eq!(judge.email, "ada@example.com");
        assert_eq!(judge.initials, "AL");
        assert_eq!(judge.full_name(), "Ada Lovelace");
        assert!(judge.assigned_project_id.is_none());
    }

    #[test]
    fn test_long_initials_rejected() {
        assert!(new_judge("a@b.io", "abcdef").into_judge().is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        assert!(new_judge("not-an-email", "AL").into_judge().is_err());
        assert!(new_judge("@b.io", "AL").into_judge().is_err());
    }

    #[test]
    fn test_hackathon_defaults() {
        let new: NewHackathon = serde_json::from_value(json!({
            "name": "InnovateHer",
            "description": "Spring build weekend",
            "startDate": "2025-03-01",
            "endDate": "2025-03-02"
        }))
        .unwrap();
        let hackathon = new.into_hackathon().unwrap();
        assert_eq!(hackathon.status, HackathonStatus::Upcoming);
        assert_eq!(hackathon.rubric, default_rubric());
    }

    #[test]
    fn test_hackathon_end_before_start_rejected() {
        let new: NewHackathon = serde_json::from_value(json!({
            "name": "x",
            "description": "y",
            "startDate": "2025-03-02",
            "endDate": "2025-03-01"
        }))
        .unwrap();
        assert!(new.into_hackathon().is_err());
    }

    #[test]
    fn test_project_blank_name_rejected() {
        let new = NewProject {
            name: "   ".to_string(),
            category: "AI/ML".to_string(),
            description: "d".to_string(),
            hackathon_id: Uuid::new_v4(),
            status: None,
        };
        assert!(matches!(new.into_project(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_project_update_applies_fields() {
        let mut project = NewProject {
            name: "EcoTrack".to_string(),
            category: "Social Impact".to_string(),
            description: "Carbon tracking".to_string(),
            hackathon_id: Uuid::new_v4(),
            status: None,
        }
        .into_project()
        .unwrap();
        let update = ProjectUpdate {
            status: Some(ProjectStatus::UnderReview),
            name: Some("EcoTrack 2".to_string()),
            ..Default::default()
        };
        update.apply(&mut project).unwrap();
        assert_eq!(project.name, "EcoTrack 2");
        assert_eq!(project.status, ProjectStatus::UnderReview);
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            ProjectStatus::Draft,
            ProjectStatus::Submitted,
            ProjectStatus::UnderReview,
            ProjectStatus::Judged,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(HackathonStatus::parse("active"), Some(HackathonStatus::Active));
        assert_eq!(HackathonStatus::parse("archived"), None);
    }
}
