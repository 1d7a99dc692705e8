//! PostgreSQL-backed `JudgingStore`.
//!
//! The single `judges.assigned_project_id` column makes a judge's panel
//! membership one row value, so an assignment move is one `UPDATE`.
//! Panel replacement runs inside a transaction.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::judging::models::{Hackathon, Judge, Project, Score};
use crate::judging::rubric::RubricCategory;
use crate::judging::store::{
    dedup_ids, hackathon_not_found, judge_not_found, not_on_panel, project_not_found,
    JudgingStore,
};
use crate::models::judging::{HackathonRow, JudgeRow, ProjectRow, ScoreRow};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const HACKATHON_COLUMNS: &str =
    "id, name, description, start_date, end_date, status, rubric, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, hackathon_id, name, category, description, status, created_at, updated_at";
const JUDGE_COLUMNS: &str = "id, first_name, last_name, email, specialty, initials, \
     assigned_project_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sql_state(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn project_exists_sql() -> &'static str {
    "SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)"
}

#[async_trait]
impl JudgingStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_hackathon(&self, hackathon: &Hackathon) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO hackathons
                (id, name, description, start_date, end_date, status, rubric, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(hackathon.id)
        .bind(&hackathon.name)
        .bind(&hackathon.description)
        .bind(hackathon.start_date)
        .bind(hackathon.end_date)
        .bind(hackathon.status.as_str())
        .bind(Json(&hackathon.rubric))
        .bind(hackathon.created_at)
        .bind(hackathon.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_hackathons(&self) -> Result<Vec<Hackathon>, AppError> {
        let rows: Vec<HackathonRow> = sqlx::query_as(&format!(
            "SELECT {HACKATHON_COLUMNS} FROM hackathons ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| Hackathon::try_from(row).map_err(AppError::from))
            .collect()
    }

    async fn get_hackathon(&self, id: Uuid) -> Result<Option<Hackathon>, AppError> {
        let row: Option<HackathonRow> = sqlx::query_as(&format!(
            "SELECT {HACKATHON_COLUMNS} FROM hackathons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Hackathon::try_from).transpose()?)
    }

    async fn update_hackathon(&self, hackathon: &Hackathon) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE hackathons
            SET name = $2, description = $3, start_date = $4, end_date = $5,
                status = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(hackathon.id)
        .bind(&hackathon.name)
        .bind(&hackathon.description)
        .bind(hackathon.start_date)
        .bind(hackathon.end_date)
        .bind(hackathon.status.as_str())
        .bind(hackathon.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_rubric(&self, id: Uuid, rubric: &[RubricCategory]) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE hackathons SET rubric = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(Json(rubric))
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_hackathon(&self, id: Uuid) -> Result<bool, AppError> {
        // projects cascade, which releases judges and drops scores
        let result = sqlx::query("DELETE FROM hackathons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_project(&self, project: &Project) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects
                (id, hackathon_id, name, category, description, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(project.id)
        .bind(project.hackathon_id)
        .bind(&project.name)
        .bind(&project.category)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if sql_state(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(hackathon_not_found(project.hackathon_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_projects(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Project>, AppError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE ($1::uuid IS NULL OR hackathon_id = $1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(hackathon_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| Project::try_from(row).map_err(AppError::from))
            .collect()
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Project::try_from).transpose()?)
    }

    async fn update_project(&self, project: &Project) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, category = $3, description = $4, status = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.category)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_judge(&self, judge: &Judge) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO judges
                (id, first_name, last_name, email, specialty, initials,
                 assigned_project_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(judge.id)
        .bind(&judge.first_name)
        .bind(&judge.last_name)
        .bind(&judge.email)
        .bind(&judge.specialty)
        .bind(&judge.initials)
        .bind(judge.assigned_project_id)
        .bind(judge.created_at)
        .bind(judge.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if sql_state(&e).as_deref() == Some(UNIQUE_VIOLATION) => Err(
                AppError::Conflict(format!("A judge with email {} already exists", judge.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_judges(&self) -> Result<Vec<Judge>, AppError> {
        let rows: Vec<JudgeRow> = sqlx::query_as(&format!(
            "SELECT {JUDGE_COLUMNS} FROM judges ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Judge::from).collect())
    }

    async fn list_unassigned_judges(&self) -> Result<Vec<Judge>, AppError> {
        let rows: Vec<JudgeRow> = sqlx::query_as(&format!(
            "SELECT {JUDGE_COLUMNS} FROM judges WHERE assigned_project_id IS NULL \
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Judge::from).collect())
    }

    async fn get_judge(&self, id: Uuid) -> Result<Option<Judge>, AppError> {
        let row: Option<JudgeRow> =
            sqlx::query_as(&format!("SELECT {JUDGE_COLUMNS} FROM judges WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Judge::from))
    }

    async fn update_judge_profile(&self, judge: &Judge) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE judges
            SET first_name = $2, last_name = $3, specialty = $4, initials = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(judge.id)
        .bind(&judge.first_name)
        .bind(&judge.last_name)
        .bind(&judge.specialty)
        .bind(&judge.initials)
        .bind(judge.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_judge(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM judges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn judges_for_project(&self, project_id: Uuid) -> Result<Vec<Judge>, AppError> {
        let rows: Vec<JudgeRow> = sqlx::query_as(&format!(
            "SELECT {JUDGE_COLUMNS} FROM judges WHERE assigned_project_id = $1 \
             ORDER BY last_name, first_name"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Judge::from).collect())
    }

    async fn assign_judge(
        &self,
        project_id: Uuid,
        judge_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(project_exists_sql())
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(project_not_found(project_id));
        }

        let previous: Option<Option<Uuid>> = sqlx::query_scalar(
            r#"
            UPDATE judges j
            SET assigned_project_id = $1, updated_at = now()
            FROM (SELECT id, assigned_project_id FROM judges WHERE id = $2 FOR UPDATE) prev
            WHERE j.id = prev.id
            RETURNING prev.assigned_project_id
            "#,
        )
        .bind(project_id)
        .bind(judge_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            return Err(judge_not_found(judge_id));
        };
        tx.commit().await?;

        debug!("Judge {judge_id} now on project {project_id} (was {previous:?})");
        Ok(previous.filter(|p| *p != project_id))
    }

    async fn unassign_judge(&self, project_id: Uuid, judge_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(project_exists_sql())
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(project_not_found(project_id));
        }

        let judge_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM judges WHERE id = $1)")
                .bind(judge_id)
                .fetch_one(&mut *tx)
                .await?;
        if !judge_exists {
            return Err(judge_not_found(judge_id));
        }

        let result = sqlx::query(
            "UPDATE judges SET assigned_project_id = NULL, updated_at = now() \
             WHERE id = $1 AND assigned_project_id = $2",
        )
        .bind(judge_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_project_judges(
        &self,
        project_id: Uuid,
        judge_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let wanted = dedup_ids(judge_ids);
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(project_exists_sql())
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(project_not_found(project_id));
        }

        let found: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM judges WHERE id = ANY($1) FOR UPDATE")
                .bind(&wanted[..])
                .fetch_all(&mut *tx)
                .await?;
        if let Some(missing) = wanted.iter().find(|id| !found.contains(*id)) {
            // dropping the transaction rolls it back
            return Err(judge_not_found(*missing));
        }

        sqlx::query(
            "UPDATE judges SET assigned_project_id = NULL, updated_at = now() \
             WHERE assigned_project_id = $1 AND NOT (id = ANY($2))",
        )
        .bind(project_id)
        .bind(&wanted[..])
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE judges SET assigned_project_id = $1, updated_at = now() \
             WHERE id = ANY($2) AND assigned_project_id IS DISTINCT FROM $1",
        )
        .bind(project_id)
        .bind(&wanted[..])
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_score(&self, score: &Score) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO scores
                (project_id, judge_id, scores, comments, general_comments, submitted_at)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE EXISTS (
                SELECT 1 FROM judges WHERE id = $2 AND assigned_project_id = $1 FOR SHARE
            )
            ON CONFLICT (project_id, judge_id) DO UPDATE
            SET scores = EXCLUDED.scores,
                comments = EXCLUDED.comments,
                general_comments = EXCLUDED.general_comments,
                submitted_at = EXCLUDED.submitted_at
            "#,
        )
        .bind(score.project_id)
        .bind(score.judge_id)
        .bind(Json(&score.scores))
        .bind(Json(&score.comments))
        .bind(&score.general_comments)
        .bind(score.submitted_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(()),
            // the panel check matched no row
            Ok(_) => Err(not_on_panel(score.project_id, score.judge_id)),
            Err(e) if sql_state(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(project_not_found(score.project_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn scores_for_project(&self, project_id: Uuid) -> Result<Vec<Score>, AppError> {
        let rows: Vec<ScoreRow> = sqlx::query_as(
            r#"
            SELECT project_id, judge_id, scores, comments, general_comments, submitted_at
            FROM scores
            WHERE project_id = $1
            ORDER BY submitted_at, judge_id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Score::from).collect())
    }

    async fn scores_for_hackathon(&self, hackathon_id: Uuid) -> Result<Vec<Score>, AppError> {
        let rows: Vec<ScoreRow> = sqlx::query_as(
            r#"
            SELECT s.project_id, s.judge_id, s.scores, s.comments, s.general_comments, s.submitted_at
            FROM scores s
            JOIN projects p ON p.id = s.project_id
            WHERE p.hackathon_id = $1
            ORDER BY s.submitted_at, s.project_id, s.judge_id
            "#,
        )
        .bind(hackathon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Score::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_have_no_sql_state() {
        assert_eq!(sql_state(&sqlx::Error::RowNotFound), None);
    }

    #[test]
    fn test_column_lists_match_row_fields() {
        assert_eq!(HACKATHON_COLUMNS.split(", ").count(), 9);
        assert_eq!(PROJECT_COLUMNS.split(", ").count(), 8);
        assert!(JUDGE_COLUMNS.contains("assigned_project_id"));
    }
}
