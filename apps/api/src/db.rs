use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Judging schema. Each judge row owns at most one project reference, so a
/// judge can never sit on two panels.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hackathons (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    start_date  DATE NOT NULL,
    end_date    DATE NOT NULL,
    status      TEXT NOT NULL DEFAULT 'upcoming',
    rubric      JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS projects (
    id           UUID PRIMARY KEY,
    hackathon_id UUID NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    category     TEXT NOT NULL,
    description  TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'draft',
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS judges (
    id                  UUID PRIMARY KEY,
    first_name          TEXT NOT NULL,
    last_name           TEXT NOT NULL,
    email               TEXT NOT NULL UNIQUE,
    specialty           TEXT NOT NULL,
    initials            VARCHAR(5) NOT NULL,
    assigned_project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS judges_assigned_project_idx ON judges (assigned_project_id);

CREATE TABLE IF NOT EXISTS scores (
    project_id       UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    judge_id         UUID NOT NULL REFERENCES judges(id) ON DELETE CASCADE,
    scores           JSONB NOT NULL,
    comments         JSONB NOT NULL,
    general_comments TEXT NOT NULL DEFAULT '',
    submitted_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (project_id, judge_id)
)
"#;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies the judging schema. Every statement is idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    for statement in schema_statements() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to apply schema statement: {statement}"))?;
    }
    info!("Judging schema applied");
    Ok(())
}

fn schema_statements() -> impl Iterator<Item = &'static str> {
    SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_splits_into_statements() {
        let statements: Vec<_> = schema_statements().collect();
        assert_eq!(statements.len(), 5);
        assert!(statements.iter().all(|s| s.starts_with("CREATE")));
    }

    #[test]
    fn test_judge_owns_single_project_reference() {
        let judges = schema_statements()
            .find(|s| s.contains("TABLE IF NOT EXISTS judges"))
            .unwrap();
        assert!(judges.contains("assigned_project_id UUID REFERENCES projects(id) ON DELETE SET NULL"));
    }
}
