use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Submission, SubmissionRow};

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, submission: &Submission) -> anyhow::Result<()>;
    /// All submissions of a form, newest first.
    async fn list_by_form(&self, form_id: Uuid) -> anyhow::Result<Vec<Submission>>;
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    db: PgPool,
}

impl PgSubmissionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, submission: &Submission) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, form_id, responses, submitted_at, source_identity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(submission.id)
        .bind(submission.form_id)
        .bind(Json(&submission.responses))
        .bind(submission.submitted_at)
        .bind(&submission.source_identity)
        .execute(&self.db)
        .await
        .context("insert submission")?;
        Ok(())
    }

    async fn list_by_form(&self, form_id: Uuid) -> anyhow::Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, form_id, responses, submitted_at, source_identity
              FROM submissions
             WHERE form_id = $1
             ORDER BY submitted_at DESC, seq DESC
            "#,
        )
        .bind(form_id)
        .fetch_all(&self.db)
        .await
        .context("list submissions by form")?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }
}
