use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Form, FormRow};

#[async_trait]
pub trait FormStore: Send + Sync {
    /// Writes a complete form, token included, in a single statement.
    async fn insert(&self, form: &Form) -> anyhow::Result<()>;
    async fn get(&self, form_id: Uuid) -> anyhow::Result<Option<Form>>;
    /// In-place `+1`, never a read-modify-write of a cached copy.
    async fn increment_submission_count(&self, form_id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgFormStore {
    db: PgPool,
}

impl PgFormStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FormStore for PgFormStore {
    async fn insert(&self, form: &Form) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO forms (id, name, fields, creator_email, magic_token,
                               is_active, submission_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(form.id)
        .bind(&form.name)
        .bind(Json(&form.fields))
        .bind(&form.creator_email)
        .bind(&form.magic_token)
        .bind(form.is_active)
        .bind(form.submission_count)
        .bind(form.created_at)
        .execute(&self.db)
        .await
        .context("insert form")?;
        Ok(())
    }

    async fn get(&self, form_id: Uuid) -> anyhow::Result<Option<Form>> {
        let row = sqlx::query_as::<_, FormRow>(
            r#"
            SELECT id, name, fields, creator_email, magic_token,
                   is_active, submission_count, created_at
              FROM forms
             WHERE id = $1
            "#,
        )
        .bind(form_id)
        .fetch_optional(&self.db)
        .await
        .context("get form")?;
        Ok(row.map(Form::from))
    }

    async fn increment_submission_count(&self, form_id: Uuid) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE forms
               SET submission_count = submission_count + 1
             WHERE id = $1
            "#,
        )
        .bind(form_id)
        .execute(&self.db)
        .await
        .context("increment submission_count")?;

        anyhow::ensure!(res.rows_affected() == 1, "form {form_id} not found for counter update");
        Ok(())
    }
}
