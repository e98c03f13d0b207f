use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    forms::{repo::FormStore, repo_types::Form},
    submissions::{repo::SubmissionStore, repo_types::Submission},
};

/// Process-local stores for running without Postgres and for tests.
#[derive(Default)]
pub struct MemoryStore {
    forms: RwLock<HashMap<Uuid, Form>>,
    submissions: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a form inert. Returns false for an unknown id.
    /// Nothing in the request paths flips the flag; tests use this to reach that state.
    #[cfg(test)]
    pub async fn deactivate(&self, form_id: Uuid) -> bool {
        match self.forms.write().await.get_mut(&form_id) {
            Some(form) => {
                form.is_active = false;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    async fn insert(&self, form: &Form) -> anyhow::Result<()> {
        let mut forms = self.forms.write().await;
        anyhow::ensure!(!forms.contains_key(&form.id), "form {} already exists", form.id);
        forms.insert(form.id, form.clone());
        Ok(())
    }

    async fn get(&self, form_id: Uuid) -> anyhow::Result<Option<Form>> {
        Ok(self.forms.read().await.get(&form_id).cloned())
    }

    async fn increment_submission_count(&self, form_id: Uuid) -> anyhow::Result<()> {
        let mut forms = self.forms.write().await;
        let form = forms
            .get_mut(&form_id)
            .ok_or_else(|| anyhow::anyhow!("form {form_id} not found for counter update"))?;
        form.submission_count += 1;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert(&self, submission: &Submission) -> anyhow::Result<()> {
        self.submissions.write().await.push(submission.clone());
        Ok(())
    }

    async fn list_by_form(&self, form_id: Uuid) -> anyhow::Result<Vec<Submission>> {
        // Reverse insertion order first so equal timestamps still come out newest-first.
        let mut out: Vec<Submission> = self
            .submissions
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(out)
    }
}
