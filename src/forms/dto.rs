use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Field, Form};

/// Keys are optional so an absent one becomes our own 400, not a serde rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormRequest {
    pub email: Option<String>,
    pub form_name: Option<String>,
    pub fields: Option<Vec<Field>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFormResponse {
    pub form_id: Uuid,
    /// Base64 PNG.
    pub qr_code_image: String,
    pub form_url: String,
    pub view_submissions_url: String,
    pub message: &'static str,
}

/// What respondents see. Never carries the creator's email or the token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicForm {
    pub form_id: Uuid,
    pub form_name: String,
    pub fields: Vec<Field>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub submission_count: i64,
}

impl From<Form> for PublicForm {
    fn from(f: Form) -> Self {
        Self {
            form_id: f.id,
            form_name: f.name,
            fields: f.fields,
            created_at: f.created_at,
            submission_count: f.submission_count,
        }
    }
}
