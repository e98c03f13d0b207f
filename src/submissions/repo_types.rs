use std::collections::BTreeMap;

use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Field id -> answer. Ids the form doesn't know are kept as sent.
pub type Responses = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub responses: Responses,
    pub submitted_at: OffsetDateTime,
    pub source_identity: String,
}

#[derive(Debug, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub responses: Json<Responses>,
    pub submitted_at: OffsetDateTime,
    pub source_identity: String,
}

impl From<SubmissionRow> for Submission {
    fn from(r: SubmissionRow) -> Self {
        Self {
            id: r.id,
            form_id: r.form_id,
            responses: r.responses.0,
            submitted_at: r.submitted_at,
            source_identity: r.source_identity,
        }
    }
}
