use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Responses, Submission};
use crate::forms::repo_types::Field;

/// `null` answers are accepted here and dropped before validation.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub responses: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResponse {
    pub submission_id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub submission_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    pub responses: Responses,
    pub source_identity: String,
}

impl From<Submission> for SubmissionView {
    fn from(s: Submission) -> Self {
        Self {
            submission_id: s.id,
            submitted_at: s.submitted_at,
            responses: s.responses,
            source_identity: s.source_identity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsListing {
    pub form_id: Uuid,
    pub form_name: String,
    pub fields: Vec<Field>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub total_submissions: usize,
    pub submissions: Vec<SubmissionView>,
}
