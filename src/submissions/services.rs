use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{SubmissionView, SubmissionsListing, SubmitRequest};
use super::repo_types::{Responses, Submission};
use crate::error::{AppError, AppResult};
use crate::forms::repo_types::{Field, Form};
use crate::forms::services::{load_active_form, load_form};
use crate::forms::token::tokens_match;
use crate::notify::{self, escape_html, Email};
use crate::state::AppState;

const NO_RESPONSE: &str = "No response";

pub fn require_responses(req: SubmitRequest) -> AppResult<Responses> {
    let responses = req
        .responses
        .ok_or_else(|| AppError::Validation("Missing required field: responses".into()))?;
    Ok(responses
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
        .collect())
}

pub fn require_token(token: Option<&str>) -> AppResult<&str> {
    token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized("Magic token required"))
}

/// First required field, in form order, whose answer is absent or empty.
pub fn first_missing_required<'a>(fields: &'a [Field], responses: &Responses) -> Option<&'a Field> {
    fields
        .iter()
        .find(|f| f.required && responses.get(&f.id).map_or(true, |v| v.is_empty()))
}

/// Validates against the form's schema, stores the submission and bumps the
/// form's counter in place.
pub async fn submit(
    st: &AppState,
    form_id: Uuid,
    responses: Responses,
    source_identity: String,
) -> AppResult<Uuid> {
    let form = load_active_form(st, form_id).await?;

    if let Some(field) = first_missing_required(&form.fields, &responses) {
        warn!(%form_id, field_id = %field.id, "required field missing");
        return Err(AppError::Validation(format!(
            "Required field \"{}\" is missing",
            field.label
        )));
    }

    let submission = Submission {
        id: Uuid::new_v4(),
        form_id,
        responses,
        submitted_at: OffsetDateTime::now_utc(),
        source_identity,
    };
    st.submissions
        .insert(&submission)
        .await
        .map_err(AppError::Storage)?;
    st.forms
        .increment_submission_count(form_id)
        .await
        .map_err(AppError::Storage)?;
    info!(%form_id, submission_id = %submission.id, "submission accepted");

    notify::dispatch(st.notifier.clone(), submission_email(&form, &submission));

    Ok(submission.id)
}

fn submission_email(form: &Form, submission: &Submission) -> Email {
    let submitted_at = submission
        .submitted_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| submission.submitted_at.to_string());

    let summary = form
        .fields
        .iter()
        .map(|f| {
            let value = submission
                .responses
                .get(&f.id)
                .map(String::as_str)
                .unwrap_or(NO_RESPONSE);
            format!(
                "<strong>{}:</strong> {}",
                escape_html(&f.label),
                escape_html(value)
            )
        })
        .collect::<Vec<_>>()
        .join("<br>\n");

    let html = format!(
        r#"<html>
<body>
  <h2>New form submission received</h2>
  <p><strong>Form:</strong> {name}</p>
  <p><strong>Submission ID:</strong> {id}</p>
  <p><strong>Submitted at:</strong> {submitted_at}</p>
  <h3>Responses</h3>
  <div>
{summary}
  </div>
  <p>Use the view link from your form creation email to see every submission.</p>
</body>
</html>"#,
        name = escape_html(&form.name),
        id = submission.id,
    );

    Email {
        to: form.creator_email.clone(),
        subject: format!("New submission for \"{}\"", form.name),
        html,
    }
}

/// Token-gated listing. The active flag is deliberately not consulted: the token
/// holder keeps access to data collected before deactivation.
pub async fn view_submissions(
    st: &AppState,
    form_id: Uuid,
    token: &str,
) -> AppResult<SubmissionsListing> {
    let form = load_form(st, form_id).await?;
    if !tokens_match(token, &form.magic_token) {
        warn!(%form_id, "magic token mismatch");
        return Err(AppError::Forbidden("Invalid magic token"));
    }

    let submissions: Vec<SubmissionView> = st
        .submissions
        .list_by_form(form_id)
        .await
        .map_err(AppError::Storage)?
        .into_iter()
        .map(SubmissionView::from)
        .collect();

    Ok(SubmissionsListing {
        form_id: form.id,
        form_name: form.name,
        fields: form.fields,
        created_at: form.created_at,
        total_submissions: submissions.len(),
        submissions,
    })
}
