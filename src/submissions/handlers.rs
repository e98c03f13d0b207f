use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{SubmissionsListing, SubmitRequest, SubmittedResponse, ViewQuery};
use super::services::{require_responses, require_token, submit, view_submissions};
use crate::{
    error::AppResult, extractors::SourceIdentity, forms::services::parse_form_id,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forms/:form_id/submit", post(create))
        .route("/forms/:form_id/submissions", get(list))
}

/// POST /forms/:form_id/submit {responses: {fieldId: value}}
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    SourceIdentity(source): SourceIdentity,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SubmittedResponse>)> {
    let Json(body) = payload?;
    let responses = require_responses(body)?;
    let form_id = parse_form_id(&form_id)?;

    let submission_id = submit(&state, form_id, responses, source).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmittedResponse {
            submission_id,
            message: "Form submitted successfully",
        }),
    ))
}

/// GET /forms/:form_id/submissions?token=...
#[instrument(skip(state, query))]
pub async fn list(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<SubmissionsListing>> {
    let token = require_token(query.token.as_deref())?;
    let form_id = parse_form_id(&form_id)?;
    Ok(Json(view_submissions(&state, form_id, token).await?))
}
