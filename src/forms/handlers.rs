use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateFormRequest, CreatedFormResponse, PublicForm};
use super::services::{create_form, get_public_form, parse_form_id};
use crate::{error::AppResult, extractors::PublicBaseUrl, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forms", post(create))
        .route("/forms/:form_id", get(show))
}

/// POST /forms {email, formName, fields}
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    PublicBaseUrl(base_url): PublicBaseUrl,
    payload: Result<Json<CreateFormRequest>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<CreatedFormResponse>)> {
    let Json(body) = payload?;
    let created = create_form(&state, body, &base_url).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/forms/{}", created.form_id)) {
        headers.insert(LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedFormResponse {
            form_id: created.form_id,
            qr_code_image: created.qr_code_base64,
            form_url: created.form_url,
            view_submissions_url: created.view_submissions_url,
            message: "Form created successfully",
        }),
    ))
}

/// GET /forms/:form_id
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> AppResult<Json<PublicForm>> {
    let form_id = parse_form_id(&form_id)?;
    Ok(Json(get_public_form(&state, form_id).await?))
}
