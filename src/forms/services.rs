use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{CreateFormRequest, PublicForm};
use super::repo_types::{Field, Form};
use super::token::generate_magic_token;
use crate::error::{AppError, AppResult};
use crate::notify::{self, escape_html, Email};
use crate::state::AppState;

pub struct CreatedForm {
    pub form_id: Uuid,
    pub form_url: String,
    pub view_submissions_url: String,
    pub qr_code_base64: String,
}

/// Ids are opaque to callers: anything that isn't one of ours is simply not found.
pub fn parse_form_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Form not found"))
}

pub fn form_url(base_url: &str, form_id: Uuid) -> String {
    format!("{base_url}/api/v1/forms/{form_id}")
}

pub fn view_submissions_url(base_url: &str, form_id: Uuid, token: &str) -> String {
    format!("{}/submissions?token={token}", form_url(base_url, form_id))
}

fn validate(req: CreateFormRequest) -> AppResult<(String, String, Vec<Field>)> {
    let (Some(email), Some(name), Some(fields)) = (req.email, req.form_name, req.fields) else {
        return Err(AppError::Validation(
            "Missing required fields: email, formName, fields".into(),
        ));
    };

    // Delivery is the only check on the address; it is stored as sent.
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::Validation("email must not be empty".into()));
    }

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("formName must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for field in &fields {
        if field.id.trim().is_empty() {
            return Err(AppError::Validation("Every field needs a non-empty id".into()));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Duplicate field id \"{}\"",
                field.id
            )));
        }
    }

    Ok((email, name, fields))
}

/// Validates, renders the code, and stores the complete form (token included) in one
/// write, so no reader ever sees a form without its token.
pub async fn create_form(
    st: &AppState,
    req: CreateFormRequest,
    base_url: &str,
) -> AppResult<CreatedForm> {
    let (creator_email, name, fields) = validate(req)?;

    let form_id = Uuid::new_v4();
    let magic_token = generate_magic_token();
    let public_url = form_url(base_url, form_id);
    let view_url = view_submissions_url(base_url, form_id, &magic_token);

    let qr_png = st.codes.render(&public_url).map_err(AppError::Unexpected)?;
    let qr_code_base64 = STANDARD.encode(&qr_png);

    let form = Form {
        id: form_id,
        name,
        fields,
        creator_email,
        magic_token,
        is_active: true,
        submission_count: 0,
        created_at: OffsetDateTime::now_utc(),
    };
    st.forms.insert(&form).await.map_err(AppError::Storage)?;
    info!(%form_id, fields = form.fields.len(), "form created");

    notify::dispatch(
        st.notifier.clone(),
        creation_email(&form, &public_url, &view_url, &qr_code_base64),
    );

    Ok(CreatedForm {
        form_id,
        form_url: public_url,
        view_submissions_url: view_url,
        qr_code_base64,
    })
}

fn creation_email(form: &Form, public_url: &str, view_url: &str, qr_code_base64: &str) -> Email {
    let name = escape_html(&form.name);
    let public_url = escape_html(public_url);
    let view_url = escape_html(view_url);
    let html = format!(
        r#"<html>
<body>
  <h2>Your QR form has been created!</h2>
  <p><strong>Form name:</strong> {name}</p>
  <p><strong>Form ID:</strong> {id}</p>
  <h3>QR code</h3>
  <img src="data:image/png;base64,{qr_code_base64}" alt="QR code" style="max-width: 300px;">
  <h3>Form URL</h3>
  <p><a href="{public_url}">{public_url}</a></p>
  <h3>View submissions</h3>
  <p><a href="{view_url}">Click here to view form submissions</a></p>
  <p>Keep this link private: anyone holding it can read every response.</p>
</body>
</html>"#,
        id = form.id,
    );
    Email {
        to: form.creator_email.clone(),
        subject: format!("QR Forms: your form \"{}\" is ready!", form.name),
        html,
    }
}

/// Any form, active or not.
pub(crate) async fn load_form(st: &AppState, form_id: Uuid) -> AppResult<Form> {
    match st.forms.get(form_id).await.map_err(AppError::Storage)? {
        Some(form) => Ok(form),
        None => {
            debug!(%form_id, "form not found");
            Err(AppError::NotFound("Form not found"))
        }
    }
}

/// Forms that still accept reads and submissions.
pub(crate) async fn load_active_form(st: &AppState, form_id: Uuid) -> AppResult<Form> {
    let form = load_form(st, form_id).await?;
    if !form.is_active {
        warn!(%form_id, "inactive form requested");
        return Err(AppError::Gone("Form is no longer active"));
    }
    Ok(form)
}

pub async fn get_public_form(st: &AppState, form_id: Uuid) -> AppResult<PublicForm> {
    load_active_form(st, form_id).await.map(PublicForm::from)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn field(id: &str, label: &str, required: bool) -> Field {
        Field {
            id: id.into(),
            label: label.into(),
            kind: Some("text".into()),
            placeholder: None,
            required,
            extra: Default::default(),
        }
    }

    fn request(fields: Vec<Field>) -> CreateFormRequest {
        CreateFormRequest {
            email: Some("  Creator@Example.com ".into()),
            form_name: Some(" Team lunch ".into()),
            fields: Some(fields),
        }
    }

    #[tokio::test]
    async fn email_is_trimmed_but_otherwise_kept() {
        let fake = AppState::fake();
        for (sent, kept) in [
            ("admin@localhost", "admin@localhost"),
            ("  Creator@Example.com ", "Creator@Example.com"),
        ] {
            let req = CreateFormRequest { email: Some(sent.into()), ..request(vec![]) };
            let created = create_form(&fake.state, req, "https://h").await.unwrap();
            let stored = fake.state.forms.get(created.form_id).await.unwrap().unwrap();
            assert_eq!(stored.creator_email, kept);
        }
    }

    #[test]
    fn test_parse_form_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_form_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_form_id("nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn links_embed_id_and_token() {
        let id = Uuid::new_v4();
        assert_eq!(
            view_submissions_url("https://h", id, "tok"),
            format!("https://h/api/v1/forms/{id}/submissions?token=tok")
        );
    }

    #[tokio::test]
    async fn create_then_get_echoes_name_and_field_order() {
        let fake = AppState::fake();
        let fields = vec![
            field("name", "Name", true),
            field("diet", "Dietary needs", false),
            field("email", "Email", false),
        ];
        let created = create_form(&fake.state, request(fields.clone()), "https://h")
            .await
            .expect("create");

        assert_eq!(created.form_url, form_url("https://h", created.form_id));
        assert!(created
            .view_submissions_url
            .starts_with(&format!("{}/submissions?token=", created.form_url)));
        assert_eq!(
            STANDARD.decode(&created.qr_code_base64).unwrap(),
            format!("QR:{}", created.form_url).into_bytes()
        );

        let public = get_public_form(&fake.state, created.form_id).await.unwrap();
        assert_eq!(public.form_name, "Team lunch");
        assert_eq!(public.fields, fields);
        assert_eq!(public.submission_count, 0);
    }

    #[tokio::test]
    async fn stored_form_carries_token_from_the_first_write() {
        let fake = AppState::fake();
        let created = create_form(&fake.state, request(vec![]), "https://h")
            .await
            .unwrap();
        let stored = fake.state.forms.get(created.form_id).await.unwrap().unwrap();
        assert!(!stored.magic_token.is_empty());
        assert!(created.view_submissions_url.ends_with(&stored.magic_token));
        assert_eq!(stored.creator_email, "Creator@Example.com");
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn zero_fields_is_a_legal_form() {
        let fake = AppState::fake();
        let created = create_form(&fake.state, request(vec![]), "https://h").await.unwrap();
        let public = get_public_form(&fake.state, created.form_id).await.unwrap();
        assert!(public.fields.is_empty());
    }

    #[tokio::test]
    async fn missing_keys_are_rejected() {
        let fake = AppState::fake();
        for req in [
            CreateFormRequest { email: None, ..request(vec![]) },
            CreateFormRequest { form_name: None, ..request(vec![]) },
            CreateFormRequest { fields: None, ..request(vec![]) },
        ] {
            let err = create_form(&fake.state, req, "https://h").await.err().unwrap();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("Missing required fields")));
        }
    }

    #[tokio::test]
    async fn blank_values_and_bad_field_ids_are_rejected() {
        let fake = AppState::fake();
        let cases = [
            CreateFormRequest { email: Some("   ".into()), ..request(vec![]) },
            CreateFormRequest { form_name: Some("  ".into()), ..request(vec![]) },
            request(vec![field("", "Blank", false)]),
            request(vec![field("a", "A", false), field("a", "Again", true)]),
        ];
        for req in cases {
            let err = create_form(&fake.state, req, "https://h").await.err().unwrap();
            assert!(matches!(err, AppError::Validation(_)), "unexpected: {err:?}");
        }
    }

    #[tokio::test]
    async fn unknown_and_inactive_forms() {
        let fake = AppState::fake();
        let err = get_public_form(&fake.state, Uuid::new_v4()).await.err().unwrap();
        assert!(matches!(err, AppError::NotFound(_)));

        let created = create_form(&fake.state, request(vec![]), "https://h").await.unwrap();
        assert!(fake.store.deactivate(created.form_id).await);
        let err = get_public_form(&fake.state, created.form_id).await.err().unwrap();
        assert!(matches!(err, AppError::Gone(_)));

        // the owner-facing loader ignores the flag
        assert!(load_form(&fake.state, created.form_id).await.is_ok());
    }

    #[tokio::test]
    async fn creator_is_emailed_both_links_and_the_code() {
        let mut fake = AppState::fake();
        let created = create_form(&fake.state, request(vec![]), "https://h").await.unwrap();

        let email = tokio::time::timeout(Duration::from_secs(1), fake.outbox.recv())
            .await
            .expect("email dispatched")
            .unwrap();
        assert_eq!(email.to, "Creator@Example.com");
        assert!(email.subject.contains("Team lunch"));
        assert!(email.html.contains(&created.form_url));
        assert!(email.html.contains(&created.view_submissions_url));
        assert!(email.html.contains(&created.qr_code_base64));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_creation() {
        let mut fake = AppState::fake_with_failing_notifier();
        let created = create_form(&fake.state, request(vec![]), "https://h").await;
        assert!(created.is_ok());
        // the attempt still happened
        let attempted = tokio::time::timeout(Duration::from_secs(1), fake.outbox.recv()).await;
        assert!(matches!(attempted, Ok(Some(_))));
    }
}
