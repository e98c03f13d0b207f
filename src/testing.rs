use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::{
    config::AppConfig,
    memory::MemoryStore,
    notify::{Email, Notifier},
    qr::CodeRenderer,
    state::AppState,
};

/// Captures every email on a channel; optionally reports failure after capturing.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Email>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Email>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: false }, rx)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Email>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: true }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let _ = self.tx.send(Email {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        });
        if self.fail {
            anyhow::bail!("smtp relay unreachable");
        }
        Ok(())
    }
}

pub struct StubRenderer;

impl CodeRenderer for StubRenderer {
    fn render(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        Ok(format!("QR:{text}").into_bytes())
    }
}

pub struct Fake {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub outbox: mpsc::UnboundedReceiver<Email>,
}

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        database_max_connections: 1,
        public_base_url: None,
        ses: None,
    }
}

impl AppState {
    pub fn fake() -> Fake {
        let (notifier, outbox) = RecordingNotifier::new();
        Self::fake_with(notifier, outbox)
    }

    pub fn fake_with_failing_notifier() -> Fake {
        let (notifier, outbox) = RecordingNotifier::failing();
        Self::fake_with(notifier, outbox)
    }

    fn fake_with(notifier: RecordingNotifier, outbox: mpsc::UnboundedReceiver<Email>) -> Fake {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::from_parts(
            Arc::new(test_config()),
            store.clone(),
            store.clone(),
            Arc::new(notifier),
            Arc::new(StubRenderer),
        );
        Fake {
            state,
            store,
            outbox,
        }
    }
}

/// Drives `app` with one request; returns status and the JSON body (`Null` when empty
/// or not JSON).
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "forms.test");
    let body = match body {
        Some(v) => {
            req = req.header(CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app
        .clone()
        .oneshot(req.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
