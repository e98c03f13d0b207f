use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sesv2::{
    config::Region,
    types::{Body, Content, Destination, EmailContent, Message},
    Client,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SesConfig;

/// Best-effort outbound email.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers `email` on a detached task. Failures are logged and dropped so the
/// caller's response never depends on delivery.
pub fn dispatch(notifier: Arc<dyn Notifier>, email: Email) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.send(&email.to, &email.subject, &email.html).await {
            Ok(()) => debug!(to = %email.to, subject = %email.subject, "notification sent"),
            Err(e) => warn!(error = %e, to = %email.to, "notification failed; continuing"),
        }
    })
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone)]
pub struct SesNotifier {
    client: Client,
    from: String,
}

impl SesNotifier {
    pub async fn new(cfg: &SesConfig) -> anyhow::Result<Self> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.region.clone()));
        if let (Some(access_key), Some(secret_key)) = (&cfg.access_key, &cfg.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        }
        let shared = loader.load().await;

        Ok(Self {
            client: Client::new(&shared),
            from: cfg.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let subject = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .context("build subject")?;
        let html = Content::builder()
            .data(html)
            .charset("UTF-8")
            .build()
            .context("build html body")?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().html(html).build())
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .context("ses send_email")?;
        Ok(())
    }
}

/// Used when no mail transport is configured: the message only reaches the log.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        info!(%to, %subject, bytes = html.len(), "email (not delivered, no transport configured)");
        Ok(())
    }
}
