use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::forms::repo::{FormStore, PgFormStore};
use crate::memory::MemoryStore;
use crate::notify::{LogNotifier, Notifier, SesNotifier};
use crate::qr::{CodeRenderer, QrPngRenderer};
use crate::submissions::repo::{PgSubmissionStore, SubmissionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub forms: Arc<dyn FormStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub notifier: Arc<dyn Notifier>,
    pub codes: Arc<dyn CodeRenderer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (forms, submissions): (Arc<dyn FormStore>, Arc<dyn SubmissionStore>) =
            match &config.database_url {
                Some(url) => {
                    let db = PgPoolOptions::new()
                        .max_connections(config.database_max_connections)
                        .connect(url)
                        .await
                        .context("connect to database")?;

                    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                        tracing::warn!(error = %e, "migration failed; continuing");
                    }

                    (
                        Arc::new(PgFormStore::new(db.clone())) as Arc<dyn FormStore>,
                        Arc::new(PgSubmissionStore::new(db)) as Arc<dyn SubmissionStore>,
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set; forms live in memory only");
                    let store = Arc::new(MemoryStore::new());
                    (
                        store.clone() as Arc<dyn FormStore>,
                        store as Arc<dyn SubmissionStore>,
                    )
                }
            };

        let notifier: Arc<dyn Notifier> = match &config.ses {
            Some(ses) => Arc::new(SesNotifier::new(ses).await?) as Arc<dyn Notifier>,
            None => {
                tracing::warn!("SES_FROM_ADDRESS not set; emails are only logged");
                Arc::new(LogNotifier) as Arc<dyn Notifier>
            }
        };

        Ok(Self::from_parts(
            config,
            forms,
            submissions,
            notifier,
            Arc::new(QrPngRenderer::default()),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        forms: Arc<dyn FormStore>,
        submissions: Arc<dyn SubmissionStore>,
        notifier: Arc<dyn Notifier>,
        codes: Arc<dyn CodeRenderer>,
    ) -> Self {
        Self {
            config,
            forms,
            submissions,
            notifier,
            codes,
        }
    }
}
