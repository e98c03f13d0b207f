mod app;
mod config;
mod error;
mod extractors;
mod forms;
mod memory;
mod notify;
mod qr;
mod state;
mod submissions;
#[cfg(test)]
mod testing;

use tracing_subscriber::EnvFilter;

use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "qrforms=debug,axum=info,tower_http=info";

/// `RUST_LOG` overrides the filter; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => subscriber.with_target(false).json().init(),
        _ => subscriber.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    let config = state.config.clone();
    tracing::info!(
        persistent = config.database_url.is_some(),
        email = config.ses.is_some(),
        "qrforms starting"
    );

    app::serve(app::build_app(state), &config).await
}
