use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{forms, submissions};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(forms::router())
                  .merge(submissions::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span).on_response(log_response))
}

/// The span carries the path only: the view link puts the magic token in the query string.
fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        status = tracing::field::Empty,
    )
}

fn log_response(res: &Response, latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", tracing::field::display(status));
    match status.as_u16() {
        500.. => tracing::error!(%status, ?latency, "request failed"),
        400..=499 => tracing::debug!(%status, ?latency, "request rejected"),
        _ => tracing::info!(%status, ?latency, "request served"),
    }
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
