use std::{convert::Infallible, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::HOST, request::Parts},
};

use crate::state::AppState;

/// Scheme and host that links handed to creators start with.
pub struct PublicBaseUrl(pub String);

#[async_trait]
impl FromRequestParts<AppState> for PublicBaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(base) = &state.config.public_base_url {
            return Ok(PublicBaseUrl(base.clone()));
        }
        let host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or("unknown-host");
        Ok(PublicBaseUrl(format!("https://{host}")))
    }
}

/// Best-effort origin of a request. Recorded, never trusted.
pub struct SourceIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SourceIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        Ok(SourceIdentity(
            forwarded
                .or_else(peer)
                .unwrap_or_else(|| "unknown".to_string()),
        ))
    }
}
