//! Request context for verification routes
//!
//! Authentication happens upstream. The identity layer forwards the
//! authenticated user id in a trusted header; owner routes require it.
//! Token routes carry no identity, only client details for the audit log.

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::id::UserId;
use platform::client::{ClientContext, extract_client_context};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::error::VerificationError;

/// The authenticated caller, inserted as a request extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
}

/// Middleware that requires an identity header
pub async fn require_identity(
    State(config): State<Arc<VerificationConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, VerificationError> {
    let user_id = req
        .headers()
        .get(config.identity_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<UserId>().ok())
        .ok_or_else(|| {
            tracing::debug!(header = %config.identity_header, "Missing or malformed identity header");
            VerificationError::Unauthenticated
        })?;

    req.extensions_mut().insert(CurrentUser { user_id });
    Ok(next.run(req).await)
}

/// Extractor for who is on the other end of a token link
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub ClientContext);

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(ClientInfo(extract_client_context(&parts.headers, direct_ip)))
    }
}
