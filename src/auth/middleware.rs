//! Authentication Middleware
//! Mission: Resolve the caller's identity token before any record access

use crate::auth::models::IdentityToken;
use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

/// Header carrying the caller's identity token. The only supported transport.
pub const IDENTITY_HEADER: &str = "user-id";

/// Rejects requests without a syntactically valid identity token and stores the token in
/// the request extensions for handlers.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(IdentityToken::parse)
        .ok_or_else(|| {
            debug!(path = %req.uri().path(), "Rejected request without a valid identity token");
            ApiError::Unauthorized("Unauthorized".to_string())
        })?;

    req.extensions_mut().insert(token);

    Ok(next.run(req).await)
}
