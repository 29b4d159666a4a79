//! Authentication API Endpoints
//! Mission: Provide signup and login endpoints

use crate::auth::{
    identity_store::{IdentityError, IdentityStore},
    models::{AuthResponse, CredentialsRequest},
};
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

const LOGIN_FAILED: &str = "Email or password not found. Please create an account.";

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub identity_store: Arc<IdentityStore>,
}

impl AuthState {
    pub fn new(identity_store: Arc<IdentityStore>) -> Self {
        Self { identity_store }
    }
}

/// Routes for the identity gateway
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/identity/signup", post(signup))
        .route("/identity/login", post(login))
        .with_state(state)
}

/// Signup endpoint - POST /identity/signup
pub async fn signup(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let (email, secret) = payload
        .into_parts()
        .ok_or_else(|| ApiError::Validation("email and secret are required".to_string()))?;

    let identity = state
        .identity_store
        .register(&email, &secret)
        .map_err(|e| match e {
            IdentityError::EmailTaken => ApiError::Conflict("Email already in use.".to_string()),
            err @ IdentityError::SecretTooLong => ApiError::Validation(err.to_string()),
            IdentityError::Internal(e) => ApiError::Internal(e),
        })?;

    Ok(Json(AuthResponse::for_identity(&identity)))
}

/// Login endpoint - POST /identity/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    // A malformed body is just another failed login.
    let credentials = payload.ok().and_then(|Json(p)| p.into_parts());
    let Some((email, secret)) = credentials else {
        warn!("❌ Login attempt with incomplete credentials");
        return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
    };

    info!("🔐 Login attempt: {}", email);

    let identity = state
        .identity_store
        .authenticate(&email, &secret)?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt: {}", email);
            ApiError::Unauthorized(LOGIN_FAILED.to_string())
        })?;

    info!("✅ Login successful: {} ({})", identity.email, identity.id);

    Ok(Json(AuthResponse::for_identity(&identity)))
}
