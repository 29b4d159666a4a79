//! HTTP API
//! Mission: Assemble the identity and record gateways into one router

use crate::auth::{auth_router, AuthState, IdentityStore};
use crate::db::Database;
use crate::middleware::request_logging;
use crate::records::{records_router, RecordState, RecordStore};
use anyhow::Result;
use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state shared by every route
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub records: RecordState,
}

impl AppState {
    /// Build both gateways on one database.
    pub fn new(db: Database, bcrypt_cost: u32) -> Result<Self> {
        let identity_store = Arc::new(IdentityStore::new(db.clone(), bcrypt_cost)?);
        let record_store = Arc::new(RecordStore::new(db));
        Ok(Self {
            auth: AuthState::new(identity_store),
            records: RecordState::new(record_store),
        })
    }
}

/// Identity and record routes, unprefixed.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(auth_router(state.auth))
        .merge(records_router(state.records))
}

/// Full application: API under `/api`, health check at the root.
///
/// Request logging wraps the whole app so logged paths keep their `/api` prefix.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", router(state))
        .layer(middleware::from_fn(request_logging))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_and_api_prefix() {
        let state = AppState::new(Database::in_memory().unwrap(), 4).unwrap();
        let app = app(state);

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let unprefixed = app
            .clone()
            .oneshot(Request::builder().uri("/classes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(unprefixed.status(), StatusCode::NOT_FOUND);

        let prefixed = app
            .oneshot(
                Request::builder()
                    .uri("/api/classes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(prefixed.status(), StatusCode::UNAUTHORIZED);
    }
}
