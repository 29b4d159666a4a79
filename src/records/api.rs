//! Record API Endpoints
//! Mission: Expose the ownership-filtered CRUD gateway over HTTP

use crate::auth::{require_identity, IdentityToken};
use crate::error::ApiError;
use crate::records::{
    kinds::{Deletable, OwnedRecord},
    models::{AttendanceRecord, ClassRecord, DashboardSummary, StudentRecord, TeacherRecord},
    store::{RecordError, RecordStore},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared record state
#[derive(Clone)]
pub struct RecordState {
    pub store: Arc<RecordStore>,
}

impl RecordState {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }
}

/// Record routes. Every route requires the identity header.
pub fn records_router(state: RecordState) -> Router {
    Router::new()
        .route(
            "/classes",
            get(list_records::<ClassRecord>).post(create_record::<ClassRecord>),
        )
        .route("/classes/:id", delete(delete_record::<ClassRecord>))
        .route(
            "/teachers",
            get(list_records::<TeacherRecord>).post(create_record::<TeacherRecord>),
        )
        .route("/teachers/:id", delete(delete_record::<TeacherRecord>))
        .route(
            "/students",
            get(list_records::<StudentRecord>).post(create_record::<StudentRecord>),
        )
        .route("/students/:id", delete(delete_record::<StudentRecord>))
        .route(
            "/attendance",
            get(list_records::<AttendanceRecord>).post(create_record::<AttendanceRecord>),
        )
        .route("/dashboard/summary", get(dashboard_summary))
        .route_layer(middleware::from_fn(require_identity))
        .with_state(state)
}

/// List endpoint - GET /classes | /teachers | /students | /attendance
pub async fn list_records<T: OwnedRecord>(
    State(state): State<RecordState>,
    Extension(owner): Extension<IdentityToken>,
) -> Result<Json<Vec<T::Listing>>, ApiError> {
    let rows = state.store.list::<T>(owner).map_err(|e| api_error(e, T::LABEL))?;
    Ok(Json(rows))
}

/// Create endpoint - POST /classes | /teachers | /students | /attendance
pub async fn create_record<T: OwnedRecord>(
    State(state): State<RecordState>,
    Extension(owner): Extension<IdentityToken>,
    payload: Result<Json<T::Draft>, JsonRejection>,
) -> Result<Json<T>, ApiError> {
    let Json(draft) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let record = state
        .store
        .create::<T>(owner, draft)
        .map_err(|e| api_error(e, T::LABEL))?;
    Ok(Json(record))
}

/// Delete endpoint - DELETE /classes/:id | /teachers/:id | /students/:id
pub async fn delete_record<T: Deletable>(
    State(state): State<RecordState>,
    Extension(owner): Extension<IdentityToken>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .delete::<T>(owner, &id)
        .map_err(|e| api_error(e, T::LABEL))?;
    Ok(Json(json!({ "success": true })))
}

/// Dashboard counts - GET /dashboard/summary
pub async fn dashboard_summary(
    State(state): State<RecordState>,
    Extension(owner): Extension<IdentityToken>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = state
        .store
        .summary(owner)
        .map_err(|e| api_error(e, "Summary"))?;
    Ok(Json(summary))
}

fn api_error(err: RecordError, label: &str) -> ApiError {
    match err {
        RecordError::Validation(msg) => ApiError::Validation(msg),
        RecordError::NotFoundOrUnauthorized => {
            ApiError::NotFoundOrUnauthorized(format!("{} not found or unauthorized", label))
        }
        RecordError::Internal(e) => ApiError::Internal(e),
    }
}
