//! REST surface over the student store.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::ApiError;
use crate::model::{Student, StudentId, StudentInput};
use crate::query::{ListParams, PageRequest, PageResult, QueryDefaults};
use crate::store::SqliteStore;

#[derive(Clone)]
pub struct HttpState {
    store: Arc<SqliteStore>,
    defaults: QueryDefaults,
}

/// Routes are served at the root and mirrored under `/api`.
pub fn router(store: Arc<SqliteStore>, defaults: QueryDefaults) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/students", get(list_students).post(create_student))
        .route("/students/groups", get(list_groups))
        .route("/students/{id}", put(update_student).delete(delete_student));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(HttpState { store, defaults })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        }
        let mut body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Self::Infrastructure { retryable, .. } = &self {
            body["retryable"] = json!(retryable);
        }
        (status, Json(json!({ "error": body }))).into_response()
    }
}

/// Runs a store call on the blocking pool; SQLite I/O must not stall the
/// async workers.
async fn with_store<T, F>(state: &HttpState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&SqliteStore) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| ApiError::unavailable(format!("store task failed: {e}")))?
}

fn json_body(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<StudentInput, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::bad_params(e.body_text()))?;
    StudentInput::from_json(&value)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// Query pairs are taken raw so repeated keys resolve to their last value
/// instead of failing extraction.
async fn list_students(
    State(state): State<HttpState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<PageResult>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::bad_params(e.body_text()))?;
    let params = ListParams::from_pairs(pairs);
    let req = PageRequest::from_params(&params, &state.defaults);
    with_store(&state, move |store| store.list(&req))
        .await
        .map(Json)
}

async fn list_groups(State(state): State<HttpState>) -> Result<Json<Vec<String>>, ApiError> {
    with_store(&state, |store| store.groups()).await.map(Json)
}

async fn create_student(
    State(state): State<HttpState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let input = json_body(body)?;
    let student = with_store(&state, move |store| store.create(input)).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_student(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = StudentId::parse(&id)?;
    let input = json_body(body)?;
    with_store(&state, move |store| store.update(&id, input))
        .await
        .map(Json)
}

async fn delete_student(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = StudentId::parse(&id)?;
    let deleted = with_store(&state, move |store| store.delete(&id)).await?;
    Ok(Json(json!({
        "message": "student deleted",
        "deletedRecord": deleted,
    })))
}
