use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::workflows::applications::{RepositoryError, SubmissionRepository, UserDirectory, UserId};

use super::repository::PerformanceRepository;
use super::service::{PerformanceError, PerformanceService};

impl PerformanceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PerformanceError::UnknownUser(_)
            | PerformanceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            PerformanceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PerformanceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            PerformanceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PerformanceError {
    fn into_response(self) -> Response {
        let payload = json!({
            "success": false,
            "message": self.to_string(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    pub actor: UserId,
    pub student: UserId,
}

#[derive(Debug, Deserialize)]
pub struct RecalculateAllRequest {
    pub actor: UserId,
}

/// Router builder exposing on-demand aggregation endpoints.
pub fn performance_router<S, U, P>(service: Arc<PerformanceService<S, U, P>>) -> Router
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/performance/recalculate",
            post(recalculate_handler::<S, U, P>),
        )
        .route(
            "/api/v1/performance/recalculate-all",
            post(recalculate_all_handler::<S, U, P>),
        )
        .route(
            "/api/v1/performance/:student_id",
            get(fetch_handler::<S, U, P>),
        )
        .with_state(service)
}

pub(crate) async fn recalculate_handler<S, U, P>(
    State(service): State<Arc<PerformanceService<S, U, P>>>,
    Json(request): Json<RecalculateRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    match service.recompute_for(&request.actor, &request.student) {
        Ok(record) => {
            let payload = json!({ "success": true, "performance": record });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn recalculate_all_handler<S, U, P>(
    State(service): State<Arc<PerformanceService<S, U, P>>>,
    Json(request): Json<RecalculateAllRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    match service.recompute_all(&request.actor) {
        Ok(summary) => {
            let payload = json!({
                "success": true,
                "succeeded": summary.succeeded,
                "total": summary.total,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn fetch_handler<S, U, P>(
    State(service): State<Arc<PerformanceService<S, U, P>>>,
    Path(student_id): Path<String>,
) -> Response
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    match service.get(&UserId(student_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}
