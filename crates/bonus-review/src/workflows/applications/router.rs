use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{SubmissionDraft, SubmissionId, UserId};
use super::repository::{PerformanceTrigger, RepositoryError, SubmissionRepository, UserDirectory};
use super::review::{ReviewAction, ReviewDecision, ReviewError, ReviewStage};
use super::service::{SubmissionService, SubmissionServiceError};

const DEFAULT_QUEUE_LIMIT: usize = 50;

impl SubmissionServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmissionServiceError::Intake(_) | SubmissionServiceError::BatchSize { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SubmissionServiceError::Review(
                ReviewError::Unauthorized { .. } | ReviewError::NotOwner { .. },
            ) => StatusCode::FORBIDDEN,
            SubmissionServiceError::Review(
                ReviewError::InvalidTransition { .. } | ReviewError::InvalidStatus { .. },
            ) => StatusCode::CONFLICT,
            SubmissionServiceError::Review(
                ReviewError::NegativeBonus(_) | ReviewError::MissingReason,
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            SubmissionServiceError::Repository(RepositoryError::NotFound)
            | SubmissionServiceError::UnknownUser(_) => StatusCode::NOT_FOUND,
            SubmissionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            SubmissionServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SubmissionServiceError {
    fn into_response(self) -> Response {
        let payload = json!({
            "success": false,
            "message": self.to_string(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub owner: UserId,
    pub draft: SubmissionDraft,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub actor: UserId,
    pub draft: SubmissionDraft,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: UserId,
}

#[derive(Debug, Deserialize)]
pub struct CollegeOpinionRequest {
    pub actor: UserId,
    pub opinion: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub reviewer: UserId,
    #[serde(default)]
    pub stage: Option<ReviewStage>,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub bonus_points: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct BatchReviewRequest {
    pub reviewer: UserId,
    pub ids: Vec<SubmissionId>,
    #[serde(default)]
    pub stage: Option<ReviewStage>,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub bonus_points: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    #[serde(default)]
    pub student: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Router builder exposing intake and review endpoints.
pub fn application_router<R, U, T>(service: Arc<SubmissionService<R, U, T>>) -> Router
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<R, U, T>).get(list_handler::<R, U, T>),
        )
        .route("/api/v1/applications/stats", get(stats_handler::<R, U, T>))
        .route(
            "/api/v1/applications/:submission_id",
            get(fetch_handler::<R, U, T>)
                .put(update_handler::<R, U, T>)
                .delete(delete_handler::<R, U, T>),
        )
        .route(
            "/api/v1/applications/:submission_id/withdraw",
            post(withdraw_handler::<R, U, T>),
        )
        .route(
            "/api/v1/applications/:submission_id/reopen",
            post(reopen_handler::<R, U, T>),
        )
        .route(
            "/api/v1/applications/:submission_id/review",
            post(review_handler::<R, U, T>),
        )
        .route(
            "/api/v1/applications/:submission_id/college-opinion",
            post(college_opinion_handler::<R, U, T>),
        )
        .route("/api/v1/reviews/batch", post(batch_handler::<R, U, T>))
        .route(
            "/api/v1/reviews/queue/:reviewer_id",
            get(queue_handler::<R, U, T>),
        )
        .with_state(service)
}

type ServiceState<R, U, T> = State<Arc<SubmissionService<R, U, T>>>;

fn submission_id(raw: &str) -> Result<SubmissionId, Response> {
    Uuid::parse_str(raw).map(SubmissionId).map_err(|_| {
        let payload = json!({
            "success": false,
            "message": format!("{raw} is not a valid submission id"),
        });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    })
}

pub(crate) async fn submit_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    match service.submit(&request.owner, request.draft) {
        Ok(submission) => (StatusCode::CREATED, Json(submission.status_view())).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Query(query): Query<StudentQuery>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let Some(student) = query.student else {
        let payload = json!({
            "success": false,
            "message": "student query parameter is required",
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    match service.list_for_student(&student) {
        Ok(submissions) => {
            let views: Vec<_> = submissions.iter().map(|item| item.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn stats_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Query(query): Query<StudentQuery>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    match service.stats(query.student.as_ref()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn fetch_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.get(&id) {
        Ok(submission) => (StatusCode::OK, Json(submission)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.update(&request.actor, &id, request.draft) {
        Ok(submission) => (StatusCode::OK, Json(submission.status_view())).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Query(request): Query<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.delete(&request.actor, &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn withdraw_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.withdraw(&request.actor, &id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn reopen_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.reopen(&request.actor, &id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn review_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let action = ReviewAction {
        decision: request.decision,
        comment: request.comment,
        bonus_points: request.bonus_points,
    };

    match service.review(&id, &request.reviewer, request.stage, action) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn college_opinion_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(raw_id): Path<String>,
    Json(request): Json<CollegeOpinionRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let id = match submission_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.set_college_opinion(&request.actor, &id, request.opinion) {
        Ok(submission) => (StatusCode::OK, Json(submission.status_view())).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn batch_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Json(request): Json<BatchReviewRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let action = ReviewAction {
        decision: request.decision,
        comment: request.comment,
        bonus_points: request.bonus_points,
    };

    match service.review_batch(&request.reviewer, &request.ids, request.stage, action) {
        Ok(results) => {
            let succeeded = results.iter().filter(|item| item.success).count();
            let payload = json!({
                "success": true,
                "succeeded": succeeded,
                "total": results.len(),
                "results": results,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn queue_handler<R, U, T>(
    State(service): ServiceState<R, U, T>,
    Path(reviewer_id): Path<String>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.pending_for(&UserId(reviewer_id), limit) {
        Ok(queue) => {
            let views: Vec<_> = queue.iter().map(|item| item.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
