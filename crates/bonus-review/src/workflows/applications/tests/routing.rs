use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::config::ReviewConfig;
use crate::workflows::applications::domain::ExamType;
use crate::workflows::applications::repository::SubmissionRepository;
use crate::workflows::applications::review::ReviewDecision;
use crate::workflows::applications::router::{
    review_handler, submit_handler, ReviewRequest, SubmitRequest,
};
use crate::workflows::applications::{application_router, SubmissionService};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn submit_handler_returns_created_view() {
    let (service, _, _) = build_service();

    let response = submit_handler::<MemoryRepository, MemoryDirectory, RecordingTrigger>(
        State(service),
        Json(SubmitRequest {
            owner: uid(STUDENT),
            draft: draft(sports(4)),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["category"], "sports_competition");
    assert_eq!(payload["bonus_points"], "1.2500");
}

#[tokio::test]
async fn submit_handler_maps_validation_to_unprocessable() {
    let (service, _, _) = build_service();

    let response = submit_handler::<MemoryRepository, MemoryDirectory, RecordingTrigger>(
        State(service),
        Json(SubmitRequest {
            owner: uid(STUDENT),
            draft: english_draft(ExamType::Cet4, 900),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(SubmissionService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryDirectory::default()),
        Arc::new(RecordingTrigger::default()),
        ReviewConfig::default(),
    ));

    let response = submit_handler::<UnavailableRepository, MemoryDirectory, RecordingTrigger>(
        State(service),
        Json(SubmitRequest {
            owner: uid(STUDENT),
            draft: draft(military(400)),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn review_handler_maps_authorization_to_forbidden() {
    let (service, _, _) = build_service();
    let stored = service
        .submit(&uid(STUDENT), draft(military(400)))
        .expect("submitted");

    let response = review_handler::<MemoryRepository, MemoryDirectory, RecordingTrigger>(
        State(service),
        Path(stored.id.to_string()),
        Json(ReviewRequest {
            reviewer: uid(FOREIGN_TEACHER),
            stage: None,
            decision: ReviewDecision::Passed,
            comment: None,
            bonus_points: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_route_reports_new_status() {
    let (service, _, _) = build_service();
    let stored = service
        .submit(&uid(STUDENT), draft(paper("A", true)))
        .expect("submitted");
    let router = application_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{}/review", stored.id),
            json!({ "reviewer": TEACHER, "decision": "passed" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["new_status"], "first_approved");
}

#[tokio::test]
async fn second_stage_before_first_is_conflict() {
    let (service, _, _) = build_service();
    let stored = service
        .submit(&uid(STUDENT), draft(paper("A", true)))
        .expect("submitted");
    let router = application_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{}/review", stored.id),
            json!({ "reviewer": ADMIN, "stage": "second", "decision": "passed" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_route_accepts_tagged_payloads() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            json!({
                "owner": STUDENT,
                "draft": {
                    "payload": {
                        "category": "military_service",
                        "service_start_date": "2021-09-01",
                        "service_end_date": "2023-09-15"
                    },
                    "estimated_score": "2"
                }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["bonus_points"], "2.0000");
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/applications/6f1c2a7e-3b0a-4e5e-9d3f-1d2b3c4d5e6f")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_submission_id_is_bad_request() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/applications/not-a-uuid")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_route_reports_per_item_results() {
    let (service, _, _) = build_service();
    let stored = service
        .submit(&uid(STUDENT), draft(military(400)))
        .expect("submitted");
    let router = application_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/reviews/batch",
            json!({
                "reviewer": TEACHER,
                "ids": [stored.id, "6f1c2a7e-3b0a-4e5e-9d3f-1d2b3c4d5e6f"],
                "decision": "passed"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["succeeded"], 1);
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["results"][1]["success"], false);
}

#[tokio::test]
async fn delete_route_uses_actor_query() {
    let (service, repository, _) = build_service();
    let stored = service
        .submit(&uid(STUDENT), draft(military(400)))
        .expect("submitted");
    let router = application_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/applications/{}?actor={STUDENT}", stored.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(repository.fetch(&stored.id).expect("fetch").is_none());
}

#[tokio::test]
async fn stats_route_returns_counts() {
    let (service, _, _) = build_service();
    service
        .submit(&uid(STUDENT), draft(military(400)))
        .expect("submitted");
    let router = application_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/applications/stats?student={STUDENT}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"]["pending"], 1);
    assert_eq!(payload["by_category"]["military_service"]["pending"], 1);
}
