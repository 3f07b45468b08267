use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bonus_review::workflows::applications::{
    application_router, PerformanceTrigger, SubmissionRepository, SubmissionService,
    UserDirectory,
};
use bonus_review::workflows::performance::{
    performance_router, PerformanceRepository, PerformanceService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_review_routes<R, U, T, P>(
    submissions: Arc<SubmissionService<R, U, T>>,
    performance: Arc<PerformanceService<R, U, P>>,
) -> Router
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
    P: PerformanceRepository + 'static,
{
    application_router(submissions)
        .merge(performance_router(performance))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        InMemoryPerformanceRepository, InMemorySubmissionRepository, InMemoryUserDirectory,
        DEMO_ADMIN, DEMO_STUDENT, DEMO_TEACHER,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bonus_review::config::ReviewConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    fn build_router() -> Router {
        let repository = Arc::new(InMemorySubmissionRepository::default());
        let directory = Arc::new(InMemoryUserDirectory::default());
        let performance = Arc::new(PerformanceService::new(
            repository.clone(),
            directory.clone(),
            Arc::new(InMemoryPerformanceRepository::default()),
        ));
        let submissions = Arc::new(SubmissionService::new(
            repository,
            directory,
            performance.clone(),
            ReviewConfig::default(),
        ));
        with_review_routes(submissions, performance)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body reads");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn approval_flows_into_performance_record() {
        let router = build_router();

        let (status, created) = send(
            &router,
            json_request(
                "POST",
                "/api/v1/applications",
                json!({
                    "owner": DEMO_STUDENT,
                    "draft": {
                        "payload": {
                            "category": "academic_paper",
                            "paper_title": "Learned index structures",
                            "journal_category": "A",
                            "is_independent_author": true,
                            "is_xmu_first_unit": true
                        }
                    }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["submission_id"].as_str().expect("id present").to_string();

        for reviewer in [DEMO_TEACHER, DEMO_TEACHER, DEMO_ADMIN] {
            let (status, _) = send(
                &router,
                json_request(
                    "POST",
                    &format!("/api/v1/applications/{id}/review"),
                    json!({ "reviewer": reviewer, "decision": "passed" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, record) = send(
            &router,
            Request::builder()
                .uri(format!("/api/v1/performance/{DEMO_STUDENT}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["academic_expertise_score"], "10.0000");
    }

    #[tokio::test]
    async fn recalculate_all_requires_admin() {
        let router = build_router();

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/api/v1/performance/recalculate-all",
                json!({ "actor": DEMO_TEACHER }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, summary) = send(
            &router,
            json_request(
                "POST",
                "/api/v1/performance/recalculate-all",
                json!({ "actor": DEMO_ADMIN }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total"], 2);
    }
}
