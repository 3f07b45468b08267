use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryPerformanceRepository, InMemorySubmissionRepository, InMemoryUserDirectory,
};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bonus_review::config::AppConfig;
use bonus_review::error::AppError;
use bonus_review::telemetry;
use bonus_review::workflows::applications::SubmissionService;
use bonus_review::workflows::performance::PerformanceService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemorySubmissionRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let performance_service = Arc::new(PerformanceService::new(
        repository.clone(),
        directory.clone(),
        Arc::new(InMemoryPerformanceRepository::default()),
    ));
    let submission_service = Arc::new(SubmissionService::new(
        repository,
        directory,
        performance_service.clone(),
        config.review,
    ));

    let app = with_review_routes(submission_service, performance_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        batch_limit = config.review.batch_limit,
        "bonus review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
