use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Targets that follow `APP_LOG_LEVEL`. Everything else stays at `warn`.
const SERVICE_TARGETS: &[&str] = &["bonus_review", "bonus_review_api"];

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("APP_LOG_LEVEL '{value}' is not a valid log filter")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("review service log subscriber already installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expand a bare level into per-crate directives. Anything holding `=` or `,` is
/// taken as a complete filter.
pub(crate) fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    SERVICE_TARGETS
        .iter()
        .fold(String::from("warn"), |mut directives, target| {
            directives.push_str(&format!(",{target}={level}"));
            directives
        })
}

/// `RUST_LOG` wins when it parses. Otherwise the configured level is used.
pub(crate) fn build_filter(
    rust_log: Option<&str>,
    config: &TelemetryConfig,
) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }

    EnvFilter::try_new(filter_directives(&config.log_level)).map_err(|source| {
        TelemetryError::Filter {
            value: config.log_level.clone(),
            source,
        }
    })
}

/// Install the global subscriber for the review service.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(rust_log.as_deref(), config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
