//! Composite score aggregation over approved submissions.

pub mod engine;
pub mod repository;
pub mod router;
pub mod service;

pub use engine::{academic_score, composite, CompositeScore};
pub use repository::{AcademicPerformance, PerformanceRepository, DEFAULT_RANKING_DIMENSION};
pub use router::performance_router;
pub use service::{PerformanceError, PerformanceService, RecomputeSummary};
