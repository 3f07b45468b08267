use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflows::applications::{RepositoryError, UserId};

use super::engine::CompositeScore;

pub const DEFAULT_RANKING_DIMENSION: &str = "default";

/// Per-student aggregate. Course metadata is owned by the registrar import; the
/// score fields are overwritten on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPerformance {
    pub student: UserId,
    pub gpa: Decimal,
    pub weighted_score: Decimal,
    pub total_courses: u32,
    pub total_credits: Decimal,
    #[serde(default)]
    pub gpa_ranking: Option<u32>,
    pub ranking_dimension: String,
    pub failed_courses: u32,
    pub academic_score: Decimal,
    pub academic_expertise_score: Decimal,
    pub comprehensive_performance_score: Decimal,
    pub total_comprehensive_score: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl AcademicPerformance {
    /// Zeroed record for a student seen for the first time.
    pub fn empty(student: UserId, at: DateTime<Utc>) -> Self {
        Self {
            student,
            gpa: Decimal::ZERO,
            weighted_score: Decimal::ZERO,
            total_courses: 0,
            total_credits: Decimal::ZERO,
            gpa_ranking: None,
            ranking_dimension: DEFAULT_RANKING_DIMENSION.to_string(),
            failed_courses: 0,
            academic_score: Decimal::ZERO,
            academic_expertise_score: Decimal::ZERO,
            comprehensive_performance_score: Decimal::ZERO,
            total_comprehensive_score: Decimal::ZERO,
            updated_at: at,
        }
    }

    pub(crate) fn apply(&mut self, gpa: Decimal, score: CompositeScore, at: DateTime<Utc>) {
        self.gpa = gpa;
        self.academic_score = score.academic_score;
        self.academic_expertise_score = score.academic_expertise_score;
        self.comprehensive_performance_score = score.comprehensive_performance_score;
        self.total_comprehensive_score = score.total_comprehensive_score;
        self.updated_at = at;
    }
}

pub trait PerformanceRepository: Send + Sync {
    fn fetch(&self, student: &UserId) -> Result<Option<AcademicPerformance>, RepositoryError>;
    /// Full overwrite of the stored record.
    fn save(&self, record: AcademicPerformance) -> Result<AcademicPerformance, RepositoryError>;
}
