mod academic;
mod comprehensive;

pub use academic::{competition_points, CompetitionScale};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::domain::{Category, CategoryPayload};

/// CET-4 and CET-6 share the same pass line.
pub const ENGLISH_PASSING_SCORE: u32 = 425;

const POINT_SCALE: u32 = 4;

/// Per-category formula turning submitted facts into uncapped bonus points.
///
/// Implementations never fail: unknown or missing inputs fall back to a fixed
/// default, usually zero.
pub trait ScoreRule {
    fn raw_points(&self) -> Decimal;
}

/// Audit record for one rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub category: Category,
    pub raw: Decimal,
    pub cap: Decimal,
    pub points: Decimal,
}

pub fn evaluate(payload: &CategoryPayload) -> ScoreOutcome {
    let raw = match payload {
        CategoryPayload::EnglishScore(inner) => inner.raw_points(),
        CategoryPayload::AcademicPaper(inner) => inner.raw_points(),
        CategoryPayload::PatentWork(inner) => inner.raw_points(),
        CategoryPayload::AcademicCompetition(inner) => inner.raw_points(),
        CategoryPayload::InnovationProject(inner) => inner.raw_points(),
        CategoryPayload::CcfCspCertification(inner) => inner.raw_points(),
        CategoryPayload::InternationalInternship(inner) => inner.raw_points(),
        CategoryPayload::MilitaryService(inner) => inner.raw_points(),
        CategoryPayload::VolunteerService(inner) => inner.raw_points(),
        CategoryPayload::HonoraryTitle(inner) => inner.raw_points(),
        CategoryPayload::SocialWork(inner) => inner.raw_points(),
        CategoryPayload::SportsCompetition(inner) => inner.raw_points(),
    };

    let category = payload.category();
    let cap = category.bonus_cap();
    let points = round_points(raw.max(Decimal::ZERO).min(cap));

    ScoreOutcome {
        category,
        raw: round_points(raw),
        cap,
        points,
    }
}

/// Bounded, rounded bonus points for a payload.
pub fn compute(payload: &CategoryPayload) -> Decimal {
    evaluate(payload).points
}

/// Four decimal places, banker's rounding.
pub fn round_points(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(POINT_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(POINT_SCALE);
    rounded
}

pub fn meets_english_standard(score: Decimal) -> bool {
    score >= Decimal::from(ENGLISH_PASSING_SCORE)
}

/// `mantissa / 10^scale`, for table constants.
pub(crate) fn points(mantissa: i64, scale: u32) -> Decimal {
    Decimal::new(mantissa, scale)
}
