use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflows::applications::scoring::round_points;
use crate::workflows::applications::{ReviewStatus, ScoreBucket, Submission};

const GPA_SCALE: i64 = 4;
const ACADEMIC_WEIGHT: i64 = 80;
const ACADEMIC_EXPERTISE_CAP: i64 = 15;
const COMPREHENSIVE_PERFORMANCE_CAP: i64 = 5;
const TOTAL_CAP: i64 = 100;

/// The four computed figures of a student's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub academic_score: Decimal,
    pub academic_expertise_score: Decimal,
    pub comprehensive_performance_score: Decimal,
    pub total_comprehensive_score: Decimal,
}

fn clamp(value: Decimal, max: i64) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::from(max))
}

/// GPA on a 4.0 scale mapped onto 0..=80. Missing GPA counts as zero.
pub fn academic_score(gpa: Option<Decimal>) -> Decimal {
    let gpa = gpa.unwrap_or_default();
    round_points(clamp(
        gpa / Decimal::from(GPA_SCALE) * Decimal::from(ACADEMIC_WEIGHT),
        ACADEMIC_WEIGHT,
    ))
}

/// Sum approved bonus points per bucket, cap each bucket, and add the GPA share.
pub fn composite<'a>(
    gpa: Option<Decimal>,
    submissions: impl IntoIterator<Item = &'a Submission>,
) -> CompositeScore {
    let mut expertise = Decimal::ZERO;
    let mut comprehensive = Decimal::ZERO;

    for submission in submissions
        .into_iter()
        .filter(|submission| submission.review.status() == ReviewStatus::Approved)
    {
        match submission.category().bucket() {
            ScoreBucket::AcademicExpertise => expertise += submission.bonus_points,
            ScoreBucket::ComprehensivePerformance => comprehensive += submission.bonus_points,
        }
    }

    let academic_score = academic_score(gpa);
    let academic_expertise_score = round_points(clamp(expertise, ACADEMIC_EXPERTISE_CAP));
    let comprehensive_performance_score =
        round_points(clamp(comprehensive, COMPREHENSIVE_PERFORMANCE_CAP));
    let total_comprehensive_score = round_points(clamp(
        academic_score + academic_expertise_score + comprehensive_performance_score,
        TOTAL_CAP,
    ));

    CompositeScore {
        academic_score,
        academic_expertise_score,
        comprehensive_performance_score,
        total_comprehensive_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpa_maps_onto_eighty_points() {
        assert_eq!(academic_score(Some(Decimal::new(35, 1))), Decimal::from(70));
        assert_eq!(academic_score(Some(Decimal::new(45, 1))), Decimal::from(80));
        assert_eq!(academic_score(None), Decimal::ZERO);
        assert_eq!(academic_score(Some(Decimal::from(-1))), Decimal::ZERO);
    }

    #[test]
    fn empty_history_scores_gpa_only() {
        let score = composite(Some(Decimal::from(4)), std::iter::empty::<&Submission>());
        assert_eq!(score.academic_score, Decimal::from(80));
        assert_eq!(score.academic_expertise_score, Decimal::ZERO);
        assert_eq!(score.total_comprehensive_score, Decimal::from(80));
    }
}
