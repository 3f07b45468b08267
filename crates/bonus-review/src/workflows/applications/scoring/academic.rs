use rust_decimal::Decimal;

use super::super::domain::{
    AcademicCompetition, AcademicPaper, AwardLevel, CcfCspCertification, CompetitionLevel,
    EnglishScore, InnovationProject, PatentAuthorType, PatentWork, RecognitionLevel,
};
use super::{points, ScoreRule};

const HIGH_IMPACT_JOURNALS: &[&str] = &["Nature", "Science", "Cell", "CELL"];

/// English results are a pass/fail gate only.
impl ScoreRule for EnglishScore {
    fn raw_points(&self) -> Decimal {
        Decimal::ZERO
    }
}

impl ScoreRule for AcademicPaper {
    fn raw_points(&self) -> Decimal {
        if !self.is_xmu_first_unit {
            return Decimal::ZERO;
        }

        journal_base(self.journal_category.as_deref()) * author_ratio(self)
    }
}

fn journal_base(journal_category: Option<&str>) -> Decimal {
    let Some(tier) = journal_category.map(str::trim) else {
        return Decimal::ZERO;
    };

    if HIGH_IMPACT_JOURNALS
        .iter()
        .any(|journal| tier.contains(journal))
    {
        return Decimal::from(20);
    }

    match tier {
        "A" | "A+" | "A++" => Decimal::from(10),
        "B" => Decimal::from(6),
        "C" => Decimal::ONE,
        _ => Decimal::ZERO,
    }
}

fn author_ratio(paper: &AcademicPaper) -> Decimal {
    if paper.is_independent_author {
        return Decimal::ONE;
    }
    if paper.is_co_first_author {
        return points(5, 1);
    }

    let rank = paper.author_rank.as_deref().map(str::trim).unwrap_or_default();
    if rank.is_empty() {
        return Decimal::ZERO;
    }

    match rank.parse::<i64>() {
        Ok(1) => points(8, 1),
        Ok(2) => points(2, 1),
        Ok(_) => Decimal::ZERO,
        Err(_) => points(5, 1),
    }
}

impl ScoreRule for PatentWork {
    fn raw_points(&self) -> Decimal {
        if !self.is_xmu_first_unit {
            return Decimal::ZERO;
        }

        let ratio = match self.author_type {
            PatentAuthorType::IndependentAuthor => Decimal::ONE,
            PatentAuthorType::FirstAuthorExceptTeacher => points(8, 1),
            PatentAuthorType::Other => points(5, 1),
        };

        Decimal::from(2) * ratio
    }
}

/// Administrative scale a competition is judged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitionScale {
    National,
    Provincial,
}

/// Points for one competition result. A missing award counts as third prize.
pub fn competition_points(
    level: CompetitionLevel,
    award: Option<AwardLevel>,
    scale: CompetitionScale,
) -> Decimal {
    let column = match award.unwrap_or(AwardLevel::Third) {
        AwardLevel::FirstPlus => 0,
        AwardLevel::First => 1,
        AwardLevel::Second => 2,
        AwardLevel::Third => 3,
        AwardLevel::Other => return Decimal::ZERO,
    };

    // Tenths of a point, ordered first_plus, first, second, third.
    let row: [i64; 4] = match (scale, level) {
        (CompetitionScale::National, CompetitionLevel::APlus) => [300, 300, 150, 100],
        (CompetitionScale::National, CompetitionLevel::A) => [150, 150, 100, 50],
        (CompetitionScale::National, CompetitionLevel::AMinus) => [100, 100, 50, 20],
        (CompetitionScale::Provincial, CompetitionLevel::APlus) => [50, 50, 20, 10],
        (CompetitionScale::Provincial, CompetitionLevel::A) => [20, 20, 10, 5],
        (CompetitionScale::Provincial, CompetitionLevel::AMinus) => [10, 10, 5, 0],
        (_, CompetitionLevel::BPlus | CompetitionLevel::B | CompetitionLevel::Other) => {
            return Decimal::ZERO
        }
    };

    points(row[column], 1)
}

/// Submissions are always judged at national scale.
impl ScoreRule for AcademicCompetition {
    fn raw_points(&self) -> Decimal {
        competition_points(
            self.competition_level,
            self.award_level,
            CompetitionScale::National,
        )
    }
}

impl ScoreRule for InnovationProject {
    fn raw_points(&self) -> Decimal {
        let (leader, member) = match self.project_level {
            RecognitionLevel::National => (points(10, 1), points(3, 1)),
            RecognitionLevel::Provincial => (points(5, 1), points(2, 1)),
            RecognitionLevel::University => (points(10, 2), points(5, 2)),
            RecognitionLevel::College | RecognitionLevel::Other => return Decimal::ZERO,
        };

        if self.is_team_leader {
            leader
        } else {
            member
        }
    }
}

impl ScoreRule for CcfCspCertification {
    fn raw_points(&self) -> Decimal {
        let band = self
            .csp_rank_percentage
            .as_deref()
            .unwrap_or("3")
            .trim()
            .trim_end_matches('%')
            .trim();

        let Ok(band) = band.parse::<Decimal>() else {
            return Decimal::ZERO;
        };

        if band == points(2, 1) {
            Decimal::from(10)
        } else if band == points(15, 1) {
            Decimal::from(5)
        } else if band == Decimal::from(3) {
            Decimal::from(2)
        } else {
            Decimal::ZERO
        }
    }
}
