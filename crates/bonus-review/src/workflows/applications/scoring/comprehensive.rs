use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::super::domain::{
    Achievement, HonoraryTitle, InternationalInternship, MilitaryService, RecognitionLevel,
    SocialWork, SportsCompetition, SportsLevel, TeamRole, VolunteerService, VolunteerServiceType,
};
use super::{points, ScoreRule};

static MONTHS_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static YEARS_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

const VOLUNTEER_HOURS_FLOOR: i64 = 200;

/// Position keywords and their coefficients. More specific titles precede the
/// titles they contain.
const POSITION_COEFFICIENTS: &[(&str, i64, u32)] = &[
    ("院学生会执行主席", 20, 1),
    ("系团总支书记", 75, 2),
    ("团总支书记", 20, 1),
    ("院学生会主席团成员", 15, 1),
    ("团总支副书记", 15, 1),
    ("院学生会、团总支各部部长", 10, 1),
    ("党支部书记", 10, 1),
    ("班长", 10, 1),
    ("团支部书记", 10, 1),
    ("院学生会、团总支各部门副部长", 75, 2),
    ("社团社长", 75, 2),
    ("党支部委员", 5, 1),
    ("系团总支各部部长", 5, 1),
    ("各班班委", 5, 1),
    ("团支部委员", 5, 1),
    ("院学生会、团总支长期志愿者", 5, 1),
    ("社团副社长", 5, 1),
    ("社团主要干部", 5, 1),
    ("辩论队队长", 5, 1),
    ("球队队长", 5, 1),
];

fn months_pattern() -> Option<&'static Regex> {
    MONTHS_PATTERN
        .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:个月|months?)").ok())
        .as_ref()
}

fn years_pattern() -> Option<&'static Regex> {
    // At most two integer digits, so calendar years such as 2023年 never match.
    YEARS_PATTERN
        .get_or_init(|| Regex::new(r"(?:^|[^\d.])(\d{1,2}(?:\.\d+)?)\s*(?:年|years?)").ok())
        .as_ref()
}

fn captured_number(pattern: Option<&Regex>, text: &str) -> Option<Decimal> {
    let captures = pattern?.captures(text)?;
    Decimal::from_str(captures.get(1)?.as_str()).ok()
}

fn spelled_years(text: &str) -> Option<Decimal> {
    if text.contains("一年半") || text.contains("a year and a half") {
        Some(points(15, 1))
    } else if text.contains("一年")
        || text.contains("one year")
        || (text.contains("a year") && !text.contains("half a year"))
    {
        Some(Decimal::ONE)
    } else {
        None
    }
}

/// Months of internship described by free text, if any can be recognised.
/// A year part and a month part are added together.
pub(crate) fn internship_months(duration: &str) -> Option<Decimal> {
    let text = duration.trim().to_lowercase();

    let years = captured_number(years_pattern(), &text).or_else(|| spelled_years(&text));
    let months = captured_number(months_pattern(), &text);

    match (years, months) {
        (None, None) => {
            if text.contains("半年") || text.contains("half year") || text.contains("half a year") {
                Some(Decimal::from(6))
            } else {
                None
            }
        }
        (years, months) => {
            Some(years.unwrap_or_default() * Decimal::from(12) + months.unwrap_or_default())
        }
    }
}

impl ScoreRule for InternationalInternship {
    fn raw_points(&self) -> Decimal {
        match internship_months(&self.internship_duration) {
            Some(months) if months >= Decimal::from(12) => Decimal::ONE,
            Some(months) if months >= Decimal::from(6) => points(5, 1),
            Some(months) => months / Decimal::from(12),
            None => Decimal::ZERO,
        }
    }
}

impl ScoreRule for MilitaryService {
    fn raw_points(&self) -> Decimal {
        let days = (self.service_end_date - self.service_start_date).num_days();
        if days >= 730 {
            Decimal::from(2)
        } else if days >= 365 {
            Decimal::ONE
        } else {
            Decimal::ZERO
        }
    }
}

impl ScoreRule for VolunteerService {
    fn raw_points(&self) -> Decimal {
        match self.service_type {
            VolunteerServiceType::Hours => {
                let hours = self.working_hours.unwrap_or_default();
                let floor = Decimal::from(VOLUNTEER_HOURS_FLOOR);
                if hours <= floor {
                    return Decimal::ZERO;
                }
                (hours - floor) / Decimal::from(2) * points(5, 2)
            }
            VolunteerServiceType::Recognition => {
                let (leader, member, individual) =
                    match self.level.unwrap_or(RecognitionLevel::University) {
                        RecognitionLevel::National => (points(10, 1), points(5, 1), points(10, 1)),
                        RecognitionLevel::Provincial => {
                            (points(5, 1), points(25, 2), points(5, 1))
                        }
                        RecognitionLevel::University => {
                            (points(25, 2), points(10, 2), points(25, 2))
                        }
                        RecognitionLevel::College | RecognitionLevel::Other => {
                            return Decimal::ZERO
                        }
                    };

                if !self.is_team {
                    return individual;
                }
                match self.team_role.unwrap_or(TeamRole::Member) {
                    TeamRole::Leader => leader,
                    TeamRole::Member | TeamRole::Other => member,
                }
            }
        }
    }
}

impl ScoreRule for HonoraryTitle {
    fn raw_points(&self) -> Decimal {
        let base = match self.level.unwrap_or(RecognitionLevel::University) {
            RecognitionLevel::National => Decimal::from(2),
            RecognitionLevel::Provincial => Decimal::ONE,
            RecognitionLevel::University => points(2, 1),
            RecognitionLevel::College => points(1, 1),
            RecognitionLevel::Other => Decimal::ZERO,
        };

        if self.is_collective {
            base / Decimal::from(2)
        } else {
            base
        }
    }
}

/// Coefficient for a position: an explicit non-default value wins, then the keyword table.
pub(crate) fn position_coefficient(work: &SocialWork) -> Decimal {
    if let Some(explicit) = work.position_coefficient {
        if explicit != Decimal::ONE {
            return explicit;
        }
    }

    POSITION_COEFFICIENTS
        .iter()
        .find(|(keyword, _, _)| work.position.contains(keyword))
        .map(|(_, mantissa, scale)| points(*mantissa, *scale))
        .unwrap_or(Decimal::ONE)
}

impl ScoreRule for SocialWork {
    fn raw_points(&self) -> Decimal {
        let duration = self.work_duration.to_lowercase();
        let base = position_coefficient(self) * self.performance_score / Decimal::from(100);

        // Half a year wins over a mentioned semester: "半年（超过一学期）" is halved.
        if duration.contains("半年") || duration.contains("6个月") || duration.contains("half year")
        {
            base / Decimal::from(2)
        } else if duration.contains("一学期")
            || duration.contains("3个月")
            || duration.contains("one semester")
        {
            Decimal::ZERO
        } else {
            base
        }
    }
}

impl ScoreRule for SportsCompetition {
    fn raw_points(&self) -> Decimal {
        let level = self.competition_level.unwrap_or(SportsLevel::National);
        let achievement = self.achievement.unwrap_or(Achievement::FourthToEighth);

        // Tenths of a point: champion, runner-up, third, fourth to eighth.
        let row: [i64; 4] = match level {
            SportsLevel::International => [80, 65, 50, 35],
            SportsLevel::National => [50, 35, 20, 10],
            SportsLevel::Provincial | SportsLevel::School | SportsLevel::Other => {
                return Decimal::ZERO
            }
        };
        let base = match achievement {
            Achievement::Champion => points(row[0], 1),
            Achievement::RunnerUp => points(row[1], 1),
            Achievement::ThirdPlace => points(row[2], 1),
            Achievement::FourthToEighth => points(row[3], 1),
            Achievement::Other => return Decimal::ZERO,
        };

        let divisor = if self.is_team_project && self.team_size > 1 {
            Decimal::from(self.team_size)
        } else {
            Decimal::from(3)
        };

        base / divisor
    }
}
