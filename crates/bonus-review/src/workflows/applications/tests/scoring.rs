use rust_decimal::Decimal;

use super::common::*;
use crate::workflows::applications::domain::{
    AcademicCompetition, AwardLevel, CategoryPayload, CompetitionLevel, EnglishScore, ExamType,
    HonoraryTitle, InnovationProject, InternationalInternship, PatentAuthorType, PatentWork,
    RecognitionLevel, SocialWork, SportsCompetition, SportsLevel, TeamRole, VolunteerService,
    VolunteerServiceType,
};
use crate::workflows::applications::scoring::{compute, evaluate};

fn competition(level: CompetitionLevel, award: Option<AwardLevel>) -> CategoryPayload {
    CategoryPayload::AcademicCompetition(AcademicCompetition {
        competition_level: level,
        competition_name: "ACM-ICPC".to_string(),
        competition_specific_name: None,
        award_level: award,
    })
}

fn volunteer_recognition(
    level: Option<RecognitionLevel>,
    is_team: bool,
    role: Option<TeamRole>,
) -> CategoryPayload {
    CategoryPayload::VolunteerService(VolunteerService {
        service_type: VolunteerServiceType::Recognition,
        activity_name: "Rural teaching".to_string(),
        activity_date: date(2023, 7, 1),
        working_hours: None,
        level,
        is_team,
        team_role: role,
    })
}

#[test]
fn paper_tier_a_independent_earns_ten() {
    assert_eq!(compute(&paper("A", true)).to_string(), "10.0000");
}

#[test]
fn paper_outside_first_unit_earns_nothing() {
    assert_eq!(compute(&paper("A", false)).to_string(), "0.0000");
}

#[test]
fn high_impact_journal_hits_paper_cap() {
    let outcome = evaluate(&paper("Cell Reports", true));
    assert_eq!(outcome.points, Decimal::from(20));
    assert_eq!(outcome.cap, Decimal::from(20));
}

#[test]
fn english_never_awards_points() {
    let payload = CategoryPayload::EnglishScore(EnglishScore {
        exam_type: ExamType::Cet4,
        exam_score: Decimal::from(700),
        exam_date: None,
        meets_standard: None,
    });
    assert_eq!(compute(&payload), Decimal::ZERO);
}

#[test]
fn patent_ratio_follows_author_type() {
    let patent = |author_type, first_unit| {
        CategoryPayload::PatentWork(PatentWork {
            title: "Adaptive cache controller".to_string(),
            author_type,
            is_xmu_first_unit: first_unit,
        })
    };
    assert_eq!(compute(&patent(PatentAuthorType::IndependentAuthor, true)), Decimal::from(2));
    assert_eq!(
        compute(&patent(PatentAuthorType::FirstAuthorExceptTeacher, true)),
        Decimal::new(16, 1)
    );
    assert_eq!(compute(&patent(PatentAuthorType::Other, true)), Decimal::ONE);
    assert_eq!(compute(&patent(PatentAuthorType::IndependentAuthor, false)), Decimal::ZERO);
}

#[test]
fn competition_uses_national_table() {
    assert_eq!(
        compute(&competition(CompetitionLevel::APlus, Some(AwardLevel::FirstPlus))),
        Decimal::from(30)
    );
    assert_eq!(
        compute(&competition(CompetitionLevel::A, Some(AwardLevel::Second))),
        Decimal::from(10)
    );
    assert_eq!(
        compute(&competition(CompetitionLevel::AMinus, None)),
        Decimal::from(2)
    );
    assert_eq!(
        compute(&competition(CompetitionLevel::BPlus, Some(AwardLevel::First))),
        Decimal::ZERO
    );
}

#[test]
fn innovation_project_leader_and_member() {
    let project = |level, leader| {
        CategoryPayload::InnovationProject(InnovationProject {
            project_name: "Campus energy monitor".to_string(),
            project_level: level,
            project_duration: None,
            is_team_leader: leader,
        })
    };
    assert_eq!(compute(&project(RecognitionLevel::National, true)), Decimal::ONE);
    assert_eq!(
        compute(&project(RecognitionLevel::Provincial, false)),
        Decimal::new(2, 1)
    );
    assert_eq!(
        compute(&project(RecognitionLevel::University, false)),
        Decimal::new(5, 2)
    );
    assert_eq!(compute(&project(RecognitionLevel::Other, true)), Decimal::ZERO);
}

#[test]
fn internship_duration_tiers() {
    let internship = |duration: &str| {
        CategoryPayload::InternationalInternship(InternationalInternship {
            organization_name: "Max Planck Institute".to_string(),
            internship_duration: duration.to_string(),
            country: Some("Germany".to_string()),
        })
    };
    assert_eq!(compute(&internship("一年")), Decimal::ONE);
    assert_eq!(compute(&internship("18 months")), Decimal::ONE);
    assert_eq!(compute(&internship("6个月")), Decimal::new(5, 1));
    assert_eq!(compute(&internship("2个月")).to_string(), "0.1667");
    assert_eq!(compute(&internship("a summer")), Decimal::ZERO);
    assert_eq!(compute(&internship("2023年7月至2023年9月")), Decimal::ZERO);
    assert_eq!(compute(&internship("1 year 6 months")), Decimal::ONE);
    assert_eq!(compute(&internship("一年零6个月")), Decimal::ONE);
}

#[test]
fn military_service_thresholds() {
    assert_eq!(compute(&military(400)).to_string(), "1.0000");
    assert_eq!(compute(&military(730)), Decimal::from(2));
    assert_eq!(compute(&military(364)), Decimal::ZERO);
}

#[test]
fn volunteer_hours_are_capped_at_one() {
    let payload = CategoryPayload::VolunteerService(VolunteerService {
        service_type: VolunteerServiceType::Hours,
        activity_name: "Museum guide".to_string(),
        activity_date: date(2023, 10, 1),
        working_hours: Some(Decimal::from(500)),
        level: None,
        is_team: false,
        team_role: None,
    });
    assert_eq!(compute(&payload), Decimal::ONE);
}

#[test]
fn volunteer_recognition_table() {
    assert_eq!(
        compute(&volunteer_recognition(
            Some(RecognitionLevel::National),
            true,
            Some(TeamRole::Member)
        )),
        Decimal::new(5, 1)
    );
    assert_eq!(
        compute(&volunteer_recognition(
            Some(RecognitionLevel::Provincial),
            true,
            None
        )),
        Decimal::new(25, 2)
    );
    assert_eq!(
        compute(&volunteer_recognition(None, false, None)),
        Decimal::new(25, 2)
    );
    assert_eq!(
        compute(&volunteer_recognition(
            Some(RecognitionLevel::College),
            false,
            None
        )),
        Decimal::ZERO
    );
}

#[test]
fn honor_defaults_to_university_level() {
    let payload = CategoryPayload::HonoraryTitle(HonoraryTitle {
        title_name: Some("三好学生".to_string()),
        awarding_organization: None,
        awarding_date: None,
        level: None,
        is_collective: false,
    });
    assert_eq!(compute(&payload), Decimal::new(2, 1));
}

#[test]
fn social_work_is_capped_at_two() {
    let payload = CategoryPayload::SocialWork(SocialWork {
        position: "院学生会主席团成员".to_string(),
        work_duration: "一年".to_string(),
        performance_score: Decimal::from(100),
        position_coefficient: Some(Decimal::from(3)),
        organization: "Student union".to_string(),
        work_period: "2023".to_string(),
        work_description: None,
    });
    assert_eq!(compute(&payload), Decimal::from(2));
}

#[test]
fn sports_team_split_matches_scenario() {
    assert_eq!(compute(&sports(4)).to_string(), "1.2500");
}

#[test]
fn sports_single_member_team_divides_by_three() {
    assert_eq!(compute(&sports(1)).to_string(), "1.6667");
}

#[test]
fn sports_unknown_level_scores_zero() {
    let payload = CategoryPayload::SportsCompetition(SportsCompetition {
        competition_name: "Dorm cup".to_string(),
        competition_level: Some(SportsLevel::School),
        achievement: None,
        is_team_project: false,
        team_size: 1,
        competition_date: None,
    });
    assert_eq!(compute(&payload), Decimal::ZERO);
}

#[test]
fn every_rule_stays_within_bounds_and_is_deterministic() {
    let samples = vec![
        paper("Nature", true),
        paper("B", true),
        competition(CompetitionLevel::APlus, Some(AwardLevel::First)),
        military(5000),
        sports(1),
        sports(12),
        volunteer_recognition(Some(RecognitionLevel::National), true, Some(TeamRole::Leader)),
    ];

    for payload in samples {
        let first = evaluate(&payload);
        assert!(first.points >= Decimal::ZERO);
        assert!(first.points <= payload.category().bonus_cap());
        assert_eq!(first, evaluate(&payload));
    }
}
