use crate::infra::{
    InMemoryPerformanceRepository, InMemorySubmissionRepository, InMemoryUserDirectory,
    DEMO_ADMIN, DEMO_STUDENT, DEMO_TEACHER,
};
use bonus_review::config::ReviewConfig;
use bonus_review::error::AppError;
use bonus_review::workflows::applications::{
    evaluate, AcademicPaper, CategoryPayload, MilitaryService, ReviewAction, ReviewDecision,
    Submission, SubmissionDraft, SubmissionService, UserId,
};
use bonus_review::workflows::performance::{AcademicPerformance, PerformanceService};
use chrono::{Duration, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Journal tier of the demo paper (e.g. A, B, Nature)
    #[arg(long, default_value = "A")]
    pub(crate) journal: String,
    /// Length of the demo military service record in days
    #[arg(long, default_value_t = 400)]
    pub(crate) service_days: i64,
    /// Bonus override applied by the second-stage reviewer
    #[arg(long)]
    pub(crate) second_stage_bonus: Option<Decimal>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            journal: "A".to_string(),
            service_days: 400,
            second_stage_bonus: None,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding one category payload tagged with "category"
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        journal,
        service_days,
        second_stage_bonus,
    } = args;

    let repository = Arc::new(InMemorySubmissionRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let performance = Arc::new(PerformanceService::new(
        repository.clone(),
        directory.clone(),
        Arc::new(InMemoryPerformanceRepository::default()),
    ));
    let submissions = SubmissionService::new(
        repository,
        directory,
        performance.clone(),
        ReviewConfig::default(),
    );

    let student = UserId(DEMO_STUDENT.to_string());
    let drafts = [demo_paper(journal), demo_military(service_days)];

    println!("Bonus review demo for student {student}");
    for payload in drafts {
        let stored = submissions.submit(&student, draft(payload))?;
        println!(
            "\nSubmitted {} ({}) with {} points",
            stored.id,
            stored.category(),
            stored.bonus_points
        );

        let stages = [
            (DEMO_TEACHER, None),
            (DEMO_TEACHER, second_stage_bonus),
            (DEMO_ADMIN, None),
        ];
        for (reviewer, bonus_points) in stages {
            let outcome = submissions.review(
                &stored.id,
                &UserId(reviewer.to_string()),
                None,
                ReviewAction {
                    decision: ReviewDecision::Passed,
                    comment: Some("materials verified".to_string()),
                    bonus_points,
                },
            )?;
            println!("- {reviewer}: {}", outcome.message);
        }

        render_submission(&submissions.get(&stored.id)?);
    }

    render_performance(&performance.get(&student)?);
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let payload: CategoryPayload = serde_json::from_str(&raw).map_err(std::io::Error::from)?;
    let outcome = evaluate(&payload);

    println!("Category: {}", outcome.category);
    println!("Raw points: {}", outcome.raw);
    println!("Category cap: {}", outcome.cap);
    println!("Awarded points: {}", outcome.points);
    if let Some(key) = payload.natural_key() {
        println!("Uniqueness key: {key}");
    }
    Ok(())
}

fn draft(payload: CategoryPayload) -> SubmissionDraft {
    SubmissionDraft {
        payload,
        estimated_score: Decimal::ZERO,
        user_explanation: None,
        attachments: Vec::new(),
    }
}

fn demo_paper(journal: String) -> CategoryPayload {
    CategoryPayload::AcademicPaper(AcademicPaper {
        paper_title: "Incremental type checking for large monorepos".to_string(),
        journal_category: Some(journal),
        is_independent_author: true,
        is_co_first_author: false,
        author_rank: None,
        is_xmu_first_unit: true,
    })
}

fn demo_military(days: i64) -> CategoryPayload {
    let start = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap_or_default();
    CategoryPayload::MilitaryService(MilitaryService {
        service_start_date: start,
        service_end_date: start + Duration::days(days.max(0)),
        military_unit: None,
    })
}

fn render_submission(submission: &Submission) {
    let view = submission.status_view();
    println!(
        "Final status: {} | bonus {} | result {:?}",
        view.status, view.bonus_points, view.result
    );
    for transition in submission.review.history() {
        println!(
            "  {} -> {} by {}",
            transition.from.label(),
            transition.to.label(),
            transition.actor
        );
    }
}

fn render_performance(record: &AcademicPerformance) {
    println!("\nComposite score for {}", record.student);
    println!("Academic score: {}", record.academic_score);
    println!("Academic expertise: {}", record.academic_expertise_score);
    println!(
        "Comprehensive performance: {}",
        record.comprehensive_performance_score
    );
    println!("Total: {}", record.total_comprehensive_score);
}
