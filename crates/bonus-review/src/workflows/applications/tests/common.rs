use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::ReviewConfig;
use crate::workflows::applications::domain::{
    AcademicPaper, Achievement, Attachment, CategoryPayload, EnglishScore, ExamType,
    MilitaryService, SportsCompetition, SportsLevel, Submission, SubmissionDraft, SubmissionId,
    UserId, UserProfile, UserRole,
};
use crate::workflows::applications::repository::{
    PerformanceTrigger, RepositoryError, SubmissionRepository, TriggerError, UserDirectory,
};
use crate::workflows::applications::review::{ReviewAction, ReviewDecision};
use crate::workflows::applications::SubmissionService;

pub(super) const STUDENT: &str = "20230001";
pub(super) const OTHER_STUDENT: &str = "20230002";
pub(super) const TEACHER: &str = "t-informatics";
pub(super) const FOREIGN_TEACHER: &str = "t-physics";
pub(super) const ADMIN: &str = "admin";

pub(super) fn uid(raw: &str) -> UserId {
    UserId(raw.to_string())
}

pub(super) fn profile(id: &str, role: UserRole, college: Option<&str>) -> UserProfile {
    UserProfile {
        id: uid(id),
        name: format!("user {id}"),
        role,
        college: college.map(str::to_string),
        gpa: Some(Decimal::new(35, 1)),
    }
}

pub(super) fn student() -> UserProfile {
    profile(STUDENT, UserRole::Student, Some("informatics"))
}

pub(super) fn teacher() -> UserProfile {
    profile(TEACHER, UserRole::Teacher, Some("informatics"))
}

pub(super) fn foreign_teacher() -> UserProfile {
    profile(FOREIGN_TEACHER, UserRole::Teacher, Some("physics"))
}

pub(super) fn admin() -> UserProfile {
    profile(ADMIN, UserRole::Admin, None)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn draft(payload: CategoryPayload) -> SubmissionDraft {
    SubmissionDraft {
        payload,
        estimated_score: Decimal::ZERO,
        user_explanation: None,
        attachments: Vec::new(),
    }
}

pub(super) fn english_draft(exam_type: ExamType, score: i64) -> SubmissionDraft {
    SubmissionDraft {
        payload: CategoryPayload::EnglishScore(EnglishScore {
            exam_type,
            exam_score: Decimal::from(score),
            exam_date: Some(date(2024, 6, 15)),
            meets_standard: None,
        }),
        estimated_score: Decimal::ZERO,
        user_explanation: None,
        attachments: vec![Attachment {
            field: "score_report".to_string(),
            storage_key: "uploads/cet.pdf".to_string(),
            content_type: None,
        }],
    }
}

pub(super) fn paper(journal: &str, xmu_first: bool) -> CategoryPayload {
    CategoryPayload::AcademicPaper(AcademicPaper {
        paper_title: "Sparse attention for code search".to_string(),
        journal_category: Some(journal.to_string()),
        is_independent_author: true,
        is_co_first_author: false,
        author_rank: None,
        is_xmu_first_unit: xmu_first,
    })
}

pub(super) fn military(days: i64) -> CategoryPayload {
    let start = date(2020, 9, 1);
    CategoryPayload::MilitaryService(MilitaryService {
        service_start_date: start,
        service_end_date: start + chrono::Duration::days(days),
        military_unit: Some("31st Group".to_string()),
    })
}

pub(super) fn sports(team_size: u32) -> CategoryPayload {
    CategoryPayload::SportsCompetition(SportsCompetition {
        competition_name: "National Collegiate Relay".to_string(),
        competition_level: Some(SportsLevel::National),
        achievement: Some(Achievement::Champion),
        is_team_project: true,
        team_size,
        competition_date: Some(date(2024, 4, 20)),
    })
}

pub(super) fn pass() -> ReviewAction {
    ReviewAction {
        decision: ReviewDecision::Passed,
        comment: Some("materials verified".to_string()),
        bonus_points: None,
    }
}

pub(super) fn pass_with(points: Decimal) -> ReviewAction {
    ReviewAction {
        bonus_points: Some(points),
        ..pass()
    }
}

pub(super) fn fail(reason: Option<&str>) -> ReviewAction {
    ReviewAction {
        decision: ReviewDecision::Failed,
        comment: reason.map(str::to_string),
        bonus_points: None,
    }
}

/// Pending submission built directly, bypassing intake.
pub(super) fn pending(payload: CategoryPayload) -> Submission {
    Submission::new(uid(STUDENT), draft(payload), Utc::now())
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<SubmissionId, Submission>>,
}

impl SubmissionRepository for MemoryRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(submission.id, submission.clone());
        Ok(submission)
    }

    fn update(&self, mut submission: Submission) -> Result<Submission, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&submission.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != submission.version {
            return Err(RepositoryError::Conflict);
        }
        submission.version += 1;
        guard.insert(submission.id, submission.clone());
        Ok(submission)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|submission| &submission.owner == owner)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl SubmissionRepository for UnavailableRepository {
    fn insert(&self, _submission: Submission) -> Result<Submission, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _submission: Submission) -> Result<Submission, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &SubmissionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_owner(&self, _owner: &UserId) -> Result<Vec<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct MemoryDirectory {
    users: Vec<UserProfile>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            users: vec![
                student(),
                profile(OTHER_STUDENT, UserRole::Student, Some("physics")),
                teacher(),
                foreign_teacher(),
                admin(),
            ],
        }
    }
}

impl UserDirectory for MemoryDirectory {
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.users.iter().find(|user| &user.id == id).cloned())
    }

    fn students(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.role == UserRole::Student)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct RecordingTrigger {
    calls: Mutex<Vec<UserId>>,
}

impl RecordingTrigger {
    pub(super) fn calls(&self) -> Vec<UserId> {
        self.calls.lock().expect("trigger mutex poisoned").clone()
    }
}

impl PerformanceTrigger for RecordingTrigger {
    fn recalculate(&self, student: &UserId) -> Result<(), TriggerError> {
        self.calls
            .lock()
            .expect("trigger mutex poisoned")
            .push(student.clone());
        Ok(())
    }
}

pub(super) struct FailingTrigger;

impl PerformanceTrigger for FailingTrigger {
    fn recalculate(&self, _student: &UserId) -> Result<(), TriggerError> {
        Err(TriggerError::Failed("aggregate store offline".to_string()))
    }
}

pub(super) type TestService =
    SubmissionService<MemoryRepository, MemoryDirectory, RecordingTrigger>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<RecordingTrigger>,
) {
    build_service_with_limit(ReviewConfig::default().batch_limit)
}

pub(super) fn build_service_with_limit(
    batch_limit: usize,
) -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<RecordingTrigger>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let trigger = Arc::new(RecordingTrigger::default());
    let service = Arc::new(SubmissionService::new(
        repository.clone(),
        Arc::new(MemoryDirectory::default()),
        trigger.clone(),
        ReviewConfig { batch_limit },
    ));
    (service, repository, trigger)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
