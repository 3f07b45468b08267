use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{Category, Submission, SubmissionId, UserId, UserProfile};
use super::review::{ReviewResult, ReviewStage, ReviewStatus};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError>;
    /// Persist when `submission.version` matches the stored copy; the stored version is bumped.
    fn update(&self, submission: Submission) -> Result<Submission, RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError>;
    fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Submission>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<Submission>, RepositoryError>;
}

/// Read-only account directory furnishing roles, colleges and GPA.
pub trait UserDirectory: Send + Sync {
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn students(&self) -> Result<Vec<UserProfile>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was changed by another writer")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Hook fired after a submission reaches terminal approval.
pub trait PerformanceTrigger: Send + Sync {
    fn recalculate(&self, student: &UserId) -> Result<(), TriggerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("performance recalculation failed: {0}")]
    Failed(String),
}

/// Sanitized representation of a submission's review position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionStatusView {
    pub submission_id: SubmissionId,
    pub owner: UserId,
    pub category: Category,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ReviewResult>,
    pub bonus_points: Decimal,
}

impl Submission {
    pub fn status_view(&self) -> SubmissionStatusView {
        let status = self.review.status();
        SubmissionStatusView {
            submission_id: self.id,
            owner: self.owner.clone(),
            category: self.category(),
            status: status.label(),
            current_stage: status.current_stage().map(ReviewStage::label),
            result: self.review.result(),
            bonus_points: self.bonus_points,
        }
    }
}

/// Submission counts by coarse review position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub withdrawn: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: ReviewStatus) {
        match status {
            ReviewStatus::Pending => self.pending += 1,
            ReviewStatus::Approved => self.approved += 1,
            ReviewStatus::Rejected => self.rejected += 1,
            ReviewStatus::Withdrawn => self.withdrawn += 1,
            ReviewStatus::FirstReviewing
            | ReviewStatus::FirstApproved
            | ReviewStatus::SecondReviewing
            | ReviewStatus::SecondApproved
            | ReviewStatus::ThirdReviewing => self.in_review += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_review + self.approved + self.rejected + self.withdrawn
    }
}

/// Review dashboard totals, overall and per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: StatusCounts,
    pub by_category: BTreeMap<Category, StatusCounts>,
}

impl StatusSummary {
    pub fn from_submissions<'a>(submissions: impl IntoIterator<Item = &'a Submission>) -> Self {
        let mut summary = Self::default();
        for submission in submissions {
            let status = submission.review.status();
            summary.total.record(status);
            summary
                .by_category
                .entry(submission.category())
                .or_default()
                .record(status);
        }
        summary
    }
}
