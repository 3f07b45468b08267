use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReviewConfig;

use super::domain::{
    CategoryPayload, Submission, SubmissionDraft, SubmissionId, UserId, UserProfile, UserRole,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::repository::{
    PerformanceTrigger, RepositoryError, StatusSummary, SubmissionRepository, UserDirectory,
};
use super::review::{
    authorize_reviewer, ReviewAction, ReviewDecision, ReviewError, ReviewStage, ReviewStatus,
    ReviewTransition,
};
use super::scoring;

/// Result of one review, withdraw or reopen action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub submission_id: SubmissionId,
    pub success: bool,
    pub new_status: ReviewStatus,
    pub message: String,
}

/// Per-id entry of a batch review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemOutcome {
    pub submission_id: SubmissionId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ReviewStatus>,
    pub message: String,
}

/// Service composing the intake guard, repositories, and review state machine.
pub struct SubmissionService<R, U, T> {
    guard: IntakeGuard,
    repository: Arc<R>,
    directory: Arc<U>,
    trigger: Arc<T>,
    config: ReviewConfig,
}

impl<R, U, T> SubmissionService<R, U, T>
where
    R: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    T: PerformanceTrigger + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<U>,
        trigger: Arc<T>,
        config: ReviewConfig,
    ) -> Self {
        Self {
            guard: IntakeGuard::new(),
            repository,
            directory,
            trigger,
            config,
        }
    }

    pub fn config(&self) -> ReviewConfig {
        self.config
    }

    fn user(&self, id: &UserId) -> Result<UserProfile, SubmissionServiceError> {
        self.directory
            .fetch(id)?
            .ok_or_else(|| SubmissionServiceError::UnknownUser(id.clone()))
    }

    fn load(&self, id: &SubmissionId) -> Result<Submission, SubmissionServiceError> {
        Ok(self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    /// One active submission per natural key (CET-4/CET-6 for English).
    fn ensure_unique(
        &self,
        owner: &UserId,
        payload: &CategoryPayload,
        ignore: Option<SubmissionId>,
    ) -> Result<(), SubmissionServiceError> {
        let Some(key) = payload.natural_key() else {
            return Ok(());
        };
        let category = payload.category();

        let clash = self.repository.list_by_owner(owner)?.into_iter().any(|existing| {
            Some(existing.id) != ignore
                && existing.is_active()
                && existing.category() == category
                && existing.payload.natural_key().as_deref() == Some(key.as_str())
        });

        if clash {
            return Err(IntakeViolation::Duplicate { category, key }.into());
        }
        Ok(())
    }

    /// Accept a new student submission and score it.
    pub fn submit(
        &self,
        owner: &UserId,
        draft: SubmissionDraft,
    ) -> Result<Submission, SubmissionServiceError> {
        let student = self.user(owner)?;
        if student.role != UserRole::Student {
            return Err(ReviewError::Unauthorized {
                reviewer: student.id,
                reason: format!("role {} cannot submit applications", student.role.label()),
            }
            .into());
        }
        let draft = self.guard.prepare(draft)?;
        self.ensure_unique(owner, &draft.payload, None)?;

        let mut submission = Submission::new(owner.clone(), draft, Utc::now());
        submission.bonus_points = scoring::compute(&submission.payload);

        let stored = self.repository.insert(submission)?;
        info!(
            submission_id = %stored.id,
            owner = %stored.owner,
            category = %stored.category(),
            bonus_points = %stored.bonus_points,
            "submission created"
        );
        Ok(stored)
    }

    /// Owner edit of a pending submission. The category cannot change.
    pub fn update(
        &self,
        actor: &UserId,
        id: &SubmissionId,
        draft: SubmissionDraft,
    ) -> Result<Submission, SubmissionServiceError> {
        let mut submission = self.load(id)?;
        if actor != &submission.owner {
            return Err(ReviewError::NotOwner { action: "update" }.into());
        }
        if submission.review.status() != ReviewStatus::Pending {
            return Err(ReviewError::InvalidStatus {
                action: "updated",
                status: submission.review.status().label(),
            }
            .into());
        }
        if draft.payload.category() != submission.category() {
            return Err(IntakeViolation::CategoryChanged {
                from: submission.category(),
                to: draft.payload.category(),
            }
            .into());
        }

        let draft = self.guard.prepare(draft)?;
        self.ensure_unique(actor, &draft.payload, Some(submission.id))?;

        submission.bonus_points = scoring::compute(&draft.payload);
        submission.payload = draft.payload;
        submission.estimated_score = draft.estimated_score;
        submission.user_explanation = draft.user_explanation;
        submission.attachments = draft.attachments;
        submission.updated_at = Utc::now();

        let stored = self.repository.update(submission)?;
        info!(submission_id = %stored.id, version = stored.version, "submission updated");
        Ok(stored)
    }

    pub fn delete(&self, actor: &UserId, id: &SubmissionId) -> Result<(), SubmissionServiceError> {
        let submission = self.load(id)?;
        if actor != &submission.owner {
            return Err(ReviewError::NotOwner { action: "delete" }.into());
        }
        if !submission.review.status().is_deletable() {
            return Err(ReviewError::InvalidStatus {
                action: "deleted",
                status: submission.review.status().label(),
            }
            .into());
        }

        self.repository.delete(id)?;
        info!(submission_id = %id, "submission deleted");
        Ok(())
    }

    pub fn withdraw(
        &self,
        actor: &UserId,
        id: &SubmissionId,
    ) -> Result<ReviewOutcome, SubmissionServiceError> {
        let mut submission = self.load(id)?;
        let transition = submission.withdraw(actor, Utc::now())?;
        let stored = self.repository.update(submission)?;
        info!(submission_id = %stored.id, from = transition.from.label(), "submission withdrawn");
        Ok(outcome(&stored, transition))
    }

    pub fn reopen(
        &self,
        actor: &UserId,
        id: &SubmissionId,
    ) -> Result<ReviewOutcome, SubmissionServiceError> {
        let mut submission = self.load(id)?;
        let transition = submission.reopen(actor, Utc::now())?;
        self.ensure_unique(&submission.owner, &submission.payload, Some(submission.id))?;
        let stored = self.repository.update(submission)?;
        info!(submission_id = %stored.id, "submission reopened");
        Ok(outcome(&stored, transition))
    }

    /// Apply one review decision. `stage` defaults to the stage the status is waiting on.
    pub fn review(
        &self,
        id: &SubmissionId,
        reviewer_id: &UserId,
        stage: Option<ReviewStage>,
        action: ReviewAction,
    ) -> Result<ReviewOutcome, SubmissionServiceError> {
        let reviewer = self.user(reviewer_id)?;
        let mut submission = self.load(id)?;
        let owner = self.user(&submission.owner)?;

        let status = submission.review.status();
        let stage = match stage.or_else(|| status.current_stage()) {
            Some(stage) => stage,
            None if status == ReviewStatus::Rejected
                && action.decision == ReviewDecision::Passed =>
            {
                ReviewStage::First
            }
            None => {
                return Err(ReviewError::InvalidTransition {
                    stage: "next",
                    status: status.label(),
                }
                .into())
            }
        };

        if status == ReviewStatus::Rejected
            && stage == ReviewStage::First
            && action.decision == ReviewDecision::Passed
        {
            authorize_reviewer(&reviewer, &owner)?;
            self.ensure_unique(&submission.owner, &submission.payload, Some(submission.id))?;
        }

        let decision = action.decision;
        let transition =
            submission.perform_review(stage, &reviewer, &owner, action, Utc::now())?;
        let stored = self.repository.update(submission)?;

        info!(
            submission_id = %stored.id,
            reviewer = %reviewer.id,
            stage = stage.label(),
            decision = ?decision,
            status = transition.to.label(),
            bonus_points = %stored.bonus_points,
            "review applied"
        );

        if transition.to == ReviewStatus::Approved {
            if let Err(err) = self.trigger.recalculate(&stored.owner) {
                warn!(
                    student = %stored.owner,
                    error = %err,
                    "performance recalculation after approval failed"
                );
            }
        }

        Ok(outcome(&stored, transition))
    }

    /// Sequential review of many ids. Failures are reported per id and never roll back.
    pub fn review_batch(
        &self,
        reviewer_id: &UserId,
        ids: &[SubmissionId],
        stage: Option<ReviewStage>,
        action: ReviewAction,
    ) -> Result<Vec<BatchItemOutcome>, SubmissionServiceError> {
        if ids.is_empty() || ids.len() > self.config.batch_limit {
            return Err(SubmissionServiceError::BatchSize {
                limit: self.config.batch_limit,
                found: ids.len(),
            });
        }

        let results: Vec<BatchItemOutcome> = ids
            .iter()
            .map(|id| match self.review(id, reviewer_id, stage, action.clone()) {
                Ok(applied) => BatchItemOutcome {
                    submission_id: *id,
                    success: true,
                    new_status: Some(applied.new_status),
                    message: applied.message,
                },
                Err(err) => BatchItemOutcome {
                    submission_id: *id,
                    success: false,
                    new_status: None,
                    message: err.to_string(),
                },
            })
            .collect();

        let succeeded = results.iter().filter(|item| item.success).count();
        info!(
            reviewer = %reviewer_id,
            requested = ids.len(),
            succeeded,
            "batch review finished"
        );
        Ok(results)
    }

    /// Staff note recorded outside the review workflow.
    pub fn set_college_opinion(
        &self,
        actor: &UserId,
        id: &SubmissionId,
        opinion: String,
    ) -> Result<Submission, SubmissionServiceError> {
        let staff = self.user(actor)?;
        let mut submission = self.load(id)?;
        let owner = self.user(&submission.owner)?;
        authorize_reviewer(&staff, &owner)?;

        let opinion = opinion.trim().to_string();
        submission.college_opinion = (!opinion.is_empty()).then_some(opinion);
        submission.updated_at = Utc::now();

        let stored = self.repository.update(submission)?;
        debug!(submission_id = %stored.id, actor = %actor, "college opinion recorded");
        Ok(stored)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<Submission, SubmissionServiceError> {
        self.load(id)
    }

    pub fn list_for_student(
        &self,
        student: &UserId,
    ) -> Result<Vec<Submission>, SubmissionServiceError> {
        let mut submissions = self.repository.list_by_owner(student)?;
        submissions.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(submissions)
    }

    /// Oldest-first queue of submissions the reviewer may act on right now.
    pub fn pending_for(
        &self,
        reviewer_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Submission>, SubmissionServiceError> {
        let reviewer = self.user(reviewer_id)?;
        if !reviewer.role.is_staff() {
            return Err(ReviewError::Unauthorized {
                reviewer: reviewer.id.clone(),
                reason: format!("role {} has no review queue", reviewer.role.label()),
            }
            .into());
        }

        let mut queue = Vec::new();
        for submission in self.repository.list_all()? {
            let Some(stage) = submission.review.status().current_stage() else {
                continue;
            };
            let eligible = match self.directory.fetch(&submission.owner)? {
                Some(owner) => submission.can_review(stage, &reviewer, &owner),
                None => false,
            };
            if eligible {
                queue.push(submission);
            }
        }

        queue.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        queue.truncate(limit);
        Ok(queue)
    }

    pub fn stats(&self, student: Option<&UserId>) -> Result<StatusSummary, SubmissionServiceError> {
        let submissions = match student {
            Some(student) => self.repository.list_by_owner(student)?,
            None => self.repository.list_all()?,
        };
        Ok(StatusSummary::from_submissions(&submissions))
    }
}

fn outcome(submission: &Submission, transition: ReviewTransition) -> ReviewOutcome {
    ReviewOutcome {
        submission_id: submission.id,
        success: true,
        new_status: transition.to,
        message: transition.message,
    }
}

/// Error raised by the submission service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("user {0} is not known to the directory")]
    UnknownUser(UserId),
    #[error("batch review accepts 1 to {limit} submissions (got {found})")]
    BatchSize { limit: usize, found: usize },
}
