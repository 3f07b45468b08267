//! Three-stage review workflow shared by every category.
//!
//! `ReviewState` is embedded in each [`Submission`] and only changes through the
//! transition methods below, which also enforce reviewer eligibility and keep an
//! append-only transition history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{CategoryPayload, Submission, UserId, UserProfile, UserRole};
use super::scoring::{meets_english_standard, round_points};

/// Lifecycle status. Stage rejections all collapse into the terminal `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    FirstReviewing,
    FirstApproved,
    SecondReviewing,
    SecondApproved,
    ThirdReviewing,
    Approved,
    #[serde(alias = "first_rejected", alias = "second_rejected", alias = "third_rejected")]
    Rejected,
    Withdrawn,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::FirstReviewing => "first_reviewing",
            ReviewStatus::FirstApproved => "first_approved",
            ReviewStatus::SecondReviewing => "second_reviewing",
            ReviewStatus::SecondApproved => "second_approved",
            ReviewStatus::ThirdReviewing => "third_reviewing",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ReviewStatus::Approved | ReviewStatus::Rejected | ReviewStatus::Withdrawn
        )
    }

    pub const fn is_active(self) -> bool {
        !matches!(self, ReviewStatus::Rejected | ReviewStatus::Withdrawn)
    }

    pub const fn is_withdrawable(self) -> bool {
        matches!(
            self,
            ReviewStatus::Pending
                | ReviewStatus::FirstReviewing
                | ReviewStatus::FirstApproved
                | ReviewStatus::SecondReviewing
                | ReviewStatus::SecondApproved
                | ReviewStatus::ThirdReviewing
        )
    }

    pub const fn is_deletable(self) -> bool {
        matches!(
            self,
            ReviewStatus::Pending | ReviewStatus::Withdrawn | ReviewStatus::Rejected
        )
    }

    /// The stage that would act next, or `None` once the workflow has completed.
    pub const fn current_stage(self) -> Option<ReviewStage> {
        match self {
            ReviewStatus::Pending | ReviewStatus::FirstReviewing => Some(ReviewStage::First),
            ReviewStatus::FirstApproved | ReviewStatus::SecondReviewing => {
                Some(ReviewStage::Second)
            }
            ReviewStatus::SecondApproved | ReviewStatus::ThirdReviewing => Some(ReviewStage::Third),
            ReviewStatus::Approved | ReviewStatus::Rejected | ReviewStatus::Withdrawn => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    First,
    Second,
    Third,
}

impl ReviewStage {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewStage::First => "first",
            ReviewStage::Second => "second",
            ReviewStage::Third => "third",
        }
    }

    pub const fn accepts(self, status: ReviewStatus) -> bool {
        match self {
            ReviewStage::First => {
                matches!(status, ReviewStatus::Pending | ReviewStatus::FirstReviewing)
            }
            ReviewStage::Second => matches!(
                status,
                ReviewStatus::FirstApproved | ReviewStatus::SecondReviewing
            ),
            ReviewStage::Third => matches!(
                status,
                ReviewStatus::SecondApproved | ReviewStatus::ThirdReviewing
            ),
        }
    }
}

/// Number of stages a category passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFlow {
    ThreeStage,
    /// English scores: stage one checks the pass line, stage two is final, no bonus.
    EnglishGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewResult {
    Passed,
    Failed,
}

/// Who signed off on a stage, what they wrote, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAudit {
    pub reviewer: Option<UserId>,
    pub comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    pub actor: UserId,
    #[serde(default)]
    pub stage: Option<ReviewStage>,
    #[serde(default)]
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}

/// Review bookkeeping embedded in every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    status: ReviewStatus,
    result: Option<ReviewResult>,
    first: StageAudit,
    second: StageAudit,
    third: StageAudit,
    history: Vec<StatusTransition>,
}

impl ReviewState {
    pub(crate) fn new() -> Self {
        Self {
            status: ReviewStatus::Pending,
            result: None,
            first: StageAudit::default(),
            second: StageAudit::default(),
            third: StageAudit::default(),
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    pub fn result(&self) -> Option<ReviewResult> {
        self.result
    }

    pub fn audit(&self, stage: ReviewStage) -> &StageAudit {
        match stage {
            ReviewStage::First => &self.first,
            ReviewStage::Second => &self.second,
            ReviewStage::Third => &self.third,
        }
    }

    pub fn history(&self) -> &[StatusTransition] {
        &self.history
    }

    fn audit_mut(&mut self, stage: ReviewStage) -> &mut StageAudit {
        match stage {
            ReviewStage::First => &mut self.first,
            ReviewStage::Second => &mut self.second,
            ReviewStage::Third => &mut self.third,
        }
    }

    fn move_to(
        &mut self,
        to: ReviewStatus,
        actor: &UserId,
        stage: Option<ReviewStage>,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> ReviewStatus {
        let from = self.status;
        self.history.push(StatusTransition {
            from,
            to,
            actor: actor.clone(),
            stage,
            comment,
            at,
        });
        self.status = to;
        from
    }

    fn clear_stages(&mut self) {
        self.first = StageAudit::default();
        self.second = StageAudit::default();
        self.third = StageAudit::default();
    }
}

/// Reviewer input for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAction {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub comment: Option<String>,
    /// Honored only at stages two and three, and only to lower an existing value.
    #[serde(default)]
    pub bonus_points: Option<Decimal>,
}

/// Applied transition, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    pub stage: Option<ReviewStage>,
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("reviewer {reviewer} is not permitted: {reason}")]
    Unauthorized { reviewer: UserId, reason: String },
    #[error("cannot perform {stage} review while submission is {status}")]
    InvalidTransition {
        stage: &'static str,
        status: &'static str,
    },
    #[error("only the owning student may {action} this submission")]
    NotOwner { action: &'static str },
    #[error("submission cannot be {action} while {status}")]
    InvalidStatus {
        action: &'static str,
        status: &'static str,
    },
    #[error("bonus points must not be negative (got {0})")]
    NegativeBonus(Decimal),
    #[error("a rejection requires a reason")]
    MissingReason,
}

/// Role and college gate shared by every stage.
pub(crate) fn authorize_reviewer(
    reviewer: &UserProfile,
    owner: &UserProfile,
) -> Result<(), ReviewError> {
    if !reviewer.role.is_staff() {
        return Err(ReviewError::Unauthorized {
            reviewer: reviewer.id.clone(),
            reason: format!("role {} cannot review", reviewer.role.label()),
        });
    }

    if reviewer.role == UserRole::Admin || reviewer.shares_college_with(owner) {
        return Ok(());
    }

    Err(ReviewError::Unauthorized {
        reviewer: reviewer.id.clone(),
        reason: "teachers may only review students from their own college".to_string(),
    })
}

impl Submission {
    /// Eligibility for `stage`: staff role, college match for teachers, accepting status.
    pub fn can_review(
        &self,
        stage: ReviewStage,
        reviewer: &UserProfile,
        owner: &UserProfile,
    ) -> bool {
        authorize_reviewer(reviewer, owner).is_ok() && self.stage_open(stage)
    }

    fn stage_open(&self, stage: ReviewStage) -> bool {
        let status = self.review.status;
        match self.category().review_flow() {
            ReviewFlow::EnglishGate if stage == ReviewStage::Third => false,
            _ => stage.accepts(status),
        }
    }

    /// Apply one stage decision. On error nothing is mutated.
    pub fn perform_review(
        &mut self,
        stage: ReviewStage,
        reviewer: &UserProfile,
        owner: &UserProfile,
        action: ReviewAction,
        at: DateTime<Utc>,
    ) -> Result<ReviewTransition, ReviewError> {
        authorize_reviewer(reviewer, owner)?;

        let reapproval = self.review.status == ReviewStatus::Rejected
            && stage == ReviewStage::First
            && action.decision == ReviewDecision::Passed;

        if !reapproval && !self.stage_open(stage) {
            return Err(ReviewError::InvalidTransition {
                stage: stage.label(),
                status: self.review.status.label(),
            });
        }

        if let Some(points) = action.bonus_points {
            if points.is_sign_negative() && !points.is_zero() {
                return Err(ReviewError::NegativeBonus(points));
            }
        }

        let comment = action
            .comment
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if action.decision == ReviewDecision::Failed && comment.is_none() {
            return Err(ReviewError::MissingReason);
        }

        if reapproval {
            self.review.clear_stages();
            self.review.result = None;
        }

        let audit = self.review.audit_mut(stage);
        audit.reviewer = Some(reviewer.id.clone());
        audit.comment = comment.clone();
        audit.reviewed_at = Some(at);

        let flow = self.category().review_flow();
        let (to, message) = match action.decision {
            ReviewDecision::Passed => self.apply_pass(stage, flow, action.bonus_points),
            ReviewDecision::Failed => {
                if let CategoryPayload::EnglishScore(score) = &mut self.payload {
                    if stage == ReviewStage::First {
                        score.meets_standard = Some(false);
                    }
                }
                self.review.result = Some(ReviewResult::Failed);
                (
                    ReviewStatus::Rejected,
                    format!("{} review failed", stage.label()),
                )
            }
        };

        let from = self
            .review
            .move_to(to, &reviewer.id, Some(stage), comment, at);
        self.updated_at = at;

        Ok(ReviewTransition {
            stage: Some(stage),
            from,
            to,
            message,
        })
    }

    fn apply_pass(
        &mut self,
        stage: ReviewStage,
        flow: ReviewFlow,
        bonus_override: Option<Decimal>,
    ) -> (ReviewStatus, String) {
        if flow == ReviewFlow::EnglishGate {
            self.bonus_points = Decimal::ZERO;
            return match stage {
                ReviewStage::First => {
                    if let CategoryPayload::EnglishScore(score) = &mut self.payload {
                        score.meets_standard = Some(meets_english_standard(score.exam_score));
                    }
                    (
                        ReviewStatus::FirstApproved,
                        "first review passed, awaiting second review".to_string(),
                    )
                }
                _ => {
                    self.review.result = Some(ReviewResult::Passed);
                    (
                        ReviewStatus::Approved,
                        "second review passed, review complete".to_string(),
                    )
                }
            };
        }

        match stage {
            ReviewStage::First => {
                if self.bonus_points.is_zero() && self.estimated_score > Decimal::ZERO {
                    self.bonus_points = round_points(self.estimated_score);
                }
                (
                    ReviewStatus::FirstApproved,
                    "first review passed, awaiting second review".to_string(),
                )
            }
            ReviewStage::Second => {
                self.merge_bonus(bonus_override);
                (
                    ReviewStatus::SecondApproved,
                    "second review passed, awaiting third review".to_string(),
                )
            }
            ReviewStage::Third => {
                self.merge_bonus(bonus_override);
                self.review.result = Some(ReviewResult::Passed);
                (
                    ReviewStatus::Approved,
                    "third review passed, review complete".to_string(),
                )
            }
        }
    }

    /// Later stages may only tighten an already-set bonus.
    fn merge_bonus(&mut self, bonus_override: Option<Decimal>) {
        if let Some(points) = bonus_override {
            let points = round_points(points);
            self.bonus_points = if self.bonus_points > Decimal::ZERO {
                self.bonus_points.min(points)
            } else {
                points
            };
        }
    }

    /// Owner-only exit from any non-terminal status.
    pub fn withdraw(
        &mut self,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> Result<ReviewTransition, ReviewError> {
        if actor != &self.owner {
            return Err(ReviewError::NotOwner { action: "withdraw" });
        }

        if !self.review.status.is_withdrawable() {
            return Err(ReviewError::InvalidStatus {
                action: "withdrawn",
                status: self.review.status.label(),
            });
        }

        let from = self
            .review
            .move_to(ReviewStatus::Withdrawn, actor, None, None, at);
        self.updated_at = at;

        Ok(ReviewTransition {
            stage: None,
            from,
            to: ReviewStatus::Withdrawn,
            message: "submission withdrawn".to_string(),
        })
    }

    /// Owner sends a rejected submission back to the start of the queue.
    pub fn reopen(
        &mut self,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> Result<ReviewTransition, ReviewError> {
        if actor != &self.owner {
            return Err(ReviewError::NotOwner { action: "reopen" });
        }

        if self.review.status != ReviewStatus::Rejected {
            return Err(ReviewError::InvalidStatus {
                action: "reopened",
                status: self.review.status.label(),
            });
        }

        self.review.clear_stages();
        self.review.result = None;
        if let CategoryPayload::EnglishScore(score) = &mut self.payload {
            score.meets_standard = Some(meets_english_standard(score.exam_score));
        }

        let from = self
            .review
            .move_to(ReviewStatus::Pending, actor, None, None, at);
        self.updated_at = at;

        Ok(ReviewTransition {
            stage: None,
            from,
            to: ReviewStatus::Pending,
            message: "submission reopened for review".to_string(),
        })
    }
}
