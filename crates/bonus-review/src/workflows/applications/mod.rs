//! Student submissions across the twelve award categories.
//!
//! Intake validation, the shared three-stage review state machine, and the
//! per-category score rules that turn submitted facts into bonus points.

pub mod domain;
pub mod intake;
pub mod repository;
pub mod review;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AcademicCompetition, AcademicPaper, Achievement, Attachment, AttachmentField, AwardLevel,
    Category, CategoryPayload, CcfCspCertification, CompetitionLevel, EnglishScore, ExamType,
    HonoraryTitle, InnovationProject, InternationalInternship, MilitaryService, PatentAuthorType,
    PatentWork, RecognitionLevel, ScoreBucket, SocialWork, SportsCompetition, SportsLevel,
    Submission, SubmissionDraft, SubmissionId, TeamRole, UserId, UserProfile, UserRole,
    VolunteerService, VolunteerServiceType,
};
pub use intake::{IntakeGuard, IntakeViolation};
pub use repository::{
    PerformanceTrigger, RepositoryError, StatusCounts, StatusSummary, SubmissionRepository,
    SubmissionStatusView, TriggerError, UserDirectory,
};
pub use review::{
    ReviewAction, ReviewDecision, ReviewError, ReviewFlow, ReviewResult, ReviewStage,
    ReviewState, ReviewStatus, ReviewTransition, StageAudit, StatusTransition,
};
pub use router::application_router;
pub use scoring::{compute, evaluate, round_points, ScoreOutcome, ScoreRule, ENGLISH_PASSING_SCORE};
pub use service::{BatchItemOutcome, ReviewOutcome, SubmissionService, SubmissionServiceError};
