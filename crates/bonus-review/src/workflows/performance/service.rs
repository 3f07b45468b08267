use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::workflows::applications::{
    PerformanceTrigger, RepositoryError, SubmissionRepository, TriggerError, UserDirectory,
    UserId, UserRole,
};

use super::engine::composite;
use super::repository::{AcademicPerformance, PerformanceRepository};

/// Outcome of a full recompute sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub succeeded: usize,
    pub total: usize,
}

/// Rebuilds composite scores from approved submissions and directory GPA.
pub struct PerformanceService<S, U, P> {
    submissions: Arc<S>,
    directory: Arc<U>,
    records: Arc<P>,
}

impl<S, U, P> PerformanceService<S, U, P>
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    pub fn new(submissions: Arc<S>, directory: Arc<U>, records: Arc<P>) -> Self {
        Self {
            submissions,
            directory,
            records,
        }
    }

    /// Idempotent full recompute for one student. A missing record is created.
    pub fn recompute(&self, student: &UserId) -> Result<AcademicPerformance, PerformanceError> {
        let profile = self
            .directory
            .fetch(student)?
            .ok_or_else(|| PerformanceError::UnknownUser(student.clone()))?;

        let now = Utc::now();
        let submissions = self.submissions.list_by_owner(student)?;
        let score = composite(profile.gpa, &submissions);

        let mut record = self
            .records
            .fetch(student)?
            .unwrap_or_else(|| AcademicPerformance::empty(student.clone(), now));
        record.apply(profile.gpa.unwrap_or_default(), score, now);

        let stored = self.records.save(record)?;
        info!(
            student = %student,
            academic_score = %stored.academic_score,
            academic_expertise = %stored.academic_expertise_score,
            comprehensive = %stored.comprehensive_performance_score,
            total = %stored.total_comprehensive_score,
            "academic performance recomputed"
        );
        Ok(stored)
    }

    /// Staff-triggered recompute of a single student.
    pub fn recompute_for(
        &self,
        actor: &UserId,
        student: &UserId,
    ) -> Result<AcademicPerformance, PerformanceError> {
        self.require_role(actor, |role| role.is_staff())?;
        self.recompute(student)
    }

    /// Admin-only sweep over every student. Individual failures are logged and counted.
    pub fn recompute_all(&self, actor: &UserId) -> Result<RecomputeSummary, PerformanceError> {
        self.require_role(actor, |role| role == UserRole::Admin)?;

        let students = self.directory.students()?;
        let total = students.len();
        let mut succeeded = 0;
        for student in students {
            match self.recompute(&student.id) {
                Ok(_) => succeeded += 1,
                Err(err) => warn!(student = %student.id, error = %err, "recompute failed"),
            }
        }

        info!(succeeded, total, "bulk recompute finished");
        Ok(RecomputeSummary { succeeded, total })
    }

    pub fn get(&self, student: &UserId) -> Result<AcademicPerformance, PerformanceError> {
        self.records
            .fetch(student)?
            .ok_or_else(|| PerformanceError::UnknownUser(student.clone()))
    }

    fn require_role(
        &self,
        actor: &UserId,
        allowed: impl Fn(UserRole) -> bool,
    ) -> Result<(), PerformanceError> {
        let profile = self
            .directory
            .fetch(actor)?
            .ok_or_else(|| PerformanceError::UnknownUser(actor.clone()))?;
        if allowed(profile.role) {
            Ok(())
        } else {
            Err(PerformanceError::Forbidden {
                actor: actor.clone(),
                role: profile.role.label(),
            })
        }
    }
}

impl<S, U, P> PerformanceTrigger for PerformanceService<S, U, P>
where
    S: SubmissionRepository + 'static,
    U: UserDirectory + 'static,
    P: PerformanceRepository + 'static,
{
    fn recalculate(&self, student: &UserId) -> Result<(), TriggerError> {
        self.recompute(student)
            .map(|_| ())
            .map_err(|err| TriggerError::Failed(err.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PerformanceError {
    #[error("user {0} not found")]
    UnknownUser(UserId),
    #[error("user {actor} with role {role} may not recalculate scores")]
    Forbidden { actor: UserId, role: &'static str },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
