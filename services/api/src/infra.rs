use bonus_review::workflows::applications::{
    RepositoryError, Submission, SubmissionId, SubmissionRepository, UserDirectory, UserId,
    UserProfile, UserRole,
};
use bonus_review::workflows::performance::{
    AcademicPerformance, PerformanceRepository, PerformanceService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryPerformanceService = PerformanceService<
    InMemorySubmissionRepository,
    InMemoryUserDirectory,
    InMemoryPerformanceRepository,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionRepository {
    records: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
}

impl SubmissionRepository for InMemorySubmissionRepository {
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
        match guard.get(&submission.id) {
            Some(stored) if stored.version != submission.version => Err(RepositoryError::Conflict),
            Some(_) => {
                submission.version += 1;
                guard.insert(submission.id, submission.clone());
                Ok(submission)
            }
            None => Err(RepositoryError::NotFound),
        }
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
        let mut owned: Vec<Submission> = guard
            .values()
            .filter(|submission| &submission.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|submission| submission.created_at);
        Ok(owned)
    }

    fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut all: Vec<Submission> = guard.values().cloned().collect();
        all.sort_by_key(|submission| submission.created_at);
        Ok(all)
    }
}

#[derive(Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<Vec<UserProfile>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn new(users: Vec<UserProfile>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new(seed_users())
    }
}

impl UserDirectory for InMemoryUserDirectory {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryPerformanceRepository {
    records: Arc<Mutex<HashMap<UserId, AcademicPerformance>>>,
}

impl PerformanceRepository for InMemoryPerformanceRepository {
    fn fetch(&self, student: &UserId) -> Result<Option<AcademicPerformance>, RepositoryError> {
        let guard = self.records.lock().expect("performance mutex poisoned");
        Ok(guard.get(student).cloned())
    }

    fn save(&self, record: AcademicPerformance) -> Result<AcademicPerformance, RepositoryError> {
        let mut guard = self.records.lock().expect("performance mutex poisoned");
        guard.insert(record.student.clone(), record.clone());
        Ok(record)
    }
}

pub(crate) const DEMO_STUDENT: &str = "20230001";
pub(crate) const DEMO_TEACHER: &str = "t-informatics";
pub(crate) const DEMO_ADMIN: &str = "admin";

fn profile(
    id: &str,
    name: &str,
    role: UserRole,
    college: Option<&str>,
    gpa: Option<Decimal>,
) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        name: name.to_string(),
        role,
        college: college.map(str::to_string),
        gpa,
    }
}

/// Accounts available to the in-memory service until a real directory is wired in.
pub(crate) fn seed_users() -> Vec<UserProfile> {
    vec![
        profile(
            DEMO_STUDENT,
            "Lin Wei",
            UserRole::Student,
            Some("informatics"),
            Some(Decimal::new(372, 2)),
        ),
        profile(
            "20230002",
            "Chen Yu",
            UserRole::Student,
            Some("physics"),
            Some(Decimal::new(341, 2)),
        ),
        profile(
            DEMO_TEACHER,
            "Prof. Zhang",
            UserRole::Teacher,
            Some("informatics"),
            None,
        ),
        profile("t-physics", "Prof. Huang", UserRole::Teacher, Some("physics"), None),
        profile(DEMO_ADMIN, "Registrar", UserRole::Admin, None, None),
    ]
}
