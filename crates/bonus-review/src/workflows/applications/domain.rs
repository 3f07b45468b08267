use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::review::{ReviewFlow, ReviewState};

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// School-issued account identifier shared by students and staff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }

    /// Teachers and admins staff the review desk.
    pub const fn is_staff(self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::Admin)
    }
}

/// Read-only identity snapshot furnished by the account directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub gpa: Option<Decimal>,
}

impl UserProfile {
    /// Both sides must carry a college and the names must match.
    pub fn shares_college_with(&self, other: &UserProfile) -> bool {
        match (&self.college, &other.college) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }
}

/// The twelve award categories a student can apply under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EnglishScore,
    AcademicPaper,
    PatentWork,
    AcademicCompetition,
    InnovationProject,
    CcfCspCertification,
    InternationalInternship,
    MilitaryService,
    VolunteerService,
    HonoraryTitle,
    SocialWork,
    SportsCompetition,
}

/// Which capped sub-total a category feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    AcademicExpertise,
    ComprehensivePerformance,
}

/// Named upload slot declared by a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentField {
    pub name: &'static str,
    pub required: bool,
}

const SCORE_REPORT: &[AttachmentField] = &[AttachmentField {
    name: "score_report",
    required: true,
}];

const SCREENSHOT: &[AttachmentField] = &[AttachmentField {
    name: "screenshot",
    required: false,
}];

impl Category {
    pub const ALL: [Category; 12] = [
        Category::EnglishScore,
        Category::AcademicPaper,
        Category::PatentWork,
        Category::AcademicCompetition,
        Category::InnovationProject,
        Category::CcfCspCertification,
        Category::InternationalInternship,
        Category::MilitaryService,
        Category::VolunteerService,
        Category::HonoraryTitle,
        Category::SocialWork,
        Category::SportsCompetition,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Category::EnglishScore => "english_score",
            Category::AcademicPaper => "academic_paper",
            Category::PatentWork => "patent_work",
            Category::AcademicCompetition => "academic_competition",
            Category::InnovationProject => "innovation_project",
            Category::CcfCspCertification => "ccf_csp_certification",
            Category::InternationalInternship => "international_internship",
            Category::MilitaryService => "military_service",
            Category::VolunteerService => "volunteer_service",
            Category::HonoraryTitle => "honorary_title",
            Category::SocialWork => "social_work",
            Category::SportsCompetition => "sports_competition",
        }
    }

    pub const fn bucket(self) -> ScoreBucket {
        match self {
            Category::EnglishScore
            | Category::AcademicPaper
            | Category::PatentWork
            | Category::AcademicCompetition
            | Category::InnovationProject
            | Category::CcfCspCertification => ScoreBucket::AcademicExpertise,
            Category::InternationalInternship
            | Category::MilitaryService
            | Category::VolunteerService
            | Category::HonoraryTitle
            | Category::SocialWork
            | Category::SportsCompetition => ScoreBucket::ComprehensivePerformance,
        }
    }

    pub const fn attachment_fields(self) -> &'static [AttachmentField] {
        match self {
            Category::EnglishScore => SCORE_REPORT,
            _ => SCREENSHOT,
        }
    }

    pub const fn review_flow(self) -> ReviewFlow {
        match self {
            Category::EnglishScore => ReviewFlow::EnglishGate,
            _ => ReviewFlow::ThreeStage,
        }
    }

    /// Highest value the automatic score rule can produce for this category.
    pub fn bonus_cap(self) -> Decimal {
        match self {
            Category::EnglishScore => Decimal::ZERO,
            Category::AcademicPaper => Decimal::from(20),
            Category::AcademicCompetition => Decimal::from(30),
            Category::CcfCspCertification => Decimal::from(10),
            Category::SportsCompetition => Decimal::from(8),
            Category::InternationalInternship | Category::VolunteerService => Decimal::ONE,
            Category::PatentWork
            | Category::InnovationProject
            | Category::MilitaryService
            | Category::HonoraryTitle
            | Category::SocialWork => Decimal::from(2),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    Cet4,
    Cet6,
}

impl ExamType {
    pub const fn label(self) -> &'static str {
        match self {
            ExamType::Cet4 => "cet4",
            ExamType::Cet6 => "cet6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatentAuthorType {
    IndependentAuthor,
    #[default]
    FirstAuthorExceptTeacher,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionLevel {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardLevel {
    FirstPlus,
    First,
    Second,
    Third,
    #[serde(other)]
    Other,
}

/// Administrative tier shared by projects, volunteer recognitions, and honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionLevel {
    National,
    Provincial,
    #[serde(alias = "school")]
    University,
    College,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolunteerServiceType {
    Hours,
    Recognition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Leader,
    Member,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportsLevel {
    International,
    National,
    Provincial,
    School,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    Champion,
    RunnerUp,
    ThirdPlace,
    FourthToEighth,
    #[serde(other)]
    Other,
}

fn default_true() -> bool {
    true
}

fn default_team_size() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnglishScore {
    pub exam_type: ExamType,
    pub exam_score: Decimal,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    /// Derived from the passing threshold on every save; client input is ignored.
    #[serde(default)]
    pub meets_standard: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPaper {
    pub paper_title: String,
    #[serde(default)]
    pub journal_category: Option<String>,
    #[serde(default)]
    pub is_independent_author: bool,
    #[serde(default)]
    pub is_co_first_author: bool,
    #[serde(default)]
    pub author_rank: Option<String>,
    #[serde(default = "default_true")]
    pub is_xmu_first_unit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentWork {
    pub title: String,
    #[serde(default)]
    pub author_type: PatentAuthorType,
    #[serde(default = "default_true")]
    pub is_xmu_first_unit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicCompetition {
    pub competition_level: CompetitionLevel,
    pub competition_name: String,
    #[serde(default)]
    pub competition_specific_name: Option<String>,
    #[serde(default)]
    pub award_level: Option<AwardLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationProject {
    pub project_name: String,
    pub project_level: RecognitionLevel,
    #[serde(default)]
    pub project_duration: Option<String>,
    #[serde(default)]
    pub is_team_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcfCspCertification {
    pub score: u32,
    pub certification_date: NaiveDate,
    #[serde(default)]
    pub csp_rank_percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternationalInternship {
    pub organization_name: String,
    pub internship_duration: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilitaryService {
    pub service_start_date: NaiveDate,
    pub service_end_date: NaiveDate,
    #[serde(default)]
    pub military_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerService {
    pub service_type: VolunteerServiceType,
    pub activity_name: String,
    pub activity_date: NaiveDate,
    #[serde(default)]
    pub working_hours: Option<Decimal>,
    #[serde(default)]
    pub level: Option<RecognitionLevel>,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub team_role: Option<TeamRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HonoraryTitle {
    #[serde(default)]
    pub title_name: Option<String>,
    #[serde(default)]
    pub awarding_organization: Option<String>,
    #[serde(default)]
    pub awarding_date: Option<NaiveDate>,
    #[serde(default)]
    pub level: Option<RecognitionLevel>,
    #[serde(default)]
    pub is_collective: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialWork {
    pub position: String,
    #[serde(default)]
    pub work_duration: String,
    #[serde(default)]
    pub performance_score: Decimal,
    /// Explicit coefficient; when absent or 1.0 the position title decides.
    #[serde(default)]
    pub position_coefficient: Option<Decimal>,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub work_period: String,
    #[serde(default)]
    pub work_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsCompetition {
    pub competition_name: String,
    #[serde(default)]
    pub competition_level: Option<SportsLevel>,
    #[serde(default)]
    pub achievement: Option<Achievement>,
    #[serde(default)]
    pub is_team_project: bool,
    #[serde(default = "default_team_size")]
    pub team_size: u32,
    #[serde(default)]
    pub competition_date: Option<NaiveDate>,
}

/// Category-specific facts, tagged by category on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CategoryPayload {
    EnglishScore(EnglishScore),
    AcademicPaper(AcademicPaper),
    PatentWork(PatentWork),
    AcademicCompetition(AcademicCompetition),
    InnovationProject(InnovationProject),
    CcfCspCertification(CcfCspCertification),
    InternationalInternship(InternationalInternship),
    MilitaryService(MilitaryService),
    VolunteerService(VolunteerService),
    HonoraryTitle(HonoraryTitle),
    SocialWork(SocialWork),
    SportsCompetition(SportsCompetition),
}

impl CategoryPayload {
    pub fn category(&self) -> Category {
        match self {
            CategoryPayload::EnglishScore(_) => Category::EnglishScore,
            CategoryPayload::AcademicPaper(_) => Category::AcademicPaper,
            CategoryPayload::PatentWork(_) => Category::PatentWork,
            CategoryPayload::AcademicCompetition(_) => Category::AcademicCompetition,
            CategoryPayload::InnovationProject(_) => Category::InnovationProject,
            CategoryPayload::CcfCspCertification(_) => Category::CcfCspCertification,
            CategoryPayload::InternationalInternship(_) => Category::InternationalInternship,
            CategoryPayload::MilitaryService(_) => Category::MilitaryService,
            CategoryPayload::VolunteerService(_) => Category::VolunteerService,
            CategoryPayload::HonoraryTitle(_) => Category::HonoraryTitle,
            CategoryPayload::SocialWork(_) => Category::SocialWork,
            CategoryPayload::SportsCompetition(_) => Category::SportsCompetition,
        }
    }

    /// Key under which a student may hold only one active submission.
    pub fn natural_key(&self) -> Option<String> {
        match self {
            CategoryPayload::EnglishScore(score) => Some(score.exam_type.label().to_string()),
            _ => None,
        }
    }
}

/// Uploaded evidence referenced by storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub field: String,
    pub storage_key: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Student-supplied form for a new submission or an edit of a pending one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub payload: CategoryPayload,
    #[serde(default)]
    pub estimated_score: Decimal,
    #[serde(default)]
    pub user_explanation: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// One student's evidence package for a single category, with its review lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub owner: UserId,
    pub payload: CategoryPayload,
    /// Informational self-estimate, never authoritative.
    pub estimated_score: Decimal,
    pub bonus_points: Decimal,
    pub review: ReviewState,
    #[serde(default)]
    pub college_opinion: Option<String>,
    #[serde(default)]
    pub user_explanation: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the repository on every successful update.
    pub version: u64,
}

impl Submission {
    /// Fresh pending submission. Scoring and derived flags are applied by the caller.
    pub fn new(owner: UserId, draft: SubmissionDraft, at: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::generate(),
            owner,
            payload: draft.payload,
            estimated_score: draft.estimated_score,
            bonus_points: Decimal::ZERO,
            review: ReviewState::new(),
            college_opinion: None,
            user_explanation: draft.user_explanation,
            attachments: draft.attachments,
            created_at: at,
            updated_at: at,
            version: 0,
        }
    }

    pub fn category(&self) -> Category {
        self.payload.category()
    }

    /// Active submissions block a duplicate of the same natural key.
    pub fn is_active(&self) -> bool {
        self.review.status().is_active()
    }
}
