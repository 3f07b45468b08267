use rust_decimal::Decimal;

use super::domain::{
    Attachment, Category, CategoryPayload, SubmissionDraft, VolunteerServiceType,
};
use super::scoring::meets_english_standard;

const MAX_ENGLISH_SCORE: u32 = 710;
const MAX_PERFORMANCE_SCORE: u32 = 100;

/// Validation errors raised while accepting a student form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeViolation {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} is out of range ({reason})")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
    #[error("service end date precedes start date")]
    ServicePeriodInverted,
    #[error("attachment field {0} is not accepted for this category")]
    UnknownAttachmentField(String),
    #[error("attachment {field} has unsupported content type {content_type}")]
    UnsupportedContentType { field: String, content_type: String },
    #[error("attachment {0} is required")]
    MissingAttachment(&'static str),
    #[error("category cannot change from {from} to {to}")]
    CategoryChanged { from: Category, to: Category },
    #[error("an active {category} submission for {key} already exists")]
    Duplicate { category: Category, key: String },
}

/// Guard producing sanitized drafts ready to be persisted.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Validate the draft and fill derived fields (attachment content types, English pass flag).
    pub fn prepare(&self, mut draft: SubmissionDraft) -> Result<SubmissionDraft, IntakeViolation> {
        if draft.estimated_score.is_sign_negative() && !draft.estimated_score.is_zero() {
            return Err(IntakeViolation::OutOfRange {
                field: "estimated_score",
                reason: "must not be negative",
            });
        }

        validate_payload(&draft.payload)?;

        let category = draft.payload.category();
        draft.attachments = draft
            .attachments
            .into_iter()
            .map(|attachment| normalize_attachment(category, attachment))
            .collect::<Result<_, _>>()?;

        for field in category.attachment_fields().iter().filter(|field| field.required) {
            if !draft
                .attachments
                .iter()
                .any(|attachment| attachment.field == field.name)
            {
                return Err(IntakeViolation::MissingAttachment(field.name));
            }
        }

        if let CategoryPayload::EnglishScore(score) = &mut draft.payload {
            score.meets_standard = Some(meets_english_standard(score.exam_score));
        }

        Ok(draft)
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), IntakeViolation> {
    if value.trim().is_empty() {
        Err(IntakeViolation::MissingField { field })
    } else {
        Ok(())
    }
}

fn require_range(
    field: &'static str,
    value: Decimal,
    max: u32,
    reason: &'static str,
) -> Result<(), IntakeViolation> {
    if value < Decimal::ZERO || value > Decimal::from(max) {
        Err(IntakeViolation::OutOfRange { field, reason })
    } else {
        Ok(())
    }
}

fn validate_payload(payload: &CategoryPayload) -> Result<(), IntakeViolation> {
    match payload {
        CategoryPayload::EnglishScore(score) => require_range(
            "exam_score",
            score.exam_score,
            MAX_ENGLISH_SCORE,
            "expected 0 to 710",
        ),
        CategoryPayload::AcademicPaper(paper) => require_text("paper_title", &paper.paper_title),
        CategoryPayload::PatentWork(patent) => require_text("title", &patent.title),
        CategoryPayload::AcademicCompetition(competition) => {
            require_text("competition_name", &competition.competition_name)
        }
        CategoryPayload::InnovationProject(project) => {
            require_text("project_name", &project.project_name)
        }
        CategoryPayload::CcfCspCertification(_) => Ok(()),
        CategoryPayload::InternationalInternship(internship) => {
            require_text("organization_name", &internship.organization_name)?;
            require_text("internship_duration", &internship.internship_duration)
        }
        CategoryPayload::MilitaryService(service) => {
            if service.service_end_date < service.service_start_date {
                Err(IntakeViolation::ServicePeriodInverted)
            } else {
                Ok(())
            }
        }
        CategoryPayload::VolunteerService(service) => {
            require_text("activity_name", &service.activity_name)?;
            match (service.service_type, service.working_hours) {
                (VolunteerServiceType::Hours, None) => Err(IntakeViolation::MissingField {
                    field: "working_hours",
                }),
                (VolunteerServiceType::Hours, Some(hours)) if hours < Decimal::ZERO => {
                    Err(IntakeViolation::OutOfRange {
                        field: "working_hours",
                        reason: "must not be negative",
                    })
                }
                _ => Ok(()),
            }
        }
        CategoryPayload::HonoraryTitle(_) => Ok(()),
        CategoryPayload::SocialWork(work) => {
            require_text("position", &work.position)?;
            require_range(
                "performance_score",
                work.performance_score,
                MAX_PERFORMANCE_SCORE,
                "expected 0 to 100",
            )
        }
        CategoryPayload::SportsCompetition(sports) => {
            require_text("competition_name", &sports.competition_name)?;
            if sports.is_team_project && sports.team_size == 0 {
                Err(IntakeViolation::OutOfRange {
                    field: "team_size",
                    reason: "team projects need at least one member",
                })
            } else {
                Ok(())
            }
        }
    }
}

/// Only PDF scans and images are stored as evidence.
fn normalize_attachment(
    category: Category,
    mut attachment: Attachment,
) -> Result<Attachment, IntakeViolation> {
    if !category
        .attachment_fields()
        .iter()
        .any(|field| field.name == attachment.field)
    {
        return Err(IntakeViolation::UnknownAttachmentField(attachment.field));
    }

    let content_type = match attachment.content_type.take() {
        Some(declared) => declared,
        None => mime_guess::from_path(&attachment.storage_key)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };

    if content_type != "application/pdf" && !content_type.starts_with("image/") {
        return Err(IntakeViolation::UnsupportedContentType {
            field: attachment.field,
            content_type,
        });
    }

    attachment.content_type = Some(content_type);
    Ok(attachment)
}
