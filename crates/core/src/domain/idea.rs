use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::errors::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 50;
pub const BENEFITS_MIN_CHARS: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdeaId(pub String);

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    Submitted,
    UnderReview,
    Approved,
    RevisionRequested,
    Rejected,
}

impl IdeaStatus {
    pub const ALL: [IdeaStatus; 5] = [
        IdeaStatus::Submitted,
        IdeaStatus::UnderReview,
        IdeaStatus::Approved,
        IdeaStatus::RevisionRequested,
        IdeaStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::RevisionRequested => "revision_requested",
            Self::Rejected => "rejected",
        }
    }

    /// Title-cased label used by dashboard views, e.g. "Revision Requested".
    pub fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::Approved => "Approved",
            Self::RevisionRequested => "Revision Requested",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(Self::Submitted),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "revision_requested" => Ok(Self::RevisionRequested),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::UnknownValue { kind: "idea status", value: other.to_owned() }),
        }
    }
}

/// Shared 1..=4 scale for impact and effort ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Low, Level::Medium, Level::High, Level::VeryHigh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    pub fn score(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" => Ok(Self::VeryHigh),
            other => Err(DomainError::UnknownValue { kind: "level", value: other.to_owned() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationPhase {
    NotStarted,
    Planning,
    InProgress,
    Testing,
    Completed,
}

impl ImplementationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::Testing => "testing",
            Self::Completed => "completed",
        }
    }

    pub fn progress_pct(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Planning => 15,
            Self::InProgress => 50,
            Self::Testing => 85,
            Self::Completed => 100,
        }
    }
}

impl FromStr for ImplementationPhase {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(Self::NotStarted),
            "planning" => Ok(Self::Planning),
            "in_progress" => Ok(Self::InProgress),
            "testing" => Ok(Self::Testing),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::UnknownValue {
                kind: "implementation phase",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub benefits: String,
    pub submitter_id: UserId,
    pub status: IdeaStatus,
    pub date_submitted: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub assigned_approver_id: Option<UserId>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub impact: Option<Level>,
    pub effort: Option<Level>,
    pub implementation_phase: Option<ImplementationPhase>,
    pub implementation_start_date: Option<DateTime<Utc>>,
    pub estimated_completion_date: Option<DateTime<Utc>>,
    pub actual_completion_date: Option<DateTime<Utc>>,
    pub expected_roi: Option<Decimal>,
}

impl Idea {
    /// Builds a freshly submitted idea from validated input.
    pub fn submit(id: IdeaId, input: NewIdea, now: DateTime<Utc>) -> Result<Self, DomainError> {
        input.validate()?;

        Ok(Self {
            id,
            title: input.title.trim().to_owned(),
            description: input.description.trim().to_owned(),
            category: input.category.trim().to_owned(),
            benefits: input.benefits.trim().to_owned(),
            submitter_id: input.submitter_id,
            status: IdeaStatus::Submitted,
            date_submitted: now,
            last_modified: now,
            assigned_approver_id: None,
            attachments: input.attachments,
            impact: input.impact,
            effort: input.effort,
            implementation_phase: None,
            implementation_start_date: None,
            estimated_completion_date: None,
            actual_completion_date: None,
            expected_roi: input.expected_roi,
        })
    }
}

/// Submission payload. Status, identifiers and timestamps are assigned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub category: String,
    pub benefits: String,
    pub submitter_id: UserId,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub impact: Option<Level>,
    #[serde(default)]
    pub effort: Option<Level>,
    #[serde(default)]
    pub expected_roi: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl NewIdea {
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(field_error("title", "Title is required"));
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(field_error(
                "title",
                format!("Title must be {TITLE_MAX_CHARS} characters or less"),
            ));
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.push(field_error("description", "Description is required"));
        } else if description.chars().count() < DESCRIPTION_MIN_CHARS {
            errors.push(field_error(
                "description",
                format!("Description must be at least {DESCRIPTION_MIN_CHARS} characters"),
            ));
        }

        if self.category.trim().is_empty() {
            errors.push(field_error("category", "Category is required"));
        }

        let benefits = self.benefits.trim();
        if benefits.is_empty() {
            errors.push(field_error("benefits", "Expected benefits are required"));
        } else if benefits.chars().count() < BENEFITS_MIN_CHARS {
            errors.push(field_error(
                "benefits",
                format!("Benefits must be at least {BENEFITS_MIN_CHARS} characters"),
            ));
        }

        if self.submitter_id.0.trim().is_empty() {
            errors.push(field_error("submitter_id", "Submitter is required"));
        }

        errors
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let errors = self.field_errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(DomainError::InvalidSubmission(errors))
    }
}

fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError { field, message: message.into() }
}
