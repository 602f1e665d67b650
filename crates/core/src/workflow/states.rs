use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::CommentType;
use crate::domain::idea::{Idea, IdeaStatus};
use crate::domain::user::UserId;

pub const DEFAULT_APPROVAL_NOTE: &str = "This idea has been approved.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApprovalAction {
    Assign { approver_id: UserId },
    Approve { note: Option<String> },
    Reject { reason: String },
    RequestRevision { request: String },
}

impl ApprovalAction {
    pub fn kind(&self) -> ApprovalActionKind {
        match self {
            Self::Assign { .. } => ApprovalActionKind::Assign,
            Self::Approve { .. } => ApprovalActionKind::Approve,
            Self::Reject { .. } => ApprovalActionKind::Reject,
            Self::RequestRevision { .. } => ApprovalActionKind::RequestRevision,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalActionKind {
    Assign,
    Approve,
    Reject,
    RequestRevision,
}

impl ApprovalActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequestRevision => "request_revision",
        }
    }

    /// Audit event name recorded when the action succeeds.
    pub fn audit_event(self) -> &'static str {
        match self {
            Self::Assign => "idea.assigned",
            Self::Approve => "idea.approved",
            Self::Reject => "idea.rejected",
            Self::RequestRevision => "idea.revision_requested",
        }
    }
}

impl fmt::Display for ApprovalActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub actor_id: UserId,
}

impl WorkflowContext {
    pub fn new(actor_id: UserId) -> Self {
        Self { actor_id }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEffect {
    AssignApprover(UserId),
    RecordComment { comment_type: CommentType, text: String },
    TouchLastModified,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: IdeaStatus,
    pub to: IdeaStatus,
    pub action: ApprovalActionKind,
    pub effects: Vec<WorkflowEffect>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub comment_type: CommentType,
    pub text: String,
}

impl TransitionOutcome {
    /// Writes the outcome onto the idea and hands back the comment it asks for, if any.
    pub fn apply_to(&self, idea: &mut Idea, now: DateTime<Utc>) -> Option<CommentDraft> {
        idea.status = self.to;

        let mut draft = None;
        for effect in &self.effects {
            match effect {
                WorkflowEffect::AssignApprover(user_id) => {
                    idea.assigned_approver_id = Some(user_id.clone());
                }
                WorkflowEffect::RecordComment { comment_type, text } => {
                    draft = Some(CommentDraft { comment_type: *comment_type, text: text.clone() });
                }
                WorkflowEffect::TouchLastModified => idea.last_modified = now,
            }
        }
        draft
    }
}
