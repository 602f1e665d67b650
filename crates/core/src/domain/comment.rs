use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::idea::IdeaId;
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentType {
    General,
    RevisionRequest,
    RejectionReason,
}

impl CommentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::RevisionRequest => "revision_request",
            Self::RejectionReason => "rejection_reason",
        }
    }
}

impl FromStr for CommentType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "revision_request" => Ok(Self::RevisionRequest),
            "rejection_reason" => Ok(Self::RejectionReason),
            other => {
                Err(DomainError::UnknownValue { kind: "comment type", value: other.to_owned() })
            }
        }
    }
}

/// Immutable note attached to an idea. Comments are append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub idea_id: IdeaId,
    pub user_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub comment_type: CommentType,
}

impl Comment {
    pub fn new(
        id: CommentId,
        idea_id: IdeaId,
        user_id: UserId,
        text: impl Into<String>,
        comment_type: CommentType,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(DomainError::InvariantViolation("comment text must not be blank".to_owned()));
        }

        Ok(Self { id, idea_id, user_id, text, created_at, comment_type })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Comment, CommentId, CommentType};
    use crate::domain::idea::IdeaId;
    use crate::domain::user::UserId;

    #[test]
    fn blank_comment_is_rejected() {
        let result = Comment::new(
            CommentId("c-1".to_owned()),
            IdeaId("idea1".to_owned()),
            UserId("approver1".to_owned()),
            "   ",
            CommentType::General,
            Utc::now(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn comment_text_is_trimmed() {
        let comment = Comment::new(
            CommentId("c-2".to_owned()),
            IdeaId("idea1".to_owned()),
            UserId("approver1".to_owned()),
            "  Looks good.  ",
            CommentType::General,
            Utc::now(),
        )
        .expect("valid comment");

        assert_eq!(comment.text, "Looks good.");
        assert_eq!("rejection_reason".parse::<CommentType>().ok(), Some(CommentType::RejectionReason));
    }
}
