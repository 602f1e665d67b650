use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use ideaflow_core::audit::AuditEvent;
use ideaflow_core::domain::comment::Comment;
use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus};
use ideaflow_core::domain::user::{User, UserId};

pub mod audit;
pub mod comment;
pub mod idea;
pub mod memory;
pub mod transition;
pub mod user;

pub use audit::SqlAuditRepository;
pub use comment::SqlCommentRepository;
pub use idea::SqlIdeaRepository;
pub use memory::{
    InMemoryAuditRepository, InMemoryCommentRepository, InMemoryIdeaRepository,
    InMemoryTransitionRepository, InMemoryUserRepository,
};
pub use transition::SqlTransitionRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("duplicate record: {0}")]
    Duplicate(String),
    #[error("record not found: {0}")]
    Missing(String),
}

/// Ideas are never deleted; `save` inserts or replaces the full record.
#[async_trait]
pub trait IdeaRepository: Send + Sync {
    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, RepositoryError>;
    /// Newest submission first.
    async fn list_all(&self) -> Result<Vec<Idea>, RepositoryError>;
    async fn list_by_status(&self, status: IdeaStatus) -> Result<Vec<Idea>, RepositoryError>;
    async fn save(&self, idea: Idea) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;
    async fn save(&self, user: User) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Oldest first, in the order comments were recorded.
    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<Comment>, RepositoryError>;
    async fn append(&self, comment: Comment) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), RepositoryError>;
    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<AuditEvent>, RepositoryError>;
}

/// A workflow action ready to persist: the idea's new state plus what the action produced.
#[derive(Clone, Debug)]
pub struct TransitionRecord {
    pub idea: Idea,
    /// Status the action was evaluated against.
    pub expected_status: IdeaStatus,
    pub comment: Option<Comment>,
    pub events: Vec<AuditEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionWrite {
    Applied,
    /// The stored status no longer matched `expected_status`; nothing was written.
    Stale { current: IdeaStatus },
}

/// Persists a transition all-or-nothing, guarded on the status it was evaluated against.
#[async_trait]
pub trait TransitionRepository: Send + Sync {
    async fn record_transition(
        &self,
        record: TransitionRecord,
    ) -> Result<TransitionWrite, RepositoryError>;
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.as_deref().map(|raw| parse_timestamp(column, raw)).transpose()
}
