use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use ideaflow_core::audit::AuditEvent;
use ideaflow_core::domain::comment::Comment;
use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus};
use ideaflow_core::domain::user::{User, UserId};

use super::{
    AuditRepository, CommentRepository, IdeaRepository, RepositoryError, TransitionRecord,
    TransitionRepository, TransitionWrite, UserRepository,
};

fn newest_first(mut ideas: Vec<Idea>) -> Vec<Idea> {
    ideas.sort_by_key(|idea| (Reverse(idea.date_submitted), idea.id.0.clone()));
    ideas
}

#[derive(Default)]
pub struct InMemoryIdeaRepository {
    ideas: RwLock<HashMap<String, Idea>>,
}

#[async_trait::async_trait]
impl IdeaRepository for InMemoryIdeaRepository {
    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, RepositoryError> {
        let ideas = self.ideas.read().await;
        Ok(ideas.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Idea>, RepositoryError> {
        let ideas = self.ideas.read().await;
        Ok(newest_first(ideas.values().cloned().collect()))
    }

    async fn list_by_status(&self, status: IdeaStatus) -> Result<Vec<Idea>, RepositoryError> {
        let ideas = self.ideas.read().await;
        Ok(newest_first(ideas.values().filter(|idea| idea.status == status).cloned().collect()))
    }

    async fn save(&self, idea: Idea) -> Result<(), RepositoryError> {
        let mut ideas = self.ideas.write().await;
        ideas.insert(idea.id.0.clone(), idea);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut listed: Vec<User> = users.values().cloned().collect();
        listed.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(listed)
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id.0.clone(), user);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: RwLock<Vec<Comment>>,
}

#[async_trait::async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<Comment>, RepositoryError> {
        let comments = self.comments.read().await;
        let mut listed: Vec<Comment> =
            comments.iter().filter(|comment| &comment.idea_id == idea_id).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps.
        listed.sort_by_key(|comment| comment.created_at);
        Ok(listed)
    }

    async fn append(&self, comment: Comment) -> Result<(), RepositoryError> {
        let mut comments = self.comments.write().await;
        if comments.iter().any(|existing| existing.id == comment.id) {
            return Err(RepositoryError::Duplicate(format!("comment `{}`", comment.id.0)));
        }
        comments.push(comment);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

#[async_trait::async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, event: AuditEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        events.push(event);
        Ok(())
    }

    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<AuditEvent>, RepositoryError> {
        let events = self.events.read().await;
        let mut listed: Vec<AuditEvent> = events
            .iter()
            .filter(|event| event.idea_id.as_ref() == Some(idea_id))
            .cloned()
            .collect();
        listed.sort_by_key(|event| event.occurred_at);
        Ok(listed)
    }
}

/// Applies transitions across the in-memory idea, comment and audit stores.
///
/// All three write locks are held for the whole write, always taken in that order.
pub struct InMemoryTransitionRepository {
    ideas: Arc<InMemoryIdeaRepository>,
    comments: Arc<InMemoryCommentRepository>,
    audit: Arc<InMemoryAuditRepository>,
}

impl InMemoryTransitionRepository {
    pub fn new(
        ideas: Arc<InMemoryIdeaRepository>,
        comments: Arc<InMemoryCommentRepository>,
        audit: Arc<InMemoryAuditRepository>,
    ) -> Self {
        Self { ideas, comments, audit }
    }
}

#[async_trait::async_trait]
impl TransitionRepository for InMemoryTransitionRepository {
    async fn record_transition(
        &self,
        record: TransitionRecord,
    ) -> Result<TransitionWrite, RepositoryError> {
        let mut ideas = self.ideas.ideas.write().await;
        let mut comments = self.comments.comments.write().await;
        let mut events = self.audit.events.write().await;

        let current = ideas
            .get(&record.idea.id.0)
            .map(|idea| idea.status)
            .ok_or_else(|| RepositoryError::Missing(format!("idea `{}`", record.idea.id.0)))?;
        if current != record.expected_status {
            return Ok(TransitionWrite::Stale { current });
        }
        if let Some(comment) = &record.comment {
            if comments.iter().any(|existing| existing.id == comment.id) {
                return Err(RepositoryError::Duplicate(format!("comment `{}`", comment.id.0)));
            }
        }

        ideas.insert(record.idea.id.0.clone(), record.idea);
        comments.extend(record.comment);
        events.extend(record.events);
        Ok(TransitionWrite::Applied)
    }
}
