use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use ideaflow_core::approvals::{ApprovalAuthority, ApprovalQueue, AuthorizationFailure, QueueFilter};
use ideaflow_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, InMemoryAuditSink,
};
use ideaflow_core::config::WorkflowConfig;
use ideaflow_core::domain::comment::{Comment, CommentId, CommentType};
use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus, NewIdea};
use ideaflow_core::domain::user::{User, UserId};
use ideaflow_core::errors::{ApplicationError, DomainError};
use ideaflow_core::metrics::DashboardSnapshot;
use ideaflow_core::workflow::{
    ApprovalAction, IdeaReviewFlow, WorkflowContext, WorkflowEngine, WorkflowError,
};

use crate::repositories::{
    AuditRepository, CommentRepository, IdeaRepository, InMemoryAuditRepository,
    InMemoryCommentRepository, InMemoryIdeaRepository, InMemoryTransitionRepository,
    InMemoryUserRepository, RepositoryError, SqlAuditRepository, SqlCommentRepository,
    SqlIdeaRepository, SqlTransitionRepository, SqlUserRepository, TransitionRecord,
    TransitionRepository, TransitionWrite, UserRepository,
};
use crate::DbPool;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("forbidden: {0}")]
    Forbidden(AuthorizationFailure),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("idea `{idea_id}` moved from {expected} to {current} while the action was being applied")]
    Conflict { idea_id: String, expected: IdeaStatus, current: IdeaStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ServiceError> for ApplicationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound { entity, id } => Self::NotFound { entity, id },
            ServiceError::Validation(error) => Self::Domain(error),
            ServiceError::Forbidden(failure) => Self::Forbidden(failure),
            ServiceError::Workflow(error) => Self::Domain(DomainError::Workflow(error)),
            conflict @ ServiceError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            ServiceError::Repository(error) => Self::Persistence(error.to_string()),
        }
    }
}

/// Result of a workflow action: the updated idea and the comment it produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionResult {
    pub idea: Idea,
    pub comment: Option<Comment>,
    pub from: IdeaStatus,
    pub to: IdeaStatus,
}

/// Idea submission, review and reporting over the repository layer.
pub struct IdeaService {
    ideas: Arc<dyn IdeaRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    audit: Arc<dyn AuditRepository>,
    transitions: Arc<dyn TransitionRepository>,
    authority: ApprovalAuthority,
    engine: WorkflowEngine<IdeaReviewFlow>,
    settings: WorkflowConfig,
}

impl IdeaService {
    pub fn new(
        ideas: Arc<dyn IdeaRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        audit: Arc<dyn AuditRepository>,
        transitions: Arc<dyn TransitionRepository>,
        settings: WorkflowConfig,
    ) -> Self {
        Self {
            ideas,
            users,
            comments,
            audit,
            transitions,
            authority: ApprovalAuthority::new(settings.enforce_category_scope),
            engine: WorkflowEngine::default(),
            settings,
        }
    }

    pub fn from_pool(pool: DbPool, settings: WorkflowConfig) -> Self {
        Self::new(
            Arc::new(SqlIdeaRepository::new(pool.clone())),
            Arc::new(SqlUserRepository::new(pool.clone())),
            Arc::new(SqlCommentRepository::new(pool.clone())),
            Arc::new(SqlAuditRepository::new(pool.clone())),
            Arc::new(SqlTransitionRepository::new(pool)),
            settings,
        )
    }

    pub fn in_memory(settings: WorkflowConfig) -> Self {
        let ideas = Arc::new(InMemoryIdeaRepository::default());
        let comments = Arc::new(InMemoryCommentRepository::default());
        let audit = Arc::new(InMemoryAuditRepository::default());
        let transitions =
            InMemoryTransitionRepository::new(ideas.clone(), comments.clone(), audit.clone());
        Self::new(
            ideas,
            Arc::new(InMemoryUserRepository::default()),
            comments,
            audit,
            Arc::new(transitions),
            settings,
        )
    }

    pub fn settings(&self) -> &WorkflowConfig {
        &self.settings
    }

    /// Adds or replaces a directory user.
    pub async fn register_user(&self, user: User) -> Result<(), ServiceError> {
        self.users.save(user).await?;
        Ok(())
    }

    pub async fn submit_idea(
        &self,
        input: NewIdea,
        correlation_id: &str,
    ) -> Result<Idea, ServiceError> {
        input.validate()?;
        let submitter = self.require_user(&input.submitter_id).await?;
        if !submitter.is_active {
            return Err(ServiceError::Forbidden(AuthorizationFailure::InactiveUser {
                user_id: submitter.id.0,
            }));
        }

        let idea = Idea::submit(IdeaId(Uuid::new_v4().to_string()), input, Utc::now())?;
        self.ideas.save(idea.clone()).await?;
        self.audit
            .append(
                AuditEvent::new(
                    Some(idea.id.clone()),
                    correlation_id,
                    "idea.submitted",
                    AuditCategory::Submission,
                    submitter.id.0.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("category", idea.category.clone()),
            )
            .await?;

        info!(
            event_name = "idea.submitted",
            correlation_id = %correlation_id,
            idea_id = %idea.id,
            submitter_id = %submitter.id,
            category = %idea.category,
            "idea submitted"
        );

        Ok(idea)
    }

    pub async fn get_idea(&self, idea_id: &IdeaId) -> Result<Idea, ServiceError> {
        self.require_idea(idea_id).await
    }

    /// Every idea, newest submission first.
    pub async fn list_ideas(&self) -> Result<Vec<Idea>, ServiceError> {
        Ok(self.ideas.list_all().await?)
    }

    pub async fn list_ideas_by_status(&self, status: IdeaStatus) -> Result<Vec<Idea>, ServiceError> {
        Ok(self.ideas.list_by_status(status).await?)
    }

    /// Runs one approver action through the review flow and persists its effects.
    ///
    /// Rejected transitions are still written to the audit trail before the
    /// error is returned. The idea, its comment and the audit events are stored
    /// in one write that only lands if the idea still has the status the action
    /// was evaluated against.
    pub async fn apply_action(
        &self,
        idea_id: &IdeaId,
        actor_id: &UserId,
        action: ApprovalAction,
        correlation_id: &str,
    ) -> Result<ActionResult, ServiceError> {
        let mut idea = self.require_idea(idea_id).await?;
        let actor = self.require_user(actor_id).await?;

        if let Err(failure) = self.authority.authorize(&actor, &idea).into_result() {
            warn!(
                event_name = "idea.action.forbidden",
                correlation_id = %correlation_id,
                idea_id = %idea.id,
                actor_id = %actor.id,
                action = %action.kind(),
                reason = %failure,
                "workflow action denied"
            );
            self.audit
                .append(
                    AuditEvent::new(
                        Some(idea.id.clone()),
                        correlation_id,
                        "idea.action_forbidden",
                        AuditCategory::Workflow,
                        actor.id.0.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("action", action.kind().as_str())
                    .with_metadata("reason", failure.reason()),
                )
                .await?;
            return Err(ServiceError::Forbidden(failure));
        }

        if let ApprovalAction::Assign { approver_id } = &action {
            let assignee = self.require_user(approver_id).await?;
            self.authority.authorize(&assignee, &idea).into_result().map_err(ServiceError::Forbidden)?;
        }

        let sink = InMemoryAuditSink::default();
        let transition = self.engine.apply_with_audit(
            idea.status,
            &action,
            &WorkflowContext::new(actor.id.clone()),
            &sink,
            &AuditContext::new(Some(idea.id.clone()), correlation_id, actor.id.0.clone()),
        );
        let transition = match transition {
            Ok(transition) => transition,
            Err(error) => {
                for event in sink.drain() {
                    self.audit.append(event).await?;
                }
                warn!(
                    event_name = "idea.action.rejected",
                    correlation_id = %correlation_id,
                    idea_id = %idea.id,
                    status = %idea.status,
                    action = %action.kind(),
                    error = %error,
                    "workflow transition rejected"
                );
                return Err(error.into());
            }
        };

        let expected_status = idea.status;
        let now = Utc::now();
        let comment = transition
            .apply_to(&mut idea, now)
            .map(|draft| {
                Comment::new(
                    CommentId(Uuid::new_v4().to_string()),
                    idea.id.clone(),
                    actor.id.clone(),
                    draft.text,
                    draft.comment_type,
                    now,
                )
            })
            .transpose()?;

        let mut event = AuditEvent::new(
            Some(idea.id.clone()),
            correlation_id,
            transition.action.audit_event(),
            AuditCategory::Workflow,
            actor.id.0.clone(),
            AuditOutcome::Success,
        )
        .with_metadata("from", transition.from.as_str())
        .with_metadata("to", transition.to.as_str());
        if let Some(approver_id) = &idea.assigned_approver_id {
            event = event.with_metadata("assigned_approver_id", approver_id.0.clone());
        }
        let mut events = sink.drain();
        events.push(event);

        let written = self
            .transitions
            .record_transition(TransitionRecord {
                idea: idea.clone(),
                expected_status,
                comment: comment.clone(),
                events,
            })
            .await?;
        if let TransitionWrite::Stale { current } = written {
            return Err(self
                .refuse_stale_action(
                    &idea.id,
                    &actor.id,
                    &action,
                    expected_status,
                    current,
                    correlation_id,
                )
                .await?);
        }

        info!(
            event_name = "idea.action.applied",
            correlation_id = %correlation_id,
            idea_id = %idea.id,
            actor_id = %actor.id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "workflow action applied"
        );

        Ok(ActionResult { idea, comment, from: transition.from, to: transition.to })
    }

    /// Appends a general comment. Anyone in the directory may comment.
    pub async fn add_comment(
        &self,
        idea_id: &IdeaId,
        user_id: &UserId,
        text: &str,
        correlation_id: &str,
    ) -> Result<Comment, ServiceError> {
        let idea = self.require_idea(idea_id).await?;
        let user = self.require_user(user_id).await?;

        let comment = Comment::new(
            CommentId(Uuid::new_v4().to_string()),
            idea.id.clone(),
            user.id.clone(),
            text,
            CommentType::General,
            Utc::now(),
        )?;
        self.comments.append(comment.clone()).await?;
        self.audit
            .append(AuditEvent::new(
                Some(idea.id.clone()),
                correlation_id,
                "idea.comment_added",
                AuditCategory::Comment,
                user.id.0.clone(),
                AuditOutcome::Success,
            ))
            .await?;

        info!(
            event_name = "idea.comment.added",
            correlation_id = %correlation_id,
            idea_id = %idea.id,
            user_id = %user.id,
            "comment added"
        );

        Ok(comment)
    }

    pub async fn comments_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<Comment>, ServiceError> {
        let idea = self.require_idea(idea_id).await?;
        Ok(self.comments.list_for_idea(&idea.id).await?)
    }

    pub async fn audit_trail(&self, idea_id: &IdeaId) -> Result<Vec<AuditEvent>, ServiceError> {
        let idea = self.require_idea(idea_id).await?;
        Ok(self.audit.list_for_idea(&idea.id).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.list_all().await?)
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<User, ServiceError> {
        self.require_user(user_id).await
    }

    pub async fn approval_queue(
        &self,
        reviewer_id: &UserId,
        filter: &QueueFilter,
    ) -> Result<ApprovalQueue, ServiceError> {
        let reviewer = self.require_user(reviewer_id).await?;
        let ideas = self.ideas.list_all().await?;
        ApprovalQueue::build(&reviewer, &ideas, filter).map_err(ServiceError::Forbidden)
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardSnapshot, ServiceError> {
        let ideas = self.ideas.list_all().await?;
        let users = self.users.list_all().await?;
        Ok(DashboardSnapshot::compute(
            &ideas,
            &users,
            now,
            self.settings.timeline_months,
            self.settings.recent_ideas_limit,
        ))
    }

    /// Audits an action that lost the race for the idea and builds the error to return.
    ///
    /// A terminal idea refuses the action outright. Any other status change
    /// is reported as a conflict so the caller can reload and retry.
    async fn refuse_stale_action(
        &self,
        idea_id: &IdeaId,
        actor_id: &UserId,
        action: &ApprovalAction,
        expected: IdeaStatus,
        current: IdeaStatus,
        correlation_id: &str,
    ) -> Result<ServiceError, ServiceError> {
        warn!(
            event_name = "idea.action.conflict",
            correlation_id = %correlation_id,
            idea_id = %idea_id,
            actor_id = %actor_id,
            action = %action.kind(),
            expected = %expected,
            current = %current,
            "idea changed before the workflow action was stored"
        );
        self.audit
            .append(
                AuditEvent::new(
                    Some(idea_id.clone()),
                    correlation_id,
                    "idea.action_conflict",
                    AuditCategory::Workflow,
                    actor_id.0.clone(),
                    AuditOutcome::Rejected,
                )
                .with_metadata("action", action.kind().as_str())
                .with_metadata("expected", expected.as_str())
                .with_metadata("current", current.as_str()),
            )
            .await?;

        if current.is_terminal() {
            return Ok(ServiceError::Workflow(WorkflowError::InvalidTransition {
                status: current,
                action: action.kind(),
            }));
        }
        Ok(ServiceError::Conflict { idea_id: idea_id.0.clone(), expected, current })
    }

    async fn require_idea(&self, idea_id: &IdeaId) -> Result<Idea, ServiceError> {
        self.ideas
            .find_by_id(idea_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound { entity: "idea", id: idea_id.0.clone() })
    }

    async fn require_user(&self, user_id: &UserId) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound { entity: "user", id: user_id.0.clone() })
    }
}
