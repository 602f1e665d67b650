use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::comment::CommentType;
use crate::domain::idea::IdeaStatus;
use crate::workflow::states::{
    ApprovalAction, ApprovalActionKind, TransitionOutcome, WorkflowContext, WorkflowEffect,
    DEFAULT_APPROVAL_NOTE,
};

pub trait WorkflowDefinition {
    fn initial_status(&self) -> IdeaStatus;
    fn transition(
        &self,
        current: IdeaStatus,
        action: &ApprovalAction,
        context: &WorkflowContext,
    ) -> Result<TransitionOutcome, WorkflowError>;
}

/// Review flow used for every idea: four approver actions over five statuses.
#[derive(Clone, Debug, Default)]
pub struct IdeaReviewFlow;

impl WorkflowDefinition for IdeaReviewFlow {
    fn initial_status(&self) -> IdeaStatus {
        IdeaStatus::Submitted
    }

    fn transition(
        &self,
        current: IdeaStatus,
        action: &ApprovalAction,
        context: &WorkflowContext,
    ) -> Result<TransitionOutcome, WorkflowError> {
        transition_review(current, action, context)
    }
}

pub struct WorkflowEngine<F> {
    flow: F,
}

impl<F> WorkflowEngine<F>
where
    F: WorkflowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_status(&self) -> IdeaStatus {
        self.flow.initial_status()
    }

    pub fn apply(
        &self,
        current: IdeaStatus,
        action: &ApprovalAction,
        context: &WorkflowContext,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.flow.transition(current, action, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: IdeaStatus,
        action: &ApprovalAction,
        context: &WorkflowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WorkflowError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, action, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.idea_id.clone(),
                        audit.correlation_id.clone(),
                        "workflow.transition_applied",
                        AuditCategory::Workflow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("action", outcome.action.as_str()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.idea_id.clone(),
                        audit.correlation_id.clone(),
                        "workflow.transition_rejected",
                        AuditCategory::Workflow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("action", action.kind().as_str())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for WorkflowEngine<IdeaReviewFlow> {
    fn default() -> Self {
        Self::new(IdeaReviewFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid transition from {status} using action {action}")]
    InvalidTransition { status: IdeaStatus, action: ApprovalActionKind },
    #[error("action {action} requires non-blank text")]
    MissingRequiredText { action: ApprovalActionKind },
}

fn transition_review(
    current: IdeaStatus,
    action: &ApprovalAction,
    context: &WorkflowContext,
) -> Result<TransitionOutcome, WorkflowError> {
    use IdeaStatus::{Approved, Rejected, RevisionRequested, UnderReview};
    use WorkflowEffect::{AssignApprover, RecordComment, TouchLastModified};

    let kind = action.kind();
    if current.is_terminal() {
        return Err(WorkflowError::InvalidTransition { status: current, action: kind });
    }

    let actor = AssignApprover(context.actor_id.clone());
    let (to, effects) = match action {
        ApprovalAction::Assign { approver_id } => {
            (UnderReview, vec![AssignApprover(approver_id.clone()), TouchLastModified])
        }
        ApprovalAction::Approve { note } => {
            let text = note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
                .unwrap_or(DEFAULT_APPROVAL_NOTE)
                .to_owned();
            (
                Approved,
                vec![
                    actor,
                    TouchLastModified,
                    RecordComment { comment_type: CommentType::General, text },
                ],
            )
        }
        ApprovalAction::Reject { reason } => (
            Rejected,
            vec![
                actor,
                TouchLastModified,
                RecordComment {
                    comment_type: CommentType::RejectionReason,
                    text: required_text(reason, kind)?,
                },
            ],
        ),
        ApprovalAction::RequestRevision { request } => (
            RevisionRequested,
            vec![
                actor,
                TouchLastModified,
                RecordComment {
                    comment_type: CommentType::RevisionRequest,
                    text: required_text(request, kind)?,
                },
            ],
        ),
    };

    Ok(TransitionOutcome { from: current, to, action: kind, effects })
}

fn required_text(value: &str, action: ApprovalActionKind) -> Result<String, WorkflowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::MissingRequiredText { action });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::comment::CommentType;
    use crate::domain::idea::{Idea, IdeaId, IdeaStatus, NewIdea};
    use crate::domain::user::UserId;
    use crate::workflow::engine::{IdeaReviewFlow, WorkflowDefinition, WorkflowEngine, WorkflowError};
    use crate::workflow::states::{
        ApprovalAction, ApprovalActionKind, WorkflowContext, WorkflowEffect, DEFAULT_APPROVAL_NOTE,
    };

    fn context() -> WorkflowContext {
        WorkflowContext::new(UserId("approver4".to_owned()))
    }

    fn idea() -> Idea {
        Idea::submit(
            IdeaId("idea3".to_owned()),
            NewIdea {
                title: "Four-day work week pilot".to_owned(),
                description:
                    "Pilot a four-day work week in selected departments to evaluate productivity."
                        .to_owned(),
                category: "Employee Experience".to_owned(),
                benefits: "Improved work-life balance and talent retention.".to_owned(),
                submitter_id: UserId("user3".to_owned()),
                ..NewIdea::default()
            },
            Utc::now() - Duration::days(3),
        )
        .expect("valid idea")
    }

    #[test]
    fn assign_moves_submitted_idea_under_review() {
        let engine = WorkflowEngine::default();
        let outcome = engine
            .apply(
                engine.initial_status(),
                &ApprovalAction::Assign { approver_id: UserId("approver10".to_owned()) },
                &context(),
            )
            .expect("submitted -> under_review");

        assert_eq!(outcome.to, IdeaStatus::UnderReview);
        assert!(outcome
            .effects
            .contains(&WorkflowEffect::AssignApprover(UserId("approver10".to_owned()))));
    }

    #[test]
    fn approve_records_default_general_comment() {
        let engine = WorkflowEngine::default();
        let outcome = engine
            .apply(IdeaStatus::UnderReview, &ApprovalAction::Approve { note: None }, &context())
            .expect("under_review -> approved");

        assert_eq!(outcome.to, IdeaStatus::Approved);
        assert!(outcome.effects.contains(&WorkflowEffect::RecordComment {
            comment_type: CommentType::General,
            text: DEFAULT_APPROVAL_NOTE.to_owned(),
        }));
    }

    #[test]
    fn reject_requires_reason_and_records_rejection_comment() {
        let engine = WorkflowEngine::default();
        let error = engine
            .apply(
                IdeaStatus::Submitted,
                &ApprovalAction::Reject { reason: "   ".to_owned() },
                &context(),
            )
            .expect_err("blank reason");
        assert_eq!(error, WorkflowError::MissingRequiredText { action: ApprovalActionKind::Reject });

        let outcome = engine
            .apply(
                IdeaStatus::Submitted,
                &ApprovalAction::Reject { reason: "Lacks cost-benefit analysis".to_owned() },
                &context(),
            )
            .expect("submitted -> rejected");
        assert_eq!(outcome.to, IdeaStatus::Rejected);
        assert!(outcome.effects.contains(&WorkflowEffect::RecordComment {
            comment_type: CommentType::RejectionReason,
            text: "Lacks cost-benefit analysis".to_owned(),
        }));
    }

    #[test]
    fn revision_can_be_requested_repeatedly() {
        let engine = WorkflowEngine::default();
        let action = ApprovalAction::RequestRevision { request: "Add benchmarks".to_owned() };

        let first = engine.apply(IdeaStatus::UnderReview, &action, &context()).expect("first");
        let second = engine.apply(first.to, &action, &context()).expect("second");

        assert_eq!(second.from, IdeaStatus::RevisionRequested);
        assert_eq!(second.to, IdeaStatus::RevisionRequested);
    }

    #[test]
    fn terminal_statuses_reject_every_action() {
        let engine = WorkflowEngine::default();
        let actions = [
            ApprovalAction::Assign { approver_id: UserId("approver1".to_owned()) },
            ApprovalAction::Approve { note: None },
            ApprovalAction::Reject { reason: "late".to_owned() },
            ApprovalAction::RequestRevision { request: "more detail".to_owned() },
        ];

        for status in [IdeaStatus::Approved, IdeaStatus::Rejected] {
            for action in &actions {
                let error = engine.apply(status, action, &context()).expect_err("terminal");
                assert_eq!(
                    error,
                    WorkflowError::InvalidTransition { status, action: action.kind() }
                );
            }
        }
    }

    #[test]
    fn outcome_updates_idea_and_returns_comment_draft() {
        let engine = WorkflowEngine::default();
        let mut idea = idea();
        let submitted_at = idea.last_modified;
        let now = Utc::now();

        let outcome = engine
            .apply(
                idea.status,
                &ApprovalAction::RequestRevision { request: "  Clarify rollout.  ".to_owned() },
                &context(),
            )
            .expect("submitted -> revision_requested");
        let draft = outcome.apply_to(&mut idea, now).expect("comment draft");

        assert_eq!(idea.status, IdeaStatus::RevisionRequested);
        assert_eq!(idea.assigned_approver_id, Some(UserId("approver4".to_owned())));
        assert!(idea.last_modified > submitted_at);
        assert_eq!(draft.comment_type, CommentType::RevisionRequest);
        assert_eq!(draft.text, "Clarify rollout.");
    }

    #[test]
    fn replay_is_deterministic_for_same_action_sequence() {
        let engine = WorkflowEngine::new(IdeaReviewFlow);
        let actions = [
            ApprovalAction::Assign { approver_id: UserId("approver4".to_owned()) },
            ApprovalAction::RequestRevision { request: "More detail".to_owned() },
            ApprovalAction::Approve { note: Some("Approved after revision".to_owned()) },
        ];

        let run = |engine: &WorkflowEngine<IdeaReviewFlow>| {
            let mut status = engine.initial_status();
            let mut effects = Vec::new();
            for action in &actions {
                let outcome = engine.apply(status, action, &context()).expect("deterministic run");
                effects.push(outcome.effects);
                status = outcome.to;
            }
            (status, effects)
        };

        let first = run(&engine);
        let second = run(&engine);

        assert_eq!(first, second);
        assert_eq!(first.0, IdeaStatus::Approved);
        assert_eq!(IdeaReviewFlow.initial_status(), IdeaStatus::Submitted);
    }

    #[test]
    fn transitions_emit_audit_events() {
        let engine = WorkflowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit =
            AuditContext::new(Some(IdeaId("idea2".to_owned())), "req-42", "approver10");

        engine
            .apply_with_audit(
                IdeaStatus::UnderReview,
                &ApprovalAction::Approve { note: None },
                &context(),
                &sink,
                &audit,
            )
            .expect("transition should succeed");
        let _ = engine.apply_with_audit(
            IdeaStatus::Approved,
            &ApprovalAction::Approve { note: None },
            &context(),
            &sink,
            &audit,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "workflow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("approved"));
        assert_eq!(events[1].event_type, "workflow.transition_rejected");
        assert_eq!(events[1].correlation_id, "req-42");
    }
}
