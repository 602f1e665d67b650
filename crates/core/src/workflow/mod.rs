pub mod engine;
pub mod states;

pub use engine::{IdeaReviewFlow, WorkflowDefinition, WorkflowEngine, WorkflowError};
pub use states::{
    ApprovalAction, ApprovalActionKind, CommentDraft, TransitionOutcome, WorkflowContext,
    WorkflowEffect, DEFAULT_APPROVAL_NOTE,
};
