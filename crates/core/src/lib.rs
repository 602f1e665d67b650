pub mod approvals;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod workflow;

pub use approvals::{
    approvers_for_category, ApprovalAuthority, ApprovalQueue, AuthorizationFailure,
    AuthorizationResult, QueueFilter,
};
pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use domain::comment::{Comment, CommentId, CommentType};
pub use domain::idea::{Idea, IdeaId, IdeaStatus, ImplementationPhase, Level, NewIdea};
pub use domain::user::{User, UserId, UserRole};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use metrics::DashboardSnapshot;
pub use workflow::{ApprovalAction, WorkflowEngine, WorkflowError};
