use chrono::Utc;
use clap::Subcommand;
use ideaflow_core::config::LoadOptions;
use ideaflow_core::domain::idea::IdeaId;
use ideaflow_core::domain::user::UserId;
use ideaflow_core::workflow::ApprovalAction;
use tracing::info;

use crate::commands::{open_service, prepare, service_failure, to_data, CommandFailure, CommandResult};

#[derive(Debug, Clone, Subcommand)]
pub enum ReviewAction {
    #[command(about = "Assign the idea to an approver and move it under review")]
    Assign {
        #[arg(long)]
        approver: String,
    },
    #[command(about = "Approve the idea")]
    Approve {
        #[arg(long)]
        note: Option<String>,
    },
    #[command(about = "Reject the idea with a reason")]
    Reject {
        #[arg(long)]
        reason: String,
    },
    #[command(about = "Send the idea back to its submitter for revision")]
    RequestRevision {
        #[arg(long)]
        request: String,
    },
}

impl From<ReviewAction> for ApprovalAction {
    fn from(value: ReviewAction) -> Self {
        match value {
            ReviewAction::Assign { approver } => Self::Assign { approver_id: UserId(approver) },
            ReviewAction::Approve { note } => Self::Approve { note },
            ReviewAction::Reject { reason } => Self::Reject { reason },
            ReviewAction::RequestRevision { request } => Self::RequestRevision { request },
        }
    }
}

pub fn run(options: &LoadOptions, idea_id: &str, actor_id: &str, action: ReviewAction) -> CommandResult {
    let (config, runtime) = match prepare("review", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let correlation_id = format!("cli-{}", Utc::now().timestamp_millis());
    let idea_id = IdeaId(idea_id.to_string());
    let actor_id = UserId(actor_id.to_string());
    let action = ApprovalAction::from(action);

    let result = runtime.block_on(async {
        let (service, pool) = open_service(&config).await?;
        let applied = service.apply_action(&idea_id, &actor_id, action, &correlation_id).await;
        pool.close().await;
        let applied = applied.map_err(service_failure)?;
        let message = format!("idea {} moved from {} to {}", applied.idea.id, applied.from, applied.to);
        Ok::<_, CommandFailure>((message, to_data(&applied)?))
    });

    match result {
        Ok((message, data)) => {
            info!(
                event_name = "cli.review.applied",
                correlation_id = %correlation_id,
                idea_id = %idea_id,
                actor_id = %actor_id,
                "review action applied"
            );
            CommandResult::success_with_data("review", message, Some(data))
        }
        Err(failure) => CommandResult::from_failure("review", failure),
    }
}
