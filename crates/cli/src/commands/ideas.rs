use ideaflow_core::config::LoadOptions;
use ideaflow_core::domain::idea::{IdeaId, IdeaStatus};
use ideaflow_db::ServiceError;
use serde_json::json;

use crate::commands::{open_service, prepare, service_failure, to_data, CommandFailure, CommandResult};

pub fn list(options: &LoadOptions, status: Option<IdeaStatus>) -> CommandResult {
    let (config, runtime) = match prepare("ideas.list", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let (service, pool) = open_service(&config).await?;
        let ideas = match status {
            Some(status) => service.list_ideas_by_status(status).await,
            None => service.list_ideas().await,
        };
        pool.close().await;
        let ideas = ideas.map_err(service_failure)?;
        Ok::<_, CommandFailure>((ideas.len(), to_data(&ideas)?))
    });

    match result {
        Ok((count, data)) => {
            let scope = status.map(|status| format!(" in status {status}")).unwrap_or_default();
            CommandResult::success_with_data("ideas.list", format!("{count} idea(s){scope}"), Some(data))
        }
        Err(failure) => CommandResult::from_failure("ideas.list", failure),
    }
}

pub fn show(options: &LoadOptions, idea_id: &str) -> CommandResult {
    let (config, runtime) = match prepare("ideas.show", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let idea_id = IdeaId(idea_id.to_string());
    let result = runtime.block_on(async {
        let (service, pool) = open_service(&config).await?;
        let loaded = async {
            let idea = service.get_idea(&idea_id).await?;
            let comments = service.comments_for_idea(&idea_id).await?;
            let audit = service.audit_trail(&idea_id).await?;
            Ok::<_, ServiceError>((idea, comments, audit))
        }
        .await
        .map_err(service_failure);
        pool.close().await;

        let (idea, comments, audit) = loaded?;
        let message = format!("{} ({})", idea.title, idea.status.label());
        let data = json!({
            "idea": to_data(&idea)?,
            "comments": to_data(&comments)?,
            "audit": to_data(&audit)?,
        });
        Ok::<_, CommandFailure>((message, data))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("ideas.show", message, Some(data)),
        Err(failure) => CommandResult::from_failure("ideas.show", failure),
    }
}
