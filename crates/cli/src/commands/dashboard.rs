use chrono::Utc;
use ideaflow_core::config::LoadOptions;
use ideaflow_core::metrics::DashboardSnapshot;
use tracing::info;

use crate::commands::{open_service, prepare, service_failure, to_data, CommandFailure, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    let (config, runtime) = match prepare("dashboard", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let (service, pool) = open_service(&config).await?;
        let snapshot = service.dashboard(Utc::now()).await.map_err(service_failure);
        pool.close().await;
        let snapshot = snapshot?;
        Ok::<_, CommandFailure>((headline(&snapshot), to_data(&snapshot)?))
    });

    match result {
        Ok((message, data)) => {
            info!(event_name = "cli.dashboard.computed", correlation_id = "cli", "dashboard computed");
            CommandResult::success_with_data("dashboard", message, Some(data))
        }
        Err(failure) => CommandResult::from_failure("dashboard", failure),
    }
}

fn headline(snapshot: &DashboardSnapshot) -> String {
    let summary = &snapshot.summary;
    format!(
        "{} ideas: {} approved, {} under review, {} submitted",
        summary.total_ideas, summary.approved, summary.under_review, summary.submitted
    )
}
