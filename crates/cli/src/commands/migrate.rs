use ideaflow_core::config::LoadOptions;
use tracing::info;

use crate::commands::{open_pool, prepare, CommandFailure, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    let (config, runtime) = match prepare("migrate", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        pool.close().await;
        Ok::<(), CommandFailure>(())
    });

    match result {
        Ok(()) => {
            info!(
                event_name = "cli.migrate.completed",
                correlation_id = "cli",
                database_url = %config.database.url,
                "applied pending migrations"
            );
            CommandResult::success("migrate", "applied pending migrations")
        }
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
