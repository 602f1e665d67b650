use ideaflow_core::config::LoadOptions;
use ideaflow_db::{MockDataset, SeedResult, VerificationResult};
use tracing::{info, warn};

use crate::commands::{open_pool, prepare, CommandFailure, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    let (config, runtime) = match prepare("seed", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        let seeded = MockDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = MockDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        let drift = MockDataset::status_drift(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;
        check_verification(&verification)?;
        Ok::<_, CommandFailure>((seeded, drift.len()))
    });

    match result {
        Ok((seeded, drifted)) => {
            if drifted > 0 {
                warn!(
                    event_name = "cli.seed.status_drift",
                    correlation_id = "cli",
                    drifted_ideas = drifted,
                    "seeded ideas have moved through the workflow since the first load"
                );
            }
            info!(event_name = "cli.seed.completed", correlation_id = "cli", "mock dataset loaded");
            CommandResult::success("seed", summary(&seeded))
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn check_verification(verification: &VerificationResult) -> Result<(), CommandFailure> {
    if verification.all_present {
        return Ok(());
    }

    let failed_checks = verification.failed_checks();
    let message = if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    };
    Err(("seed_verification", message, 6))
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "mock dataset loaded: {} users, {} ideas, {} comments",
        seeded.users_seeded, seeded.ideas_seeded, seeded.comments_seeded
    )
}
