pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ideaflow_core::config::{AppConfig, LoadOptions, LoggingConfig};
use ideaflow_core::domain::idea::IdeaStatus;

use crate::commands::review::ReviewAction;

#[derive(Debug, Parser)]
#[command(
    name = "ideaflow",
    about = "Ideaflow operator CLI",
    long_about = "Operate the idea approval workflow: migrations, fixtures, config inspection, readiness checks, dashboards and reviews.",
    after_help = "Examples:\n  ideaflow migrate\n  ideaflow seed\n  ideaflow dashboard\n  ideaflow review idea4 --actor approver2 approve"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic mock dataset and verify it")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Compute every dashboard metric from stored ideas")]
    Dashboard,
    #[command(subcommand, about = "List and inspect ideas")]
    Ideas(IdeasCommand),
    #[command(about = "Apply an approver action to an idea")]
    Review(ReviewArgs),
}

#[derive(Debug, Subcommand)]
pub enum IdeasCommand {
    #[command(about = "List ideas, newest first")]
    List {
        #[arg(long, help = "Only ideas in this status, e.g. under_review")]
        status: Option<IdeaStatus>,
    },
    #[command(about = "Show one idea with its comments and audit trail")]
    Show { idea_id: String },
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    pub idea_id: String,
    #[arg(long, help = "User performing the action")]
    pub actor: String,
    #[command(subcommand)]
    pub action: ReviewAction,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config, ..LoadOptions::default() };

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config.logging);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(&options),
        },
        Command::Doctor { json } => {
            let (exit_code, output) = commands::doctor::run(&options, json);
            commands::CommandResult { exit_code, output }
        }
        Command::Dashboard => commands::dashboard::run(&options),
        Command::Ideas(IdeasCommand::List { status }) => commands::ideas::list(&options, status),
        Command::Ideas(IdeasCommand::Show { idea_id }) => commands::ideas::show(&options, &idea_id),
        Command::Review(args) => {
            commands::review::run(&options, &args.idea_id, &args.actor, args.action)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging(config: &LoggingConfig) {
    use ideaflow_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
