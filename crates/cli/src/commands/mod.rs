pub mod config;
pub mod dashboard;
pub mod doctor;
pub mod ideas;
pub mod migrate;
pub mod review;
pub mod seed;

use ideaflow_core::config::{AppConfig, LoadOptions};
use ideaflow_db::{connect_with_settings, migrations, DbPool, IdeaService, ServiceError};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// `(error_class, message, exit_code)` carried out of a command's async block.
pub(crate) type CommandFailure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub(crate) fn from_failure(command: &str, (error_class, message, exit_code): CommandFailure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config and builds the single-threaded runtime every command runs on.
pub(crate) fn prepare(command: &str, options: &LoadOptions) -> Result<(AppConfig, Runtime), CommandResult> {
    let config = AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })?;

    Ok((config, runtime))
}

pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) async fn open_service(config: &AppConfig) -> Result<(IdeaService, DbPool), CommandFailure> {
    let pool = open_pool(config).await?;
    Ok((IdeaService::from_pool(pool.clone(), config.workflow.clone()), pool))
}

pub(crate) fn service_failure(error: ServiceError) -> CommandFailure {
    let error_class = match &error {
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::Validation(_) => "validation",
        ServiceError::Forbidden(_) => "forbidden",
        ServiceError::Workflow(_) => "invalid_transition",
        ServiceError::Conflict { .. } => "conflict",
        ServiceError::Repository(_) => "persistence",
    };
    let exit_code = if matches!(error, ServiceError::Repository(_)) { 4 } else { 6 };
    (error_class, error.to_string(), exit_code)
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<Value, CommandFailure> {
    serde_json::to_value(value).map_err(|error| ("serialization", error.to_string(), 3u8))
}

#[cfg(test)]
mod tests {
    use ideaflow_core::approvals::AuthorizationFailure;
    use ideaflow_core::domain::idea::IdeaStatus;
    use ideaflow_db::ServiceError;
    use serde_json::Value;

    use super::{service_failure, CommandResult};

    #[test]
    fn failure_payload_carries_error_class_without_data() {
        let result = CommandResult::failure("seed", "seed_verification", "missing idea4", 6);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 6);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "seed_verification");
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn service_errors_map_to_domain_exit_code() {
        let (class, message, code) = service_failure(ServiceError::Forbidden(
            AuthorizationFailure::InactiveUser { user_id: "approver7".to_string() },
        ));
        assert_eq!(class, "forbidden");
        assert_eq!(code, 6);
        assert!(message.contains("approver7"));
    }

    #[test]
    fn conflicting_action_has_its_own_error_class() {
        let (class, message, code) = service_failure(ServiceError::Conflict {
            idea_id: "idea2".to_string(),
            expected: IdeaStatus::UnderReview,
            current: IdeaStatus::RevisionRequested,
        });
        assert_eq!(class, "conflict");
        assert_eq!(code, 6);
        assert!(message.contains("idea2"));
    }
}
