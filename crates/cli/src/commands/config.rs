use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ideaflow_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// One reportable setting and the environment variables that can set it.
struct Setting {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = resolve_config_path(options.config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source = field_source(&setting, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", setting.key_path, setting.value));
    }

    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    vec![
        Setting {
            key_path: "database.url",
            value: config.database.url.clone(),
            env_keys: &["IDEAFLOW_DATABASE_URL"],
        },
        Setting {
            key_path: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["IDEAFLOW_DATABASE_MAX_CONNECTIONS"],
        },
        Setting {
            key_path: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["IDEAFLOW_DATABASE_TIMEOUT_SECS"],
        },
        Setting {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["IDEAFLOW_SERVER_BIND_ADDRESS"],
        },
        Setting {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["IDEAFLOW_SERVER_PORT"],
        },
        Setting {
            key_path: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["IDEAFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Setting {
            key_path: "workflow.enforce_category_scope",
            value: config.workflow.enforce_category_scope.to_string(),
            env_keys: &["IDEAFLOW_WORKFLOW_ENFORCE_CATEGORY_SCOPE"],
        },
        Setting {
            key_path: "workflow.recent_ideas_limit",
            value: config.workflow.recent_ideas_limit.to_string(),
            env_keys: &["IDEAFLOW_WORKFLOW_RECENT_IDEAS_LIMIT"],
        },
        Setting {
            key_path: "workflow.timeline_months",
            value: config.workflow.timeline_months.to_string(),
            env_keys: &["IDEAFLOW_WORKFLOW_TIMELINE_MONTHS"],
        },
        Setting {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["IDEAFLOW_LOGGING_LEVEL", "IDEAFLOW_LOG_LEVEL"],
        },
        Setting {
            key_path: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["IDEAFLOW_LOGGING_FORMAT", "IDEAFLOW_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(setting: &Setting, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = setting.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, setting.key_path)) {
        let file_path = file_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("config file"));
        return format!("file ({})", file_path.display());
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::contains_path;
    use toml::Value;

    #[test]
    fn nested_keys_are_found_in_toml_document() {
        let doc: Value = "[workflow]\ntimeline_months = 12\n".parse().expect("toml");

        assert!(contains_path(&doc, "workflow.timeline_months"));
        assert!(!contains_path(&doc, "workflow.recent_ideas_limit"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
