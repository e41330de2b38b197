pub mod config;
pub mod mine;
pub mod products;
pub mod recommend;
pub mod rules;

use std::path::Path;

use cartwise_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use cartwise_core::{ApplicationError, DomainError};
use serde::Serialize;

use crate::artifact::{read_artifact, RuleSetArtifact};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<T: Serialize> {
    command: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

impl CommandResult {
    pub fn success<T: Serialize>(command: &str, data: T) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: None,
            hint: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn from_error(command: &str, error: CommandError) -> Self {
        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            error_class = error.error_class(),
            error = %error,
            "command failed"
        );
        let payload: CommandOutcome<()> = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error.error_class().to_string()),
            message: Some(error.to_string()),
            hint: Some(error.hint().to_string()),
            data: None,
        };
        Self { exit_code: error.exit_code(), output: serialize_payload(&payload) }
    }
}

/// Everything a command can fail with, classified for structured output.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error("{0:#}")]
    Input(anyhow::Error),
}

impl From<DomainError> for CommandError {
    fn from(error: DomainError) -> Self {
        Self::Application(error.into())
    }
}

impl CommandError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Application(error) => error.error_class(),
            Self::Input(_) => "input_validation",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::Config(_) => {
                "The configuration is invalid. Check the config file and CARTWISE_* variables."
            }
            Self::Application(error) => error.user_message(),
            Self::Input(_) => "The input could not be parsed. Check that it is well-formed JSON.",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.error_class() {
            "config_validation" => 2,
            "persistence" => 4,
            _ => 3,
        }
    }
}

pub(crate) fn load_config(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandError> {
    let options = LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        overrides,
    };
    Ok(AppConfig::load(options)?)
}

pub(crate) fn load_artifact(path: &Path) -> Result<RuleSetArtifact, CommandError> {
    read_artifact(path)
        .map_err(|error| ApplicationError::Persistence(format!("{error:#}")).into())
}

fn serialize_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[derive(Serialize)]
    struct Counts {
        rules: usize,
    }

    #[test]
    fn success_flattens_data_next_to_status() {
        let result = CommandResult::success("rules", Counts { rules: 3 });
        let payload: Value = serde_json::from_str(&result.output).unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["command"], "rules");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["rules"], 3);
        assert!(payload.get("error_class").is_none());
        assert!(payload.get("hint").is_none());
    }

    #[test]
    fn errors_map_to_exit_codes_by_class() {
        let threshold: CommandError =
            DomainError::InvalidThreshold { name: "min_support", value: 2.0 }.into();
        let basket: CommandError =
            DomainError::InvalidBasketItem { index: 0, reason: "null".to_owned() }.into();
        let missing: CommandError = ApplicationError::Persistence("gone".to_owned()).into();
        let input = CommandError::Input(anyhow::anyhow!("bad json"));

        assert_eq!((threshold.error_class(), threshold.exit_code()), ("config_validation", 2));
        assert_eq!((basket.error_class(), basket.exit_code()), ("domain_validation", 3));
        assert_eq!((missing.error_class(), missing.exit_code()), ("persistence", 4));
        assert_eq!((input.error_class(), input.exit_code()), ("input_validation", 3));
    }

    #[test]
    fn failure_payload_carries_class_and_message() {
        let error: CommandError =
            ApplicationError::Persistence("rules.json missing".to_owned()).into();
        let result = CommandResult::from_error("products", error);
        let payload: Value = serde_json::from_str(&result.output).unwrap();

        assert_eq!(result.exit_code, 4);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "persistence");
        assert_eq!(payload["message"], "persistence failure: rules.json missing");
        assert_eq!(payload["hint"], "The rule-set artifact could not be read or written.");
    }

    #[test]
    fn hint_follows_the_error_source() {
        let threshold: CommandError =
            DomainError::InvalidThreshold { name: "min_support", value: 2.0 }.into();
        let config: CommandError = ConfigError::Validation("top_n".to_owned()).into();
        let input = CommandError::Input(anyhow::anyhow!("bad json"));

        assert_eq!(
            threshold.hint(),
            "The configuration is invalid. Check thresholds and limits."
        );
        assert!(config.hint().contains("CARTWISE_*"));
        assert!(input.hint().contains("well-formed JSON"));
    }
}
