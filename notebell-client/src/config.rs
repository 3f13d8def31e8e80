//! Configuration loading for the notebell client.
//!
//! The file is TOML. Every field has a default, so an absent file or a
//! partial one is valid; values that are present must pass `validate`.

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_API_BASE_URL, DEFAULT_LOG_FILTER, DEFAULT_PREFERENCES_PATH,
    DEFAULT_REMINDER_FALLBACK_BODY, DEFAULT_REMINDER_TITLE, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_SCAN_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub preferences_path: PathBuf,
    pub reminders: ReminderConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReminderConfig {
    pub scan_interval_ms: u64,
    pub title: String,
    pub fallback_body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NotificationConfig {
    pub channel: ChannelKind,
    /// Program and leading arguments for the `command` channel.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Log,
    Command,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            reminders: ReminderConfig::default(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            title: DEFAULT_REMINDER_TITLE.to_string(),
            fallback_body: DEFAULT_REMINDER_FALLBACK_BODY.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    /// Load from `--config <path>` or `NOTEBELL_CONFIG`, else use defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match config_path_from_args().or_else(config_path_from_env) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.preferences_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "preferences_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.reminders.scan_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reminders.scan_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.reminders.title.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reminders.title",
                reason: "must not be empty".to_string(),
            });
        }
        if self.notifications.channel == ChannelKind::Command
            && self
                .notifications
                .command
                .first()
                .map_or(true, |program| program.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "notifications.command",
                reason: "a program is required for the command channel".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.reminders.scan_interval_ms, 30_000);
        assert_eq!(config.notifications.channel, ChannelKind::Log);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            api_base_url = "http://notes.internal:9000"

            [reminders]
            scan_interval_ms = 5000
            "#,
        )
        .expect("partial config parses");
        assert_eq!(config.api_base_url, "http://notes.internal:9000");
        assert_eq!(config.reminders.scan_interval_ms, 5000);
        assert_eq!(config.reminders.title, DEFAULT_REMINDER_TITLE);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            ClientConfig::from_toml("colour = \"blue\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_command_channel_requires_program() {
        let config = ClientConfig::from_toml(
            r#"
            [notifications]
            channel = "command"
            "#,
        )
        .expect("config parses");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "notifications.command",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_http_base() {
        let config = ClientConfig {
            api_base_url: "localhost:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
