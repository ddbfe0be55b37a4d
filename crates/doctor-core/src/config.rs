//! Engine configuration.

use std::str::FromStr;

/// Default `list_sessions` page size.
pub const DEFAULT_SESSION_LIST_LIMIT: usize = 20;

/// Log output format for [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                key: "DOCTOR_LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for a `SessionManager` / `DiagnosticsQuery` pair bound to one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorConfig {
    pub stack_id: String,
    pub session_list_limit: usize,
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl DoctorConfig {
    pub fn new(stack_id: impl Into<String>) -> Self {
        Self {
            stack_id: stack_id.into(),
            session_list_limit: DEFAULT_SESSION_LIST_LIMIT,
            log_format: LogFormat::Text,
            log_level: "info".to_string(),
        }
    }

    pub fn with_session_list_limit(mut self, limit: usize) -> Self {
        self.session_list_limit = limit;
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - DOCTOR_STACK_ID (required)
    /// - DOCTOR_SESSION_LIST_LIMIT (optional, default: 20)
    /// - DOCTOR_LOG_FORMAT (optional, "text" | "json", default: "text")
    /// - DOCTOR_LOG_LEVEL (optional, default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_id = lookup("DOCTOR_STACK_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DOCTOR_STACK_ID"))?;

        let mut config = Self::new(stack_id);

        if let Some(raw) = lookup("DOCTOR_SESSION_LIST_LIMIT") {
            config.session_list_limit = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "DOCTOR_SESSION_LIST_LIMIT",
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup("DOCTOR_LOG_FORMAT") {
            config.log_format = raw.trim().parse()?;
        }
        if let Some(level) = lookup("DOCTOR_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}
