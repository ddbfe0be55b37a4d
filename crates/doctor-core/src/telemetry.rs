//! Tracing initialisation for hosts embedding the diagnostic engine.
//!
//! Call [`init_tracing`] once at startup. Later calls are ignored since the
//! global subscriber can only be set once per process.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{DoctorConfig, LogFormat};

/// Initialise the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (an `EnvFilter` directive
/// such as `"info"` or `"doctor_core=debug"`) is used.
pub fn init_tracing(format: LogFormat, level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).json())
                .try_init()
                .ok();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .try_init()
                .ok();
        }
    }
}

/// [`init_tracing`] with the log settings from `config`.
pub fn init_from_config(config: &DoctorConfig) {
    init_tracing(config.log_format, &config.log_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing(LogFormat::Text, "info");
        init_tracing(LogFormat::Json, "debug");
    }
}
