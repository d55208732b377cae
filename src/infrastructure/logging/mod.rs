// Logging module - Logging infrastructure
use crate::domain::config::GlobalConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Initialize logging system
///
/// `RUST_LOG` wins over the configured `log_level`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &GlobalConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.log_level)))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
        )
        .try_init()?;

    tracing::info!("ConfCtl logging system initialized");
    Ok(())
}

fn default_directives(log_level: &str) -> String {
    format!("confctl={},warn", log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_use_configured_level() {
        let config = GlobalConfig {
            log_level: "trace".to_string(),
        };
        assert_eq!(default_directives(&config.log_level), "confctl=trace,warn");
        assert!(EnvFilter::try_new(default_directives(&config.log_level)).is_ok());
    }

    #[test]
    fn test_logging_init() {
        // First install succeeds, a second one is refused rather than panicking
        let config = GlobalConfig {
            log_level: "debug".to_string(),
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_err());
    }
}
