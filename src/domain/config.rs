use crate::domain::error::{ConfCtlError, ConfCtlResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port of the device command shell.
pub const DEFAULT_PORT: u16 = 24;

/// ConfCtl configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfCtlConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Known endpoints
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Connection parameters for one conferencing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint name
    #[serde(default)]
    pub name: String,
    /// IP address or hostname of the device
    pub address: String,
    /// Command shell port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pacing delay in milliseconds, slept before the write and before the
    /// read. Only used by [`ReadMode::FixedDelay`]; quiescent reads ignore it.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// How a response is collected after a command is written
    #[serde(default)]
    pub read_mode: ReadMode,
    /// Prompt text the device prints when it is ready for the next command
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Response collection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReadMode {
    /// Sleep for the pacing delay before the write and before a single read.
    FixedDelay {
        #[serde(default = "default_deadline")]
        deadline_ms: u64,
    },
    /// Read until the device goes quiet, prints its prompt, or the deadline passes.
    Quiescent {
        #[serde(default = "default_idle_gap")]
        idle_gap_ms: u64,
        #[serde(default = "default_deadline")]
        deadline_ms: u64,
    },
}

impl ReadMode {
    pub fn fixed_delay() -> Self {
        ReadMode::FixedDelay {
            deadline_ms: default_deadline(),
        }
    }

    pub fn deadline(&self) -> Duration {
        match self {
            ReadMode::FixedDelay { deadline_ms } | ReadMode::Quiescent { deadline_ms, .. } => {
                Duration::from_millis(*deadline_ms)
            }
        }
    }
}

impl Default for ReadMode {
    fn default() -> Self {
        ReadMode::Quiescent {
            idle_gap_ms: default_idle_gap(),
            deadline_ms: default_deadline(),
        }
    }
}

impl EndpointConfig {
    /// Endpoint on the default port with default timings.
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            name: address.clone(),
            address,
            port: default_port(),
            timeout_ms: default_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            read_mode: ReadMode::default(),
            prompt: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Check that the endpoint can be connected to.
    pub fn validate(&self) -> ConfCtlResult<()> {
        if self.address.trim().is_empty() {
            return Err(ConfCtlError::config(format!(
                "Endpoint '{}' has no address",
                self.name
            )));
        }
        if self.port == 0 {
            return Err(ConfCtlError::config(format!(
                "Endpoint '{}' has invalid port 0",
                self.name
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfCtlError::config(format!(
                "Endpoint '{}' has a zero connect timeout",
                self.name
            )));
        }
        match self.read_mode {
            ReadMode::FixedDelay { deadline_ms: 0 } | ReadMode::Quiescent { deadline_ms: 0, .. } => {
                Err(ConfCtlError::config(format!(
                    "Endpoint '{}' has a zero read deadline",
                    self.name
                )))
            }
            ReadMode::Quiescent { idle_gap_ms: 0, .. } => Err(ConfCtlError::config(format!(
                "Endpoint '{}' has a zero idle gap",
                self.name
            ))),
            _ => Ok(()),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    2000
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_idle_gap() -> u64 {
    300
}

fn default_deadline() -> u64 {
    10_000
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = ConfCtlConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let _deserialized: ConfCtlConfig = toml::from_str(&toml_str).unwrap();
    }

    #[test]
    fn test_endpoint_defaults_from_toml() {
        let config: ConfCtlConfig = toml::from_str(
            r#"
            [[endpoints]]
            name = "boardroom"
            address = "192.168.1.40"
            "#,
        )
        .unwrap();

        let endpoint = &config.endpoints[0];
        assert_eq!(endpoint.port, 24);
        assert_eq!(endpoint.timeout_ms, 2000);
        assert_eq!(endpoint.prompt, None);
        assert_eq!(endpoint.read_mode, ReadMode::default());
        assert_eq!(config.global.log_level, "info");
    }

    #[test]
    fn test_fixed_delay_read_mode() {
        let config: ConfCtlConfig = toml::from_str(
            r#"
            [[endpoints]]
            name = "legacy"
            address = "10.0.0.5"
            timeout_ms = 500

            [endpoints.read_mode]
            mode = "fixed_delay"
            "#,
        )
        .unwrap();

        let endpoint = &config.endpoints[0];
        assert_eq!(endpoint.read_mode, ReadMode::fixed_delay());
        assert_eq!(endpoint.pacing_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_missing_address_is_rejected() {
        let result: Result<ConfCtlConfig, _> = toml::from_str(
            r#"
            [[endpoints]]
            name = "nowhere"
            "#,
        );
        assert!(result.is_err());

        let endpoint = EndpointConfig::new("  ");
        assert!(matches!(endpoint.validate(), Err(ConfCtlError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(EndpointConfig::new("10.0.0.5").validate().is_ok());
        assert!(EndpointConfig::new("10.0.0.5").with_port(0).validate().is_err());
        assert!(EndpointConfig::new("10.0.0.5")
            .with_read_mode(ReadMode::Quiescent {
                idle_gap_ms: 0,
                deadline_ms: 100,
            })
            .validate()
            .is_err());
        assert!(EndpointConfig::new("10.0.0.5")
            .with_read_mode(ReadMode::FixedDelay { deadline_ms: 0 })
            .validate()
            .is_err());
    }
}
