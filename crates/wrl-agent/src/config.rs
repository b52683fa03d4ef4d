use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),
    #[error("config parse error: {0}")]
    ParseError(String),
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Settings for the demo scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    // Simulated host settings
    pub host_enabled_at_start: bool,
    pub host_reachable: bool,

    // Scenario settings
    pub push_toggles: u32,
    pub toggle_interval_ms: u64,
    pub send_sos: bool,

    // Logging
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host_enabled_at_start: false,
            host_reachable: true,
            push_toggles: 4,
            toggle_interval_ms: 250,
            send_sos: true,
            log_level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(e.to_string()))?;

        let config: AgentConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("WRL_HOST_ENABLED") {
            config.host_enabled_at_start = v.parse().unwrap_or(config.host_enabled_at_start);
        }
        if let Ok(v) = std::env::var("WRL_HOST_REACHABLE") {
            config.host_reachable = v.parse().unwrap_or(config.host_reachable);
        }
        if let Ok(v) = std::env::var("WRL_PUSH_TOGGLES") {
            config.push_toggles = v.parse().unwrap_or(config.push_toggles);
        }
        if let Ok(v) = std::env::var("WRL_TOGGLE_INTERVAL_MS") {
            config.toggle_interval_ms = v.parse().unwrap_or(config.toggle_interval_ms);
        }
        if let Ok(v) = std::env::var("WRL_SEND_SOS") {
            config.send_sos = v.parse().unwrap_or(config.send_sos);
        }
        if let Ok(v) = std::env::var("WRL_LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toggle_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "toggle_interval_ms must be greater than zero".into(),
            ));
        }
        if self.push_toggles > 10_000 {
            return Err(ConfigError::ValidationError(
                "push_toggles is unreasonably large".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = AgentConfig {
            toggle_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let config = AgentConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: AgentConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.push_toggles, config.push_toggles);
        assert_eq!(parsed.log_level, config.log_level);
    }
}
