//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 8443,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    /// Revisions kept per workload, latest included.
    pub max_history: usize,
    /// Path to the JSON governance file. Unset runs with an empty registry.
    pub governance_file: Option<String>,
    /// Operating environment substituted for `${ENV}` placeholders.
    pub operating_env: String,
    /// Namespaces whose requests bypass validation entirely.
    pub ignored_namespaces: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let max_history = match std::env::var("FLEETGATE_MAX_HISTORY") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "FLEETGATE_MAX_HISTORY must be a positive integer, got {}",
                    raw
                ))
            })?,
            Err(_) => 5,
        };
        if max_history == 0 {
            return Err(ConfigError::InvalidValue(
                "FLEETGATE_MAX_HISTORY must be at least 1".to_string(),
            ));
        }

        let governance_file = std::env::var("FLEETGATE_GOVERNANCE_FILE").ok();

        let operating_env =
            std::env::var("FLEETGATE_ENV").unwrap_or_else(|_| "dev".to_string());

        let ignored_namespaces = std::env::var("FLEETGATE_IGNORED_NAMESPACES")
            .ok()
            .map(|s| s.split(',').map(|ns| ns.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["kube-system".to_string(), "kube-public".to_string()]);

        Ok(Self {
            server,
            max_history,
            governance_file,
            operating_env,
            ignored_namespaces,
        })
    }

    pub fn is_ignored_namespace(&self, namespace: &str) -> bool {
        self.ignored_namespaces.iter().any(|ns| ns == namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 8443);
    }

    #[test]
    fn ignored_namespace_matching() {
        let settings = Settings {
            server: ServerConfig::default(),
            max_history: 5,
            governance_file: None,
            operating_env: "dev".to_string(),
            ignored_namespaces: vec!["kube-system".to_string()],
        };
        assert!(settings.is_ignored_namespace("kube-system"));
        assert!(!settings.is_ignored_namespace("prod"));
    }
}
