//! Governance configuration
//!
//! Per-flavor settings the organization mandates: protected environment
//! variables tenants may not silently override, plus the runtime
//! defaults merged into every spec before it is recorded. Loaded once at
//! startup and read-only afterwards; tests construct a registry
//! explicitly instead of sharing process-wide state.

use crate::error::AppError;
use crate::models::workload::{EnvVar, Flavor, Workload};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Governance settings for one flavor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorConfig {
    /// Ordered list of centrally mandated env entries. Values may carry
    /// `${APP}`, `${NAMESPACE}` and `${ENV}` placeholders.
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub replicas: Option<i32>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub health: Option<String>,
}

/// On-disk shape of the governance file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GovernanceFile {
    #[serde(default)]
    flavors: HashMap<Flavor, FlavorConfig>,
}

/// Registry of governance configs, keyed by flavor
#[derive(Debug, Default)]
pub struct GovernanceRegistry {
    configs: HashMap<Flavor, FlavorConfig>,
    /// Operating environment name substituted for `${ENV}`.
    operating_env: String,
}

impl GovernanceRegistry {
    /// Build a registry from explicit configs. This is the only
    /// constructor tests use; there is no global instance.
    pub fn new(configs: HashMap<Flavor, FlavorConfig>, operating_env: impl Into<String>) -> Self {
        Self {
            configs,
            operating_env: operating_env.into(),
        }
    }

    /// Empty registry: every flavor is unmanaged and env governance
    /// checks pass trivially.
    pub fn empty(operating_env: impl Into<String>) -> Self {
        Self::new(HashMap::new(), operating_env)
    }

    /// Load the registry from a JSON governance file.
    pub fn from_file(path: impl AsRef<Path>, operating_env: impl Into<String>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(format!(
                "cannot read governance file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let file: GovernanceFile = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("governance file is not valid JSON: {}", e)))?;
        Ok(Self::new(file.flavors, operating_env))
    }

    /// Governance config for a flavor, if the flavor is managed at all.
    pub fn flavor(&self, flavor: Flavor) -> Option<&FlavorConfig> {
        self.configs.get(&flavor)
    }

    pub fn operating_env(&self) -> &str {
        &self.operating_env
    }

    /// Resolve `${APP}`, `${NAMESPACE}` and `${ENV}` placeholders in a
    /// configured value against one workload's identity.
    pub fn decode(&self, workload: &Workload, value: &str) -> String {
        value
            .replace("${APP}", &workload.name)
            .replace("${NAMESPACE}", &workload.namespace)
            .replace("${ENV}", &self.operating_env)
    }

    /// Decode an env entry's literal value; value-source references pass
    /// through untouched.
    pub fn decode_env(&self, workload: &Workload, env: &EnvVar) -> EnvVar {
        EnvVar {
            name: env.name.clone(),
            value: self.decode(workload, &env.value),
            value_from: env.value_from.clone(),
        }
    }
}
