//! Flavor-agnostic workload model
//!
//! One `Workload` represents a managed application instance regardless of
//! runtime. The five flavors share this structure and differ only in the
//! defaults and governance config applied to them.

use crate::error::AppError;
use crate::keys;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of workload flavors. The flavor tag is immutable once
/// set and selects which governance config applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Java,
    Python,
    Php,
    NodeJs,
    Web,
}

impl Flavor {
    pub const ALL: [Flavor; 5] = [
        Flavor::Java,
        Flavor::Python,
        Flavor::Php,
        Flavor::NodeJs,
        Flavor::Web,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Java => "java",
            Flavor::Python => "python",
            Flavor::Php => "php",
            Flavor::NodeJs => "nodejs",
            Flavor::Web => "web",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a key inside a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

/// Source for an environment variable's value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeySelector>,
}

/// A single environment variable, literal or sourced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            value_from: None,
        }
    }
}

/// A volume-claim mount declared by the workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Deployment-style or stateful-style rollout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkloadKind {
    #[default]
    Deployment,
    StatefulSet,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Deployment => f.write_str("Deployment"),
            WorkloadKind::StatefulSet => f.write_str("StatefulSet"),
        }
    }
}

/// One autoscaling metric. Each variant keys on its own inner name when
/// diffed, so a `pods` metric never collides with a `resource` metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MetricSpec {
    Object {
        metric_name: String,
        target_value: String,
    },
    External {
        metric_name: String,
        target_value: String,
    },
    Pods {
        metric_name: String,
        target_average_value: String,
    },
    Resource {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_average_utilization: Option<i32>,
    },
}

impl MetricSpec {
    /// Discriminator half of the diff key.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricSpec::Object { .. } => "object",
            MetricSpec::External { .. } => "external",
            MetricSpec::Pods { .. } => "pods",
            MetricSpec::Resource { .. } => "resource",
        }
    }

    /// Inner-name half of the diff key.
    pub fn metric_name(&self) -> &str {
        match self {
            MetricSpec::Object { metric_name, .. } => metric_name,
            MetricSpec::External { metric_name, .. } => metric_name,
            MetricSpec::Pods { metric_name, .. } => metric_name,
            MetricSpec::Resource { name, .. } => name,
        }
    }
}

/// Autoscaling block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autoscaling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricSpec>,
}

/// Resource requests for the app container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Session affinity mode for the workload's service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionAffinity {
    #[default]
    None,
    ClientIp,
}

/// Desired state for one workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimMount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<String>,
    /// Declared rollout kind; `None` defaults to deployment-style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<WorkloadKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<Autoscaling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequests>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub session_affinity: SessionAffinity,
}

/// Observed state, written by the downstream reconcile loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatus {
    #[serde(default)]
    pub ready_replicas: i32,
    #[serde(default)]
    pub current_replicas: i32,
    /// Rollout kind actually observed on the cluster. Once set, the
    /// spec's declared kind may no longer change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<WorkloadKind>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,
}

/// Flavor-agnostic representation of one managed application instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub flavor: Flavor,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    pub spec: WorkloadSpec,
    #[serde(default)]
    pub status: WorkloadStatus,
}

impl Workload {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, flavor: Flavor) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            flavor,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            spec: WorkloadSpec::default(),
            status: WorkloadStatus::default(),
        }
    }

    /// The generated pod-selector labels. Revisions carry the same labels
    /// so they can be located by label match, and a volume claim carrying
    /// exactly these labels is owned exclusively by this workload.
    pub fn pod_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(keys::APP_LABEL.to_string(), self.name.clone());
        labels.insert(keys::FLAVOR_LABEL.to_string(), self.flavor.to_string());
        labels
    }

    /// Env list as last admitted, decoded from the workload's own
    /// annotation. `Ok(None)` when no snapshot has been stamped yet.
    pub fn admitted_envs(&self) -> Result<Option<Vec<EnvVar>>, AppError> {
        match self.annotations.get(keys::ADMITTED_ENVS) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| AppError::Decoding(format!("admitted env annotation: {}", e))),
        }
    }

    pub fn declared_kind(&self) -> WorkloadKind {
        self.spec.workload.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_labels_carry_name_and_flavor() {
        let w = Workload::new("prod", "billing", Flavor::Java);
        let labels = w.pod_labels();
        assert_eq!(labels.get(keys::APP_LABEL).map(String::as_str), Some("billing"));
        assert_eq!(labels.get(keys::FLAVOR_LABEL).map(String::as_str), Some("java"));
    }

    #[test]
    fn admitted_envs_roundtrip_through_annotation() {
        let mut w = Workload::new("prod", "billing", Flavor::Java);
        assert!(w.admitted_envs().unwrap().is_none());

        let envs = vec![EnvVar::literal("FOO", "bar")];
        w.annotations.insert(
            keys::ADMITTED_ENVS.to_string(),
            serde_json::to_string(&envs).unwrap(),
        );
        assert_eq!(w.admitted_envs().unwrap(), Some(envs));
    }

    #[test]
    fn admitted_envs_rejects_malformed_annotation() {
        let mut w = Workload::new("prod", "billing", Flavor::Java);
        w.annotations
            .insert(keys::ADMITTED_ENVS.to_string(), "{not json".to_string());
        assert!(w.admitted_envs().is_err());
    }

    #[test]
    fn declared_kind_defaults_to_deployment() {
        let mut w = Workload::new("prod", "billing", Flavor::Web);
        assert_eq!(w.declared_kind(), WorkloadKind::Deployment);
        w.spec.workload = Some(WorkloadKind::StatefulSet);
        assert_eq!(w.declared_kind(), WorkloadKind::StatefulSet);
    }
}
