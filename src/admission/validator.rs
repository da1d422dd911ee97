//! Policy validator
//!
//! Runs the ordered governance checks against one workload mutation:
//! identity uniqueness, env shape and protection, secret and priority
//! grants, autoscaling bounds, rollout-kind immutability, and volume
//! claim ownership. A mutation that passes every check is merged with
//! its flavor defaults and recorded as a revision before the verdict is
//! returned, so a store fault fails the admission closed.

use crate::defaults::merge_defaults;
use crate::diff::diff_env;
use crate::error::AppError;
use crate::governance::{FlavorConfig, GovernanceRegistry};
use crate::keys;
use crate::models::workload::{EnvVar, Workload};
use crate::revision::RevisionManager;
use crate::store::ClusterStore;
use crate::validate::{validate_dns1123_label, validate_env_entries, validate_metrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// The mutation being admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Outcome of one admission call
#[derive(Debug, Clone)]
pub struct Verdict {
    pub allowed: bool,
    /// Human-readable reason, empty when allowed.
    pub message: String,
    /// The workload as admitted, with flavor defaults merged. `None` on
    /// denial and on delete.
    pub workload: Option<Workload>,
}

impl Verdict {
    fn allow(workload: Option<Workload>) -> Self {
        Self {
            allowed: true,
            message: String::new(),
            workload,
        }
    }

    fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
            workload: None,
        }
    }
}

/// The governance check pipeline
#[derive(Clone)]
pub struct PolicyValidator {
    cluster: ClusterStore,
    revisions: RevisionManager,
    governance: Arc<GovernanceRegistry>,
}

impl PolicyValidator {
    pub fn new(
        cluster: ClusterStore,
        revisions: RevisionManager,
        governance: Arc<GovernanceRegistry>,
    ) -> Self {
        Self {
            cluster,
            revisions,
            governance,
        }
    }

    pub fn revisions(&self) -> &RevisionManager {
        &self.revisions
    }

    /// Validate one mutation. `Err` means the decision could not be made
    /// at all; every policy outcome, allowed or denied, is `Ok`.
    pub async fn validate(
        &self,
        operation: Operation,
        workload: &Workload,
    ) -> Result<Verdict, AppError> {
        if operation == Operation::Delete {
            self.revisions.delete_all(workload).await?;
            return Ok(Verdict::allow(None));
        }

        let config = self
            .governance
            .flavor(workload.flavor)
            .cloned()
            .unwrap_or_default();

        if let Some(msg) = self.check_identity(operation, workload).await {
            return Ok(self.denied(workload, msg));
        }
        if let Err(msg) = validate_env_entries(&workload.spec.env) {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = self.check_secret_refs(workload).await? {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = self.check_protected_envs(operation, workload, &config).await? {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = check_autoscaling(workload) {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = check_kind_immutability(operation, workload) {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = self.check_priority_class(workload).await? {
            return Ok(self.denied(workload, msg));
        }
        if let Some(msg) = self.check_claims(workload).await? {
            return Ok(self.denied(workload, msg));
        }

        let merged = merge_defaults(workload, &config, &self.governance)?;
        let outcome = self.revisions.record(&merged).await?;
        info!(
            workload = %workload.name,
            namespace = %workload.namespace,
            flavor = %workload.flavor,
            revision = outcome.revision_id,
            "admission allowed"
        );
        Ok(Verdict::allow(Some(merged)))
    }

    fn denied(&self, workload: &Workload, message: String) -> Verdict {
        warn!(
            workload = %workload.name,
            namespace = %workload.namespace,
            reason = %message,
            "admission denied"
        );
        Verdict::deny(message)
    }

    /// A (namespace, name) identity may be held by at most one workload
    /// across all flavors.
    async fn check_identity(&self, operation: Operation, workload: &Workload) -> Option<String> {
        if operation != Operation::Create {
            return None;
        }
        let holder = self
            .cluster
            .identity_holder(&workload.namespace, &workload.name)
            .await?;
        Some(format!(
            "a {} workload named {}/{} already exists",
            holder, workload.namespace, workload.name
        ))
    }

    /// Every secret reference must point at an existing secret that holds
    /// the key and carries a grant annotation for this workload.
    async fn check_secret_refs(&self, workload: &Workload) -> Result<Option<String>, AppError> {
        for entry in &workload.spec.env {
            let Some(selector) = entry
                .value_from
                .as_ref()
                .and_then(|s| s.secret_key_ref.as_ref())
            else {
                continue;
            };

            let secret = match self
                .cluster
                .get_secret(&workload.namespace, &selector.name)
                .await
            {
                Ok(secret) => secret,
                Err(AppError::NotFound(_)) => {
                    return Ok(Some(format!(
                        "env {} references secret {}/{} which does not exist",
                        entry.name, workload.namespace, selector.name
                    )));
                }
                Err(e) => return Err(e),
            };

            if !secret.data.contains_key(&selector.key) {
                return Ok(Some(format!(
                    "secret {}/{} has no key {}",
                    workload.namespace, selector.name, selector.key
                )));
            }

            let grant = format!("{}{}", keys::SECRET_GRANT_PREFIX, workload.name);
            if secret.annotations.get(&grant).map(String::as_str) != Some("true") {
                return Ok(Some(format!(
                    "secret {}/{} is not granted to workload {}",
                    workload.namespace, selector.name, workload.name
                )));
            }
        }
        Ok(None)
    }

    /// Env entries the flavor's governance config mandates may not be
    /// overridden, changed or deleted by the tenant. Values compare after
    /// placeholder decoding so `${APP}` equals the resolved name.
    async fn check_protected_envs(
        &self,
        operation: Operation,
        workload: &Workload,
        config: &FlavorConfig,
    ) -> Result<Option<String>, AppError> {
        if config.env.is_empty() {
            return Ok(None);
        }

        match operation {
            Operation::Create => {
                for configured in &config.env {
                    let Some(declared) =
                        workload.spec.env.iter().find(|e| e.name == configured.name)
                    else {
                        continue;
                    };
                    let expected = self.governance.decode_env(workload, configured);
                    let actual = self.governance.decode_env(workload, declared);
                    if actual != expected {
                        return Ok(Some(format!(
                            "env {} is managed by governance: declared value {:?} must equal {:?}",
                            configured.name, actual.value, expected.value
                        )));
                    }
                }
            }
            Operation::Update => {
                let Some(baseline) = self.admitted_baseline(workload).await? else {
                    return Ok(None);
                };
                let diff = diff_env(&baseline, &workload.spec.env);
                for entry in &diff.deleted {
                    if config.env.iter().any(|c| c.name == entry.name) {
                        return Ok(Some(format!(
                            "env {} is managed by governance and cannot be deleted",
                            entry.name
                        )));
                    }
                }
                for entry in diff.added.iter().chain(diff.modified.iter()) {
                    let Some(configured) = config.env.iter().find(|c| c.name == entry.name)
                    else {
                        continue;
                    };
                    let expected = self.governance.decode_env(workload, configured);
                    let actual = self.governance.decode_env(workload, entry);
                    if actual != expected {
                        return Ok(Some(format!(
                            "env {} is managed by governance: declared value {:?} must equal {:?}",
                            entry.name, actual.value, expected.value
                        )));
                    }
                }
            }
            Operation::Delete => {}
        }
        Ok(None)
    }

    /// The env list to diff an update against: the workload's own admitted
    /// snapshot annotation, falling back to the latest revision. A
    /// workload with neither has no admitted history and the update is
    /// treated like a first submission.
    async fn admitted_baseline(
        &self,
        workload: &Workload,
    ) -> Result<Option<Vec<EnvVar>>, AppError> {
        if let Some(envs) = workload.admitted_envs()? {
            return Ok(Some(envs));
        }
        let history = self
            .revisions
            .store()
            .list_by_labels(&workload.namespace, &workload.pod_labels())
            .await;
        Ok(history.last().map(|r| r.snapshot.spec.env.clone()))
    }

    /// A declared priority class must exist and carry a grant annotation
    /// for the workload's namespace.
    async fn check_priority_class(&self, workload: &Workload) -> Result<Option<String>, AppError> {
        let Some(name) = workload.spec.priority_class.as_deref() else {
            return Ok(None);
        };

        let pc = match self.cluster.get_priority_class(name).await {
            Ok(pc) => pc,
            Err(AppError::NotFound(_)) => {
                return Ok(Some(format!("priority class {} does not exist", name)));
            }
            Err(e) => return Err(e),
        };

        let grant = format!("{}{}", keys::PRIORITY_GRANT_PREFIX, workload.namespace);
        if pc.annotations.get(&grant).map(String::as_str) != Some("true") {
            return Ok(Some(format!(
                "priority class {} is not granted to namespace {}",
                name, workload.namespace
            )));
        }
        Ok(None)
    }

    /// Every claim mount must reference an existing claim in the
    /// workload's namespace. A shared claim may only be mounted
    /// read-only; an exclusive claim must carry exactly this workload's
    /// pod-selector labels.
    async fn check_claims(&self, workload: &Workload) -> Result<Option<String>, AppError> {
        for mount in &workload.spec.claims {
            let name = self.governance.decode(workload, &mount.name);
            if let Err(msg) = validate_dns1123_label(&name) {
                return Ok(Some(msg));
            }
            if mount.mount_path.is_empty() {
                return Ok(Some(format!("claim {} declares an empty mount path", name)));
            }
            if mount.mount_path.contains(':') {
                return Ok(Some(format!(
                    "claim {} mount path must not contain ':'",
                    name
                )));
            }

            let claim = match self.cluster.get_claim(&workload.namespace, &name).await {
                Ok(claim) => claim,
                Err(AppError::NotFound(_)) => {
                    return Ok(Some(format!(
                        "volume claim {}/{} does not exist",
                        workload.namespace, name
                    )));
                }
                Err(e) => return Err(e),
            };

            let shared =
                claim.labels.get(keys::SHARED_CLAIM_LABEL).map(String::as_str) == Some("true");
            if shared {
                if !mount.read_only {
                    return Ok(Some(format!(
                        "shared volume claim {} must be mounted read-only",
                        name
                    )));
                }
            } else if claim.labels != workload.pod_labels() {
                return Ok(Some(format!(
                    "volume claim {} is not owned by workload {}",
                    name, workload.name
                )));
            }
        }
        Ok(None)
    }
}

/// Min without max is rejected, as is an inverted range; declared metric
/// specs must be structurally valid.
fn check_autoscaling(workload: &Workload) -> Option<String> {
    let autoscaling = workload.spec.autoscaling.as_ref()?;

    match (autoscaling.min_replicas, autoscaling.max_replicas) {
        (Some(_), None) => {
            return Some(
                "autoscaling declares a minimum replica count without a maximum".to_string(),
            );
        }
        (Some(min), Some(max)) if max < min => {
            return Some(format!(
                "autoscaling maximum {} is below minimum {}",
                max, min
            ));
        }
        _ => {}
    }

    let errors = validate_metrics(&autoscaling.metrics);
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}

/// Once the reconcile loop has observed a rollout kind, the declared kind
/// is frozen.
fn check_kind_immutability(operation: Operation, workload: &Workload) -> Option<String> {
    if operation != Operation::Update {
        return None;
    }
    let observed = workload.status.workload?;
    if workload.declared_kind() != observed {
        return Some(format!(
            "workload kind cannot change from {} to {} once rolled out",
            observed,
            workload.declared_kind()
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::{PriorityClass, Secret, VolumeClaim};
    use crate::models::revision::{Revision, RevisionPhase, RevisionSnapshot};
    use crate::models::workload::{
        Autoscaling, ClaimMount, EnvVarSource, Flavor, MetricSpec, SecretKeySelector, WorkloadKind,
    };
    use crate::store::RevisionStore;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn validator_with(config: Option<FlavorConfig>) -> (PolicyValidator, ClusterStore) {
        let cluster = ClusterStore::new();
        let revisions = RevisionManager::new(RevisionStore::new(), 5);
        let mut configs = HashMap::new();
        if let Some(cfg) = config {
            configs.insert(Flavor::Java, cfg);
        }
        let governance = Arc::new(GovernanceRegistry::new(configs, "test"));
        (
            PolicyValidator::new(cluster.clone(), revisions, governance),
            cluster,
        )
    }

    fn java_workload() -> Workload {
        Workload::new("prod", "billing", Flavor::Java)
    }

    fn foo_config() -> FlavorConfig {
        FlavorConfig {
            env: vec![EnvVar::literal("FOO", "bar")],
            ..FlavorConfig::default()
        }
    }

    fn secret_env(secret: &str, key: &str) -> EnvVar {
        EnvVar {
            name: "TOKEN".to_string(),
            value: String::new(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.to_string(),
                    key: key.to_string(),
                }),
            }),
        }
    }

    #[tokio::test]
    async fn clean_create_is_allowed_and_recorded() {
        let (validator, _) = validator_with(None);
        let verdict = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap();

        assert!(verdict.allowed);
        let admitted = verdict.workload.unwrap();
        assert_eq!(admitted.spec.replicas, Some(1));

        let history = validator
            .revisions
            .store()
            .list_by_labels("prod", &java_workload().pod_labels())
            .await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 1);
    }

    #[tokio::test]
    async fn create_rejects_taken_identity_across_flavors() {
        let (validator, cluster) = validator_with(None);
        cluster
            .upsert_workload(Workload::new("prod", "billing", Flavor::Php))
            .await;

        let verdict = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("php"));
    }

    #[tokio::test]
    async fn protected_env_must_match_on_create() {
        let (validator, _) = validator_with(Some(foo_config()));

        let mut matching = java_workload();
        matching.spec.env = vec![EnvVar::literal("FOO", "bar")];
        assert!(
            validator
                .validate(Operation::Create, &matching)
                .await
                .unwrap()
                .allowed
        );

        let mut overriding = Workload::new("prod", "other", Flavor::Java);
        overriding.spec.env = vec![EnvVar::literal("FOO", "baz")];
        let verdict = validator
            .validate(Operation::Create, &overriding)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("FOO"));
        // The rejection names both the declared and the mandated value.
        assert!(verdict.message.contains("\"baz\""));
        assert!(verdict.message.contains("\"bar\""));
    }

    #[tokio::test]
    async fn protected_env_compares_after_decoding() {
        let config = FlavorConfig {
            env: vec![EnvVar::literal("APP_ID", "${APP}")],
            ..FlavorConfig::default()
        };
        let (validator, _) = validator_with(Some(config));

        let mut w = java_workload();
        w.spec.env = vec![EnvVar::literal("APP_ID", "billing")];
        assert!(
            validator
                .validate(Operation::Create, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn update_cannot_delete_protected_env() {
        let (validator, _) = validator_with(Some(foo_config()));
        let admitted = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap()
            .workload
            .unwrap();
        assert!(admitted.spec.env.iter().any(|e| e.name == "FOO"));

        let mut update = admitted.clone();
        update.spec.env.retain(|e| e.name != "FOO");
        let verdict = validator.validate(Operation::Update, &update).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("cannot be deleted"));
    }

    #[tokio::test]
    async fn update_baseline_falls_back_to_latest_revision() {
        let (validator, _) = validator_with(Some(foo_config()));
        let admitted = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap()
            .workload
            .unwrap();

        // An update submitted without the stamped annotation still diffs
        // against the recorded history.
        let mut update = admitted.clone();
        update.annotations.remove(keys::ADMITTED_ENVS);
        update
            .spec
            .env
            .iter_mut()
            .find(|e| e.name == "FOO")
            .unwrap()
            .value = "tampered".to_string();

        let verdict = validator.validate(Operation::Update, &update).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("tampered"));
    }

    #[tokio::test]
    async fn update_without_history_passes_env_governance() {
        let (validator, _) = validator_with(Some(foo_config()));
        let mut w = java_workload();
        w.spec.env = vec![EnvVar::literal("ANYTHING", "goes")];
        assert!(
            validator
                .validate(Operation::Update, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn secret_refs_are_checked_in_order() {
        let (validator, cluster) = validator_with(None);
        let mut w = java_workload();
        w.spec.env = vec![secret_env("creds", "token")];

        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("does not exist"));

        let mut secret = Secret::new("prod", "creds");
        secret.data.insert("other".to_string(), "x".to_string());
        cluster.upsert_secret(secret.clone()).await;
        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("has no key"));

        secret.data.insert("token".to_string(), "x".to_string());
        cluster.upsert_secret(secret.clone()).await;
        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("not granted"));

        secret.annotations.insert(
            format!("{}billing", keys::SECRET_GRANT_PREFIX),
            "true".to_string(),
        );
        cluster.upsert_secret(secret).await;
        assert!(
            validator
                .validate(Operation::Create, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn autoscaling_bounds_are_enforced() {
        let (validator, _) = validator_with(None);

        let mut min_only = java_workload();
        min_only.spec.autoscaling = Some(Autoscaling {
            min_replicas: Some(2),
            max_replicas: None,
            metrics: vec![],
        });
        let verdict = validator
            .validate(Operation::Create, &min_only)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("without a maximum"));

        let mut inverted = java_workload();
        inverted.spec.autoscaling = Some(Autoscaling {
            min_replicas: Some(5),
            max_replicas: Some(2),
            metrics: vec![],
        });
        let verdict = validator
            .validate(Operation::Create, &inverted)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("below minimum"));

        let mut bad_metric = java_workload();
        bad_metric.spec.autoscaling = Some(Autoscaling {
            min_replicas: Some(1),
            max_replicas: Some(4),
            metrics: vec![MetricSpec::Resource {
                name: "cpu".to_string(),
                target_average_utilization: Some(150),
            }],
        });
        let verdict = validator
            .validate(Operation::Create, &bad_metric)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("between 1 and 100"));
    }

    #[tokio::test]
    async fn observed_kind_freezes_declared_kind() {
        let (validator, _) = validator_with(None);
        let mut w = java_workload();
        w.status.workload = Some(WorkloadKind::Deployment);
        w.spec.workload = Some(WorkloadKind::StatefulSet);

        let verdict = validator.validate(Operation::Update, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("cannot change"));

        // Matching declaration is fine.
        w.spec.workload = Some(WorkloadKind::Deployment);
        assert!(
            validator
                .validate(Operation::Update, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn priority_class_needs_existence_and_grant() {
        let (validator, cluster) = validator_with(None);
        let mut w = java_workload();
        w.spec.priority_class = Some("critical".to_string());

        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("does not exist"));

        let mut pc = PriorityClass::new("critical", 1000);
        cluster.upsert_priority_class(pc.clone()).await;
        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("not granted"));

        pc.annotations.insert(
            format!("{}prod", keys::PRIORITY_GRANT_PREFIX),
            "true".to_string(),
        );
        cluster.upsert_priority_class(pc).await;
        assert!(
            validator
                .validate(Operation::Create, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn claim_mounts_are_validated_structurally() {
        let (validator, _) = validator_with(None);

        let mut bad_name = java_workload();
        bad_name.spec.claims = vec![ClaimMount {
            name: "My_Volume".to_string(),
            mount_path: "/data".to_string(),
            read_only: false,
        }];
        let verdict = validator
            .validate(Operation::Create, &bad_name)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("DNS-1123"));

        let mut bad_path = java_workload();
        bad_path.spec.claims = vec![ClaimMount {
            name: "data".to_string(),
            mount_path: "/var:data".to_string(),
            read_only: false,
        }];
        let verdict = validator
            .validate(Operation::Create, &bad_path)
            .await
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("':'"));
    }

    #[tokio::test]
    async fn exclusive_claim_requires_exact_ownership_labels() {
        let (validator, cluster) = validator_with(None);
        let mut w = java_workload();
        w.spec.claims = vec![ClaimMount {
            name: "${APP}-data".to_string(),
            mount_path: "/var/data".to_string(),
            read_only: false,
        }];

        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("does not exist"));

        let mut foreign = VolumeClaim::new("prod", "billing-data");
        foreign.labels = Workload::new("prod", "other", Flavor::Java).pod_labels();
        cluster.upsert_claim(foreign).await;
        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("not owned"));

        let mut owned = VolumeClaim::new("prod", "billing-data");
        owned.labels = w.pod_labels();
        cluster.upsert_claim(owned).await;
        assert!(
            validator
                .validate(Operation::Create, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn shared_claim_must_be_mounted_read_only() {
        let (validator, cluster) = validator_with(None);
        let mut shared = VolumeClaim::new("prod", "assets");
        shared
            .labels
            .insert(keys::SHARED_CLAIM_LABEL.to_string(), "true".to_string());
        cluster.upsert_claim(shared).await;

        let mut w = java_workload();
        w.spec.claims = vec![ClaimMount {
            name: "assets".to_string(),
            mount_path: "/var/assets".to_string(),
            read_only: false,
        }];
        let verdict = validator.validate(Operation::Create, &w).await.unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.message.contains("read-only"));

        w.spec.claims[0].read_only = true;
        assert!(
            validator
                .validate(Operation::Create, &w)
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn admission_drives_revision_lifecycle() {
        let (validator, _) = validator_with(Some(foo_config()));
        let admitted = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap()
            .workload
            .unwrap();

        let mut update = admitted.clone();
        update.spec.env.push(EnvVar::literal("BAZ", "qux"));
        let second = validator
            .validate(Operation::Update, &update)
            .await
            .unwrap()
            .workload
            .unwrap();

        let history = validator
            .revisions
            .store()
            .list_by_labels("prod", &admitted.pod_labels())
            .await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].phase, RevisionPhase::Cancel);
        assert_eq!(history[1].phase, RevisionPhase::Running);
        assert!(history[1].diff.contains("env added [BAZ]"));

        // Resubmitting the admitted state creates nothing new.
        assert!(
            validator
                .validate(Operation::Update, &second)
                .await
                .unwrap()
                .allowed
        );
        let history = validator
            .revisions
            .store()
            .list_by_labels("prod", &admitted.pod_labels())
            .await;
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn losing_a_revision_name_race_fails_closed() {
        let (validator, _) = validator_with(None);
        let admitted = validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap()
            .workload
            .unwrap();

        // A concurrent writer already claimed the next revision name. Its
        // labels differ, so the manager's history listing does not see it
        // and the create lands on the taken name.
        let racer = Workload::new("prod", "other", Flavor::Java);
        let snapshot = RevisionSnapshot::from_workload(&racer);
        validator
            .revisions
            .store()
            .create(Revision {
                name: "billing-2".to_string(),
                namespace: "prod".to_string(),
                labels: racer.pod_labels(),
                id: 2,
                hash: "racer".to_string(),
                phase: RevisionPhase::Running,
                diff: String::new(),
                retry: 0,
                snapshot,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let mut update = admitted.clone();
        update.spec.env.push(EnvVar::literal("BAZ", "qux"));
        let err = validator
            .validate(Operation::Update, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        // The existing history was left untouched by the failed attempt.
        let history = validator
            .revisions
            .store()
            .list_by_labels("prod", &admitted.pod_labels())
            .await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 1);
        assert_eq!(history[0].phase, RevisionPhase::Running);
    }

    #[tokio::test]
    async fn delete_clears_revision_history() {
        let (validator, _) = validator_with(None);
        validator
            .validate(Operation::Create, &java_workload())
            .await
            .unwrap();

        let verdict = validator
            .validate(Operation::Delete, &java_workload())
            .await
            .unwrap();
        assert!(verdict.allowed);
        assert_eq!(validator.revisions.store().count().await, 0);
    }
}
