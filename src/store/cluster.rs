//! Cluster object lookups
//!
//! Get-by-namespaced-name over the object kinds governance checks
//! consult: registered workloads per flavor, secrets, priority classes,
//! and volume claims.

use crate::error::AppError;
use crate::models::cluster::{PriorityClass, Secret, VolumeClaim};
use crate::models::workload::{Flavor, Workload};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe store of cluster objects
#[derive(Clone, Default)]
pub struct ClusterStore {
    /// (flavor, namespace, name) -> Workload
    workloads: Arc<RwLock<HashMap<(Flavor, String, String), Workload>>>,
    /// (namespace, name) -> Secret
    secrets: Arc<RwLock<HashMap<(String, String), Secret>>>,
    /// name -> PriorityClass (cluster-scoped)
    priority_classes: Arc<RwLock<HashMap<String, PriorityClass>>>,
    /// (namespace, name) -> VolumeClaim
    claims: Arc<RwLock<HashMap<(String, String), VolumeClaim>>>,
}

impl ClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a workload's storage representation.
    pub async fn upsert_workload(&self, workload: Workload) {
        let mut workloads = self.workloads.write().await;
        let key = (
            workload.flavor,
            workload.namespace.clone(),
            workload.name.clone(),
        );
        workloads.insert(key, workload);
    }

    pub async fn get_workload(
        &self,
        flavor: Flavor,
        namespace: &str,
        name: &str,
    ) -> Result<Workload, AppError> {
        let workloads = self.workloads.read().await;
        workloads
            .get(&(flavor, namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("{} workload {}/{} not found", flavor, namespace, name))
            })
    }

    pub async fn remove_workload(&self, flavor: Flavor, namespace: &str, name: &str) {
        let mut workloads = self.workloads.write().await;
        workloads.remove(&(flavor, namespace.to_string(), name.to_string()));
    }

    /// The flavor already holding this (namespace, name) identity, if any.
    /// Identity is unique across all flavors, not per flavor.
    pub async fn identity_holder(&self, namespace: &str, name: &str) -> Option<Flavor> {
        let workloads = self.workloads.read().await;
        Flavor::ALL.into_iter().find(|flavor| {
            workloads.contains_key(&(*flavor, namespace.to_string(), name.to_string()))
        })
    }

    pub async fn upsert_secret(&self, secret: Secret) {
        let mut secrets = self.secrets.write().await;
        secrets.insert((secret.namespace.clone(), secret.name.clone()), secret);
    }

    pub async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, AppError> {
        let secrets = self.secrets.read().await;
        secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("secret {}/{} not found", namespace, name)))
    }

    pub async fn upsert_priority_class(&self, pc: PriorityClass) {
        let mut priority_classes = self.priority_classes.write().await;
        priority_classes.insert(pc.name.clone(), pc);
    }

    pub async fn get_priority_class(&self, name: &str) -> Result<PriorityClass, AppError> {
        let priority_classes = self.priority_classes.read().await;
        priority_classes
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("priority class {} not found", name)))
    }

    pub async fn upsert_claim(&self, claim: VolumeClaim) {
        let mut claims = self.claims.write().await;
        claims.insert((claim.namespace.clone(), claim.name.clone()), claim);
    }

    pub async fn get_claim(&self, namespace: &str, name: &str) -> Result<VolumeClaim, AppError> {
        let claims = self.claims.read().await;
        claims
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("volume claim {}/{} not found", namespace, name))
            })
    }
}
