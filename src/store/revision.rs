//! Revision store adapter
//!
//! Get/list-by-label/create/update/delete over revision records.
//! Revisions are their own object kind; the list operation matches a
//! label selector so a workload finds its history without an ownership
//! edge.

use crate::error::AppError;
use crate::models::revision::Revision;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe revision store
#[derive(Clone, Default)]
pub struct RevisionStore {
    /// (namespace, name) -> Revision
    revisions: Arc<RwLock<HashMap<(String, String), Revision>>>,
}

impl RevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new revision. Fails with `AlreadyExists` when the name is
    /// taken; two racing callers that both computed the same next id
    /// collide here and exactly one loses.
    pub async fn create(&self, revision: Revision) -> Result<Revision, AppError> {
        let mut revisions = self.revisions.write().await;
        let key = (revision.namespace.clone(), revision.name.clone());
        if revisions.contains_key(&key) {
            return Err(AppError::AlreadyExists(format!(
                "revision {}/{} already exists",
                revision.namespace, revision.name
            )));
        }
        revisions.insert(key, revision.clone());
        Ok(revision)
    }

    /// Update an existing revision (phase transitions, retry counter).
    pub async fn update(&self, revision: Revision) -> Result<Revision, AppError> {
        let mut revisions = self.revisions.write().await;
        let key = (revision.namespace.clone(), revision.name.clone());
        if !revisions.contains_key(&key) {
            return Err(AppError::NotFound(format!(
                "revision {}/{} not found",
                revision.namespace, revision.name
            )));
        }
        revisions.insert(key, revision.clone());
        Ok(revision)
    }

    /// Delete a revision by namespaced name.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<(), AppError> {
        let mut revisions = self.revisions.write().await;
        revisions
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!("revision {}/{} not found", namespace, name))
            })
    }

    /// List every revision in a namespace whose labels carry all the
    /// selector's entries, sorted by ascending id.
    pub async fn list_by_labels(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Vec<Revision> {
        let revisions = self.revisions.read().await;
        let mut matched: Vec<Revision> = revisions
            .values()
            .filter(|r| r.namespace == namespace)
            .filter(|r| {
                selector
                    .iter()
                    .all(|(k, v)| r.labels.get(k).map(|found| found == v).unwrap_or(false))
            })
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.id);
        matched
    }

    pub async fn count(&self) -> usize {
        self.revisions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::revision::{RevisionPhase, RevisionSnapshot};
    use crate::models::workload::{Flavor, Workload};

    fn revision(namespace: &str, workload: &str, id: u64) -> Revision {
        let w = Workload::new(namespace, workload, Flavor::Java);
        Revision {
            name: format!("{}-{}", workload, id),
            namespace: namespace.to_string(),
            labels: w.pod_labels(),
            id,
            hash: format!("hash-{}", id),
            phase: RevisionPhase::Running,
            diff: String::new(),
            retry: 0,
            snapshot: RevisionSnapshot::from_workload(&w),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_conflicts_on_duplicate_name() {
        let store = RevisionStore::new();
        store.create(revision("prod", "billing", 1)).await.unwrap();

        let err = store.create(revision("prod", "billing", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn list_by_labels_scopes_to_workload_and_sorts() {
        let store = RevisionStore::new();
        store.create(revision("prod", "billing", 2)).await.unwrap();
        store.create(revision("prod", "billing", 1)).await.unwrap();
        store.create(revision("prod", "other", 1)).await.unwrap();
        store.create(revision("dev", "billing", 1)).await.unwrap();

        let selector = Workload::new("prod", "billing", Flavor::Java).pod_labels();
        let listed = store.list_by_labels("prod", &selector).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, 1);
        assert_eq!(listed[1].id, 2);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = RevisionStore::new();
        let err = store.delete("prod", "billing-9").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
