//! Revision records
//!
//! A revision is an immutable, hashed, phase-tracked snapshot of a
//! workload's governed fields at one accepted mutation. Revisions are a
//! distinct object kind from workloads and are located by label match,
//! never by an ownership edge.

use crate::keys;
use crate::models::workload::{Workload, WorkloadSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle phase of one revision.
///
/// `Running` is the initial phase of every newly recorded revision.
/// `Active` is set by an external promotion step once the rollout lands.
/// `Cancel` and `Complete` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionPhase {
    Running,
    Active,
    Cancel,
    Complete,
}

impl RevisionPhase {
    /// Phase this revision moves to when a newer revision supersedes it.
    pub fn superseded(self) -> Self {
        match self {
            RevisionPhase::Running => RevisionPhase::Cancel,
            RevisionPhase::Active => RevisionPhase::Complete,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RevisionPhase::Cancel | RevisionPhase::Complete)
    }
}

impl fmt::Display for RevisionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionPhase::Running => f.write_str("running"),
            RevisionPhase::Active => f.write_str("active"),
            RevisionPhase::Cancel => f.write_str("cancel"),
            RevisionPhase::Complete => f.write_str("complete"),
        }
    }
}

/// The governed fields frozen into a revision. Volatile metadata
/// (controller bookkeeping annotations, timestamps) is stripped before
/// the snapshot is taken so that hashing is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSnapshot {
    pub namespace: String,
    pub name: String,
    pub flavor: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    pub spec: WorkloadSpec,
}

impl RevisionSnapshot {
    /// Freeze a workload's governed fields. Status is observed state and
    /// never part of the snapshot.
    pub fn from_workload(workload: &Workload) -> Self {
        let annotations = workload
            .annotations
            .iter()
            .filter(|(k, _)| !k.starts_with(keys::CONTROLLER_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            namespace: workload.namespace.clone(),
            name: workload.name.clone(),
            flavor: workload.flavor.to_string(),
            labels: workload.labels.clone(),
            annotations,
            spec: workload.spec.clone(),
        }
    }
}

/// One immutable history record for a workload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// `<workload-name>-<id>`
    pub name: String,
    pub namespace: String,
    /// The owning workload's pod-selector labels; enables list-by-label.
    pub labels: BTreeMap<String, String>,
    pub id: u64,
    pub hash: String,
    pub phase: RevisionPhase,
    /// Human-readable diff against the previous latest revision.
    pub diff: String,
    pub retry: u32,
    pub snapshot: RevisionSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Revision {
    /// The conceptual persisted annotation shape
    /// `{hash, id, phase, diff, retry}`.
    pub fn annotations(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(keys::REVISION_HASH.to_string(), self.hash.clone());
        map.insert(keys::REVISION_ID.to_string(), self.id.to_string());
        map.insert(keys::REVISION_PHASE.to_string(), self.phase.to_string());
        map.insert(keys::REVISION_DIFF.to_string(), self.diff.clone());
        map.insert(keys::REVISION_RETRY.to_string(), self.retry.to_string());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workload::Flavor;

    #[test]
    fn supersede_transitions() {
        assert_eq!(RevisionPhase::Running.superseded(), RevisionPhase::Cancel);
        assert_eq!(RevisionPhase::Active.superseded(), RevisionPhase::Complete);
        assert_eq!(RevisionPhase::Cancel.superseded(), RevisionPhase::Cancel);
        assert_eq!(RevisionPhase::Complete.superseded(), RevisionPhase::Complete);
    }

    #[test]
    fn annotation_map_carries_all_bookkeeping_fields() {
        let w = Workload::new("prod", "billing", Flavor::Java);
        let revision = Revision {
            name: "billing-3".to_string(),
            namespace: "prod".to_string(),
            labels: w.pod_labels(),
            id: 3,
            hash: "abc123".to_string(),
            phase: RevisionPhase::Active,
            diff: "env added [FOO]".to_string(),
            retry: 2,
            snapshot: RevisionSnapshot::from_workload(&w),
            created_at: chrono::Utc::now(),
        };

        let map = revision.annotations();
        assert_eq!(map.get(keys::REVISION_HASH).map(String::as_str), Some("abc123"));
        assert_eq!(map.get(keys::REVISION_ID).map(String::as_str), Some("3"));
        assert_eq!(map.get(keys::REVISION_PHASE).map(String::as_str), Some("active"));
        assert_eq!(
            map.get(keys::REVISION_DIFF).map(String::as_str),
            Some("env added [FOO]")
        );
        assert_eq!(map.get(keys::REVISION_RETRY).map(String::as_str), Some("2"));
    }

    #[test]
    fn snapshot_strips_controller_annotations() {
        let mut w = Workload::new("prod", "billing", Flavor::Java);
        w.annotations
            .insert(keys::RESTARTED_AT.to_string(), "2026-01-01T00:00:00Z".to_string());
        w.annotations
            .insert("team".to_string(), "payments".to_string());

        let snap = RevisionSnapshot::from_workload(&w);
        assert!(!snap.annotations.contains_key(keys::RESTARTED_AT));
        assert_eq!(snap.annotations.get("team").map(String::as_str), Some("payments"));
    }
}
