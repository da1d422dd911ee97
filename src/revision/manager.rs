//! Revision manager
//!
//! Owns id assignment, the phase state machine, and bounded retention
//! for workload history. Called by the policy validator after every
//! passing check sequence, and by the delete path for cleanup.

use crate::diff::{diff_claim_mounts, diff_env, diff_metrics, diff_names, DiffResult};
use crate::error::AppError;
use crate::models::revision::{Revision, RevisionPhase, RevisionSnapshot};
use crate::models::workload::Workload;
use crate::revision::hash::content_hash;
use crate::store::RevisionStore;
use chrono::Utc;
use std::fmt::Write as _;
use tracing::{debug, info};

/// What `record` did for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// False when the content hash matched the latest revision and the
    /// call was a benign no-op.
    pub created: bool,
    /// Id of the latest revision after the call.
    pub revision_id: u64,
}

/// Manager for the revision history of all workloads
#[derive(Clone)]
pub struct RevisionManager {
    store: RevisionStore,
    max_history: usize,
}

impl RevisionManager {
    pub fn new(store: RevisionStore, max_history: usize) -> Self {
        Self { store, max_history }
    }

    pub fn store(&self) -> &RevisionStore {
        &self.store
    }

    /// Record one accepted mutation of `workload` (already merged with
    /// its flavor defaults). Creates a revision only when the governed
    /// content actually changed; a retried identical request is a no-op.
    /// Any store failure aborts the whole call.
    pub async fn record(&self, workload: &Workload) -> Result<RecordOutcome, AppError> {
        let snapshot = RevisionSnapshot::from_workload(workload);
        let hash = content_hash(&snapshot)?;
        let labels = workload.pod_labels();

        let existing = self
            .store
            .list_by_labels(&workload.namespace, &labels)
            .await;

        // The first revision
        let Some(latest) = existing.last().cloned() else {
            let revision = self.build_revision(workload, snapshot, hash, 1, String::new());
            info!(
                workload = %workload.name,
                namespace = %workload.namespace,
                revision = %revision.name,
                "creating first revision"
            );
            self.store.create(revision).await?;
            return Ok(RecordOutcome {
                created: true,
                revision_id: 1,
            });
        };

        if latest.hash == hash {
            // Just a scale or redeploy with unchanged governed state.
            debug!(
                workload = %workload.name,
                namespace = %workload.namespace,
                revision = %latest.name,
                "content hash unchanged, no new revision"
            );
            return Ok(RecordOutcome {
                created: false,
                revision_id: latest.id,
            });
        }

        // Something changed: append to history
        let new_id = latest.id + 1;
        let diff = render_diff(&snapshot, &latest.snapshot);
        let revision = self.build_revision(workload, snapshot, hash, new_id, diff);
        info!(
            workload = %workload.name,
            namespace = %workload.namespace,
            revision = %revision.name,
            "adding revision to history"
        );
        self.store.create(revision).await?;

        // Transition the superseded revision's phase
        let from = latest.phase;
        let mut superseded = latest;
        superseded.phase = from.superseded();
        if superseded.phase != from {
            info!(
                revision = %superseded.name,
                %from,
                to = %superseded.phase,
                "transitioning superseded revision"
            );
        }
        self.store.update(superseded).await?;

        self.trim_history(workload).await?;

        Ok(RecordOutcome {
            created: true,
            revision_id: new_id,
        })
    }

    /// Delete every revision belonging to a workload. Revisions are a
    /// distinct kind with no ownership cascade, so deletion is explicit.
    pub async fn delete_all(&self, workload: &Workload) -> Result<usize, AppError> {
        let labels = workload.pod_labels();
        let revisions = self
            .store
            .list_by_labels(&workload.namespace, &labels)
            .await;
        let removed = revisions.len();
        for revision in revisions {
            self.store.delete(&revision.namespace, &revision.name).await?;
        }
        if removed > 0 {
            info!(
                workload = %workload.name,
                namespace = %workload.namespace,
                removed,
                "deleted revision history"
            );
        }
        Ok(removed)
    }

    fn build_revision(
        &self,
        workload: &Workload,
        snapshot: RevisionSnapshot,
        hash: String,
        id: u64,
        diff: String,
    ) -> Revision {
        Revision {
            name: format!("{}-{}", workload.name, id),
            namespace: workload.namespace.clone(),
            labels: workload.pod_labels(),
            id,
            hash,
            phase: RevisionPhase::Running,
            diff,
            retry: 0,
            snapshot,
            created_at: Utc::now(),
        }
    }

    /// Evict oldest revisions until at most `max_history` remain. Not
    /// transactional with creation; a crash in between leaves an excess
    /// that the next successful call heals.
    async fn trim_history(&self, workload: &Workload) -> Result<(), AppError> {
        let labels = workload.pod_labels();
        let revisions = self
            .store
            .list_by_labels(&workload.namespace, &labels)
            .await;
        if revisions.len() <= self.max_history {
            return Ok(());
        }

        let excess = revisions.len() - self.max_history;
        for revision in revisions.into_iter().take(excess) {
            debug!(revision = %revision.name, "evicting history revision");
            self.store.delete(&revision.namespace, &revision.name).await?;
        }
        Ok(())
    }
}

/// Render the human-readable summary of what changed between two
/// snapshots: per-field differ results as added/removed/changed lists.
fn render_diff(now: &RevisionSnapshot, previous: &RevisionSnapshot) -> String {
    let mut out = String::new();
    render_section(&mut out, "env", &diff_env(&previous.spec.env, &now.spec.env), |e| {
        e.name.clone()
    });
    render_section(
        &mut out,
        "claims",
        &diff_claim_mounts(&previous.spec.claims, &now.spec.claims),
        |m| m.name.clone(),
    );

    let empty = Vec::new();
    let metrics_of = |s: &RevisionSnapshot| {
        s.spec
            .autoscaling
            .as_ref()
            .map(|a| &a.metrics)
            .unwrap_or(&empty)
            .clone()
    };
    render_section(
        &mut out,
        "metrics",
        &diff_metrics(&metrics_of(previous), &metrics_of(now)),
        |m| format!("{}/{}", m.kind(), m.metric_name()),
    );
    render_section(
        &mut out,
        "command",
        &diff_names(&previous.spec.command, &now.spec.command),
        |c| c.clone(),
    );

    if previous.spec.replicas != now.spec.replicas {
        push_segment(
            &mut out,
            format!(
                "replicas changed {:?} -> {:?}",
                previous.spec.replicas, now.spec.replicas
            ),
        );
    }
    out
}

fn render_section<T, F>(out: &mut String, field: &str, diff: &DiffResult<T>, name_of: F)
where
    F: Fn(&T) -> String,
{
    if !diff.added.is_empty() {
        let names: Vec<String> = diff.added.iter().map(&name_of).collect();
        push_segment(out, format!("{} added [{}]", field, names.join(", ")));
    }
    if !diff.deleted.is_empty() {
        let names: Vec<String> = diff.deleted.iter().map(&name_of).collect();
        push_segment(out, format!("{} deleted [{}]", field, names.join(", ")));
    }
    if !diff.modified.is_empty() {
        let names: Vec<String> = diff.modified.iter().map(&name_of).collect();
        push_segment(out, format!("{} changed [{}]", field, names.join(", ")));
    }
}

fn push_segment(out: &mut String, segment: String) {
    if !out.is_empty() {
        out.push_str("; ");
    }
    let _ = write!(out, "{}", segment);
}
