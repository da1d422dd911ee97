//! Collection Differ
//!
//! The generic set-reconciliation primitive shared by the revision
//! manager and the policy validator. Compares two named collections and
//! partitions them into deleted / added / modified sets.

use crate::models::workload::{ClaimMount, EnvVar, MetricSpec};

/// Result of diffing two collections. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct DiffResult<T> {
    /// Elements of `origin` whose key has no counterpart in `now`.
    pub deleted: Vec<T>,
    /// Elements of `now` whose key has no counterpart in `origin`.
    pub added: Vec<T>,
    /// Elements of `now` whose key matches an `origin` element but whose
    /// contents differ.
    pub modified: Vec<T>,
}

impl<T> Default for DiffResult<T> {
    fn default() -> Self {
        Self {
            deleted: Vec::new(),
            added: Vec::new(),
            modified: Vec::new(),
        }
    }
}

impl<T> DiffResult<T> {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.added.is_empty() && self.modified.is_empty()
    }
}

/// Diff `origin` against `now` under a caller-supplied key and equality.
///
/// Two linear scans with the collections' roles swapped between passes:
/// the first pass walks `origin` collecting `deleted` and `modified`, the
/// second walks `now` collecting `added`. O(n*m), fine for the tens of
/// entries these collections hold.
///
/// Known limitation: duplicate keys within one side are resolved
/// first-match-wins; later duplicates are silently ignored.
pub fn diff_by_key<T, K, KF, EQ>(origin: &[T], now: &[T], key_of: KF, equal: EQ) -> DiffResult<T>
where
    T: Clone,
    K: PartialEq,
    KF: Fn(&T) -> K,
    EQ: Fn(&T, &T) -> bool,
{
    let mut result = DiffResult::default();

    let (mut left, mut right) = (origin, now);
    for pass in 0..2 {
        for item in left {
            let key = key_of(item);
            match right.iter().find(|candidate| key_of(*candidate) == key) {
                Some(counterpart) => {
                    if pass == 0 && !equal(item, counterpart) {
                        result.modified.push(counterpart.clone());
                    }
                }
                None => {
                    if pass == 0 {
                        result.deleted.push(item.clone());
                    } else {
                        result.added.push(item.clone());
                    }
                }
            }
        }
        // Swap the roles, only after the first pass
        std::mem::swap(&mut left, &mut right);
    }

    result
}

/// Env vars key on their name; equality is full structural equality
/// including any value-source reference.
pub fn diff_env(origin: &[EnvVar], now: &[EnvVar]) -> DiffResult<EnvVar> {
    diff_by_key(origin, now, |e| e.name.clone(), |a, b| a == b)
}

/// Claim mounts key on their name; only the mount path and read-only
/// flag count as modifications.
pub fn diff_claim_mounts(origin: &[ClaimMount], now: &[ClaimMount]) -> DiffResult<ClaimMount> {
    diff_by_key(
        origin,
        now,
        |m| m.name.clone(),
        |a, b| a.mount_path == b.mount_path && a.read_only == b.read_only,
    )
}

/// Metric specs key on their discriminator plus their inner metric name.
pub fn diff_metrics(origin: &[MetricSpec], now: &[MetricSpec]) -> DiffResult<MetricSpec> {
    diff_by_key(
        origin,
        now,
        |m| (m.kind(), m.metric_name().to_string()),
        |a, b| a == b,
    )
}

/// Plain identifiers key on themselves; equal keys are never modified.
pub fn diff_names(origin: &[String], now: &[String]) -> DiffResult<String> {
    diff_by_key(origin, now, |s| s.clone(), |_, _| true)
}
