//! Well-known label and annotation keys shared across the controller.

/// Content hash of the revision's governed snapshot.
pub const REVISION_HASH: &str = "fleetgate.io/revision-hash";

/// Monotonic revision id, unique per workload, starting at 1.
pub const REVISION_ID: &str = "fleetgate.io/revision-id";

/// Lifecycle phase of the revision.
pub const REVISION_PHASE: &str = "fleetgate.io/revision-phase";

/// Human-readable diff against the previous latest revision.
pub const REVISION_DIFF: &str = "fleetgate.io/revision-diff";

/// Retry counter, incremented by the reconcile loop on rollout failures.
pub const REVISION_RETRY: &str = "fleetgate.io/revision-retry";

/// JSON-encoded env list as last admitted, stamped onto the workload so
/// update-time governance checks can diff against it.
pub const ADMITTED_ENVS: &str = "fleetgate.io/envs";

/// Rollout-restart timestamp. Volatile; never part of the content hash.
pub const RESTARTED_AT: &str = "fleetgate.io/restarted-at";

/// Marks a volume claim as shared between workloads ("true" to enable).
pub const SHARED_CLAIM_LABEL: &str = "fleetgate.io/shared";

/// Secret grant annotation prefix; the full key is `<prefix><workload-name>`.
pub const SECRET_GRANT_PREFIX: &str = "secret.fleetgate.io/";

/// Priority-class grant annotation prefix; the full key is `<prefix><namespace>`.
pub const PRIORITY_GRANT_PREFIX: &str = "priority.fleetgate.io/";

/// Pod-selector label carrying the workload name.
pub const APP_LABEL: &str = "app";

/// Pod-selector label carrying the workload flavor.
pub const FLAVOR_LABEL: &str = "fleetgate.io/flavor";

/// Every annotation under this prefix is controller bookkeeping and is
/// stripped before hashing a revision snapshot.
pub const CONTROLLER_PREFIX: &str = "fleetgate.io/";
