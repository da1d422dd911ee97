//! Store adapters
//!
//! In-process adapters over the backing object store. The real store is
//! external and strongly consistent with optimistic concurrency; these
//! adapters reproduce the one guarantee the controller leans on (a
//! uniquely-named create conflicts for exactly one of two racing
//! callers) so the rest of the code can be exercised against them.

mod cluster;
mod revision;

pub use cluster::ClusterStore;
pub use revision::RevisionStore;
