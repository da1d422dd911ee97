//! Revision tracking engine
//!
//! Converts every accepted mutation of a workload's desired state into an
//! immutable, hashed, phase-tracked history record with bounded
//! retention.

mod hash;
mod manager;

pub use hash::content_hash;
pub use manager::{RecordOutcome, RevisionManager};
