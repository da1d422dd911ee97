//! Content hashing for revision snapshots
//!
//! SHA-256 over the canonical JSON encoding of a snapshot. All maps in
//! the snapshot are `BTreeMap`s and optional fields are skipped when
//! unset, so two snapshots with identical governed fields always encode
//! to identical bytes.

use crate::error::{internal_error, AppError};
use crate::models::revision::RevisionSnapshot;
use sha2::{Digest, Sha256};

/// Hash a snapshot's governed content. Volatile metadata was already
/// stripped when the snapshot was taken.
pub fn content_hash(snapshot: &RevisionSnapshot) -> Result<String, AppError> {
    let canonical = serde_json::to_vec(snapshot)
        .map_err(|e| internal_error(format!("cannot encode revision snapshot: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();

    Ok(format!("{:x}", digest))
}
