//! Default-value merging
//!
//! After a workload passes validation and before its revision is
//! recorded, the flavor's governance defaults are folded into the spec.
//! Merging is idempotent: running it twice over the same input yields
//! the same workload, so re-admission of an already merged spec changes
//! nothing.

use crate::error::{internal_error, AppError};
use crate::governance::{FlavorConfig, GovernanceRegistry};
use crate::keys;
use crate::models::workload::Workload;
use tracing::debug;

/// Fold the flavor's defaults into `workload` and stamp the admitted env
/// snapshot annotation. Tenant-declared values always win over defaults.
pub fn merge_defaults(
    workload: &Workload,
    config: &FlavorConfig,
    registry: &GovernanceRegistry,
) -> Result<Workload, AppError> {
    let mut merged = workload.clone();

    if merged.spec.replicas.is_none() {
        merged.spec.replicas = Some(config.replicas.unwrap_or(1));
    }
    if merged.spec.port.is_none() {
        merged.spec.port = config.port;
    }
    if merged.spec.health.is_none() {
        merged.spec.health = config.health.clone();
    }

    // Mandated env entries the tenant did not declare are appended in
    // config order, decoded against this workload's identity.
    for configured in &config.env {
        let declared = merged.spec.env.iter().any(|e| e.name == configured.name);
        if !declared {
            debug!(
                workload = %workload.name,
                env = %configured.name,
                "appending mandated env entry"
            );
            merged
                .spec
                .env
                .push(registry.decode_env(workload, configured));
        }
    }

    let snapshot = serde_json::to_string(&merged.spec.env)
        .map_err(|e| internal_error(format!("cannot encode admitted envs: {}", e)))?;
    merged
        .annotations
        .insert(keys::ADMITTED_ENVS.to_string(), snapshot);

    Ok(merged)
}
