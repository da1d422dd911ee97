//! Admission route handler

use crate::admission::Operation;
use crate::error::ApiResult;
use crate::models::workload::Workload;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// One admission review request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: Uuid,
    pub operation: Operation,
    pub workload: Workload,
}

/// Verdict mirrored back to the caller under the request's uid
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: Uuid,
    pub allowed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// POST /admission/validate
pub async fn validate(
    State(state): State<SharedState>,
    Json(request): Json<AdmissionRequest>,
) -> ApiResult<Json<AdmissionResponse>> {
    if state
        .settings
        .is_ignored_namespace(&request.workload.namespace)
    {
        info!(
            namespace = %request.workload.namespace,
            workload = %request.workload.name,
            "namespace is ignored, admitting without checks"
        );
        return Ok(Json(AdmissionResponse {
            uid: request.uid,
            allowed: true,
            reason: String::new(),
        }));
    }

    let verdict = state
        .validator
        .validate(request.operation, &request.workload)
        .await?;

    // Mirror the admitted state into the cluster store only after the
    // verdict is in.
    if verdict.allowed {
        match request.operation {
            Operation::Create | Operation::Update => {
                if let Some(admitted) = verdict.workload {
                    state.cluster.upsert_workload(admitted).await;
                }
            }
            Operation::Delete => {
                state
                    .cluster
                    .remove_workload(
                        request.workload.flavor,
                        &request.workload.namespace,
                        &request.workload.name,
                    )
                    .await;
            }
        }
    }

    Ok(Json(AdmissionResponse {
        uid: request.uid,
        allowed: verdict.allowed,
        reason: verdict.message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, Settings};
    use crate::governance::GovernanceRegistry;
    use crate::models::workload::Flavor;
    use crate::state::AppState;
    use std::sync::Arc;

    fn state() -> SharedState {
        let settings = Settings {
            server: ServerConfig::default(),
            max_history: 5,
            governance_file: None,
            operating_env: "test".to_string(),
            ignored_namespaces: vec!["kube-system".to_string()],
        };
        Arc::new(AppState::new(
            settings,
            Arc::new(GovernanceRegistry::empty("test")),
        ))
    }

    #[tokio::test]
    async fn ignored_namespace_bypasses_validation() {
        let state = state();
        let request = AdmissionRequest {
            uid: Uuid::new_v4(),
            operation: Operation::Create,
            workload: Workload::new("kube-system", "coredns", Flavor::Web),
        };
        let uid = request.uid;

        let Json(response) = validate(State(state.clone()), Json(request)).await.unwrap();
        assert!(response.allowed);
        assert_eq!(response.uid, uid);
        // Nothing was recorded for the bypassed request.
        assert_eq!(state.validator.revisions().store().count().await, 0);
    }

    #[tokio::test]
    async fn allowed_create_registers_the_workload() {
        let state = state();
        let request = AdmissionRequest {
            uid: Uuid::new_v4(),
            operation: Operation::Create,
            workload: Workload::new("prod", "billing", Flavor::Java),
        };

        let Json(response) = validate(State(state.clone()), Json(request)).await.unwrap();
        assert!(response.allowed);
        assert_eq!(
            state.cluster.identity_holder("prod", "billing").await,
            Some(Flavor::Java)
        );
        assert_eq!(state.validator.revisions().store().count().await, 1);
    }

    #[tokio::test]
    async fn allowed_delete_unregisters_the_workload() {
        let state = state();
        let create = AdmissionRequest {
            uid: Uuid::new_v4(),
            operation: Operation::Create,
            workload: Workload::new("prod", "billing", Flavor::Java),
        };
        validate(State(state.clone()), Json(create)).await.unwrap();

        let delete = AdmissionRequest {
            uid: Uuid::new_v4(),
            operation: Operation::Delete,
            workload: Workload::new("prod", "billing", Flavor::Java),
        };
        let Json(response) = validate(State(state.clone()), Json(delete)).await.unwrap();
        assert!(response.allowed);
        assert_eq!(state.cluster.identity_holder("prod", "billing").await, None);
        assert_eq!(state.validator.revisions().store().count().await, 0);
    }
}
