//! Cluster object registration handlers
//!
//! Secrets, priority classes and volume claims live outside this service;
//! a sync job pushes their current state here so admission checks can
//! consult them.

use crate::error::ApiResult;
use crate::models::cluster::{PriorityClass, Secret, VolumeClaim};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredRef {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

/// POST /objects/secrets
pub async fn register_secret(
    State(state): State<SharedState>,
    Json(secret): Json<Secret>,
) -> ApiResult<Json<SuccessResponse<RegisteredRef>>> {
    let reference = RegisteredRef {
        namespace: secret.namespace.clone(),
        name: secret.name.clone(),
    };
    state.cluster.upsert_secret(secret).await;
    Ok(Json(SuccessResponse::with_data(
        "Secret registered",
        reference,
    )))
}

/// POST /objects/priorityClasses
pub async fn register_priority_class(
    State(state): State<SharedState>,
    Json(pc): Json<PriorityClass>,
) -> ApiResult<Json<SuccessResponse<RegisteredRef>>> {
    let reference = RegisteredRef {
        namespace: String::new(),
        name: pc.name.clone(),
    };
    state.cluster.upsert_priority_class(pc).await;
    Ok(Json(SuccessResponse::with_data(
        "Priority class registered",
        reference,
    )))
}

/// POST /objects/claims
pub async fn register_claim(
    State(state): State<SharedState>,
    Json(claim): Json<VolumeClaim>,
) -> ApiResult<Json<SuccessResponse<RegisteredRef>>> {
    let reference = RegisteredRef {
        namespace: claim.namespace.clone(),
        name: claim.name.clone(),
    };
    state.cluster.upsert_claim(claim).await;
    Ok(Json(SuccessResponse::with_data(
        "Volume claim registered",
        reference,
    )))
}
