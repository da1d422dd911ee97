//! Revision history handlers

use crate::error::{not_found_error, ApiResult};
use crate::models::revision::{Revision, RevisionSnapshot};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One revision as served to clients: the stored bookkeeping fields
/// rendered as the persisted annotation map, next to the frozen snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionView {
    pub name: String,
    pub namespace: String,
    pub annotations: BTreeMap<String, String>,
    pub snapshot: RevisionSnapshot,
    pub created_at: DateTime<Utc>,
}

impl From<Revision> for RevisionView {
    fn from(revision: Revision) -> Self {
        let annotations = revision.annotations();
        Self {
            name: revision.name,
            namespace: revision.namespace,
            annotations,
            snapshot: revision.snapshot,
            created_at: revision.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionList {
    pub revisions: Vec<RevisionView>,
}

/// GET /workloads/{namespace}/{name}/revisions
pub async fn list_for_workload(
    State(state): State<SharedState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<SuccessResponse<RevisionList>>> {
    let Some(flavor) = state.cluster.identity_holder(&namespace, &name).await else {
        return Err(not_found_error(format!(
            "workload {}/{} not found",
            namespace, name
        )));
    };
    let workload = state.cluster.get_workload(flavor, &namespace, &name).await?;

    let revisions = state
        .validator
        .revisions()
        .store()
        .list_by_labels(&namespace, &workload.pod_labels())
        .await
        .into_iter()
        .map(RevisionView::from)
        .collect();

    Ok(Json(SuccessResponse::with_data(
        "Revision history",
        RevisionList { revisions },
    )))
}
