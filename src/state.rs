//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::admission::PolicyValidator;
use crate::config::Settings;
use crate::governance::GovernanceRegistry;
use crate::revision::RevisionManager;
use crate::store::{ClusterStore, RevisionStore};
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Registered cluster objects the checks consult.
    pub cluster: ClusterStore,

    /// The governance check pipeline, owning the revision manager.
    pub validator: PolicyValidator,
}

impl AppState {
    pub fn new(settings: Settings, governance: Arc<GovernanceRegistry>) -> Self {
        let cluster = ClusterStore::new();
        let revisions = RevisionManager::new(RevisionStore::new(), settings.max_history);
        let validator = PolicyValidator::new(cluster.clone(), revisions, governance);

        Self {
            settings,
            cluster,
            validator,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
