//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the flavor-agnostic workload model, revision records, and the
//! cluster objects the validator looks up.

pub mod cluster;
pub mod revision;
pub mod workload;

// Re-export commonly used types
pub use cluster::*;
pub use revision::*;
pub use workload::*;

use serde::Serialize;

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
