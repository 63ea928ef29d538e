//! Error taxonomy of the synchronization engine.
//!
//! `SyncError` is `Clone` because one in-flight section fetch may be awaited
//! by several callers, and each of them receives the same outcome.

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Transport, HTTP or decoding failure. The cache stays retryable.
    #[error("Remote request failed: {cause}")]
    Remote { cause: String },

    /// Rejected create-asset input. Never reaches the network.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The organization id does not resolve.
    #[error("Organization not found: {0}")]
    NotFound(String),

    /// One step of the RFID fan-out failed. Logged and contained.
    #[error("RFID index step failed for asset {asset_id}: {cause}")]
    PartialIndex {
        asset_id: String,
        attribute_id: Option<String>,
        cause: String,
    },

    #[error("No active organization selected")]
    NoActiveOrganization,

    /// The active organization was switched while this call was starting.
    #[error("Active organization changed during the request")]
    OrganizationChanged,
}

impl SyncError {
    pub fn remote(cause: impl std::fmt::Display) -> Self {
        SyncError::Remote {
            cause: cause.to_string(),
        }
    }

    /// Whether calling the same operation again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Remote { .. } | SyncError::OrganizationChanged)
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        SyncError::remote(err)
    }
}
