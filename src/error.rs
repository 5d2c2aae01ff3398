use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way a permit or worker action can fail.
///
/// All variants are raised before the store is written, so a failed request
/// never leaves a partially applied record behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PermitError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("permit {0} is closed; no further actions are allowed")]
    PermitClosed(String),

    #[error("{role} cannot {action} while status is {status}")]
    InvalidTransition {
        role: String,
        action: String,
        status: String,
    },

    #[error("{email} is not the {role} assigned to this permit")]
    RoleMismatch { role: String, email: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid validity window: {0}")]
    InvalidPermitWindow(String),

    #[error("renewal must end after it starts")]
    InvalidRenewalWindow,

    #[error("renewal window must lie inside the permit validity window")]
    OutOfBounds,

    #[error("renewal lasts {hours:.1}h, limit is {max_hours}h")]
    DurationExceeded { hours: f64, max_hours: u32 },

    #[error("renewal starts before the previous approved renewal ends at {prior_end}")]
    Overlap { prior_end: String },

    #[error("previous renewal is still {0}")]
    PendingRenewalExists(String),

    #[error("concurrent update on {0}, retries exhausted")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Wire name of an error, as reported in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "PermitClosedError")]
    PermitClosed,
    #[serde(rename = "InvalidTransitionError")]
    InvalidTransition,
    #[serde(rename = "RoleMismatchError")]
    RoleMismatch,
    #[serde(rename = "InvalidPayloadError")]
    InvalidPayload,
    #[serde(rename = "InvalidPermitWindowError")]
    InvalidPermitWindow,
    #[serde(rename = "InvalidRenewalWindowError")]
    InvalidRenewalWindow,
    #[serde(rename = "OutOfBoundsError")]
    OutOfBounds,
    #[serde(rename = "DurationExceededError")]
    DurationExceeded,
    #[serde(rename = "OverlapError")]
    Overlap,
    #[serde(rename = "PendingRenewalExistsError")]
    PendingRenewalExists,
    #[serde(rename = "ConflictError")]
    Conflict,
    #[serde(rename = "StorageUnavailableError")]
    StorageUnavailable,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        write!(f, "{name}")
    }
}

impl PermitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PermitError::NotFound { .. } => ErrorKind::NotFound,
            PermitError::PermitClosed(_) => ErrorKind::PermitClosed,
            PermitError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PermitError::RoleMismatch { .. } => ErrorKind::RoleMismatch,
            PermitError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            PermitError::InvalidPermitWindow(_) => ErrorKind::InvalidPermitWindow,
            PermitError::InvalidRenewalWindow => ErrorKind::InvalidRenewalWindow,
            PermitError::OutOfBounds => ErrorKind::OutOfBounds,
            PermitError::DurationExceeded { .. } => ErrorKind::DurationExceeded,
            PermitError::Overlap { .. } => ErrorKind::Overlap,
            PermitError::PendingRenewalExists(_) => ErrorKind::PendingRenewalExists,
            PermitError::Conflict(_) => ErrorKind::Conflict,
            PermitError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// Failures reported by a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// The stored version moved since the record was read.
    #[error("version conflict on {id}: expected {expected}, found {found}")]
    Conflict { id: String, expected: u64, found: u64 },

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
