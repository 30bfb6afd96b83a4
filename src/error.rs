//! Error types for the sync engine

use thiserror::Error;

use crate::status::OperationKind;

/// Result type for store commands
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures reported by the remote collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the request
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Errors surfaced by store commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The remote call was rejected (network, validation or authorization)
    #[error("{}: {source}", .operation.failure_message())]
    RemoteFailure {
        operation: OperationKind,
        #[source]
        source: RemoteError,
    },

    /// A required entity is not present in local state
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u32 },

    /// A request failed validation before reaching the remote
    #[error("invalid value for {field}: {message}")]
    InvalidInput { field: &'static str, message: String },
}

impl StoreError {
    pub fn remote(operation: OperationKind, source: RemoteError) -> Self {
        StoreError::RemoteFailure { operation, source }
    }

    pub fn not_found(entity: &'static str, id: u32) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}
