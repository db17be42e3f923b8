//! Registry error types.

use thiserror::Error;

use crate::types::RecordStatus;

/// Errors surfaced by registry mutations.
///
/// Load-time corruption is absorbed by the store and never appears here.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Writing the collection failed
    #[error("Failed to persist registry: {0}")]
    Persist(#[source] std::io::Error),

    /// Encoding the collection failed
    #[error("Failed to encode registry: {0}")]
    Encode(#[source] serde_json::Error),

    /// An imported document was not a record array
    #[error("Import rejected: {0}")]
    Import(#[source] serde_json::Error),

    /// A verification payload could not be decoded
    #[error("Invalid verification payload: {0}")]
    InvalidPayload(String),

    /// Authorization must go through `activate`
    #[error("Status {0} can only be granted by activation")]
    ActivationRequired(RecordStatus),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
