//! Error types and result types for query builder operations.
//!
//! Every fallible operation in this crate returns [`BomResult<T>`]. Errors raised by a
//! [`CollectionBackend`](crate::backend::CollectionBackend) are passed through as
//! [`BomError::Backend`] and are never retried.

use std::time::Duration;

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while building or executing a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BomError {
    /// The builder was constructed from incomplete or invalid options.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An error returned by the underlying database client.
    #[error("Backend error: {0}")]
    Backend(String),
    /// The delegated operation did not finish within the query timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    /// A caller-supplied consumer rejected a result and halted iteration.
    #[error("Callback error: {0}")]
    Callback(String),
    /// A string could not be parsed into an object identifier.
    #[error("Invalid object id {0:?}: {1}")]
    InvalidId(String, String),
    /// No document matched the filter. The argument is the namespace that was searched.
    #[error("No document found in {0}")]
    DocumentNotFound(String),
    /// The document or update has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Serialization/deserialization error when converting between BSON and Rust types.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BomError {
    /// Wraps any displayable error raised inside a consumer callback.
    pub fn callback(err: impl std::fmt::Display) -> Self {
        BomError::Callback(err.to_string())
    }
}

/// A specialized `Result` type for query builder operations.
pub type BomResult<T> = Result<T, BomError>;

impl From<BsonError> for BomError {
    fn from(err: BsonError) -> Self {
        BomError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for BomError {
    fn from(err: SerdeJsonError) -> Self {
        BomError::Serialization(err.to_string())
    }
}
