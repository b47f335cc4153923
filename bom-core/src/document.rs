//! Conversions between Rust values and BSON documents.
//!
//! [`DocumentExt`] decodes documents returned by a backend into caller types, and
//! [`encode`] turns any `Serialize` value into a document for insertion.
//! [`SingleResult`] is the handle passed to single-document consumers.

use bson::{Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::Namespace,
    error::{BomError, BomResult},
};

/// Serializes `value` into a BSON document.
///
/// # Errors
///
/// Returns [`BomError::Serialization`] if `value` does not serialize to a document
/// (for example a bare integer or a sequence).
pub fn encode<T>(value: &T) -> BomResult<Document>
where
    T: Serialize + ?Sized,
{
    Ok(serialize_to_document(value)?)
}

/// Extension trait for decoding BSON documents into typed values.
pub trait DocumentExt {
    /// Deserializes this document into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::Serialization`] if the document does not match `T`.
    fn decode<T: DeserializeOwned>(&self) -> BomResult<T>;
}

impl DocumentExt for Document {
    fn decode<T: DeserializeOwned>(&self) -> BomResult<T> {
        Ok(deserialize_from_document(self.clone())?)
    }
}

/// The outcome of a single-document read: either the matched document or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleResult {
    namespace: Namespace,
    document: Option<Document>,
}

impl SingleResult {
    pub fn new(namespace: Namespace, document: Option<Document>) -> Self {
        Self { namespace, document }
    }

    /// Returns `true` if a document matched.
    pub fn is_found(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    /// Decodes the matched document into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::DocumentNotFound`] when nothing matched, or
    /// [`BomError::Serialization`] if the document does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> BomResult<T> {
        match &self.document {
            Some(document) => document.decode(),
            None => Err(BomError::DocumentNotFound(self.namespace.to_string())),
        }
    }
}
