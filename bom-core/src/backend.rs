//! Database client abstraction.
//!
//! The query builder performs no I/O of its own. Every read and write goes through a
//! [`CollectionBackend`], a narrow async interface over a document-database client
//! addressed by a [`Namespace`].
//!
//! # Traits
//!
//! - [`CollectionBackend`]: The operations the query builder delegates
//! - [`CollectionBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use bom_core::backend::{CollectionBackend, Namespace};
//! use bom_core::query::Filter;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//! let users = Namespace::new("app", "users");
//!
//! backend.insert_one(&users, doc! { "name": "Alice" }).await?;
//! let count = backend.count(&users, Filter::match_all()).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use std::{fmt, fmt::Debug, sync::Arc};

use crate::{error::BomResult, query::Filter};

/// The database and collection an operation targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// The database name.
    pub database: String,
    /// The collection name.
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self { database: database.into(), collection: collection.into() }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Skip, limit and sort applied to a streaming find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
    /// Sort specification, e.g. `{ "name": 1 }`.
    pub sort: Option<Document>,
}

/// A stream of documents produced by [`CollectionBackend::find`].
///
/// The stream owns the underlying cursor; dropping it releases the cursor.
pub type DocumentStream = BoxStream<'static, BomResult<Document>>;

/// Result of [`CollectionBackend::insert_one`].
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneOutcome {
    /// The `_id` of the inserted document.
    pub inserted_id: Bson,
}

/// Result of [`CollectionBackend::update_one`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of documents that matched the filter (0 or 1).
    pub matched_count: u64,
    /// Number of documents that were changed (0 or 1).
    pub modified_count: u64,
    /// The `_id` of an upserted document, if the backend performed an upsert.
    pub upserted_id: Option<Bson>,
}

/// Abstract interface over a document-database client.
///
/// Implementations translate each call into a single driver operation and report any
/// driver failure as [`BomError::Backend`](crate::error::BomError::Backend). Errors are
/// never retried at this layer.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single client can be shared by many
/// builders.
#[async_trait]
pub trait CollectionBackend: Send + Sync + Debug {
    /// Inserts a single document.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The target database and collection
    /// * `document` - The document to insert. Backends assign an `_id` when it is missing.
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> BomResult<InsertOneOutcome>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The target database and collection
    /// * `filter` - Selects the document to update
    /// * `update` - An update document built from operators such as `$set`
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Filter,
        update: Document,
    ) -> BomResult<UpdateOutcome>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>>;

    /// Atomically removes and returns the first document matching `filter`.
    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Filter,
    ) -> BomResult<Option<Document>>;

    /// Counts the documents matching `filter`.
    async fn count(&self, namespace: &Namespace, filter: Filter) -> BomResult<u64>;

    /// Opens a cursor over the documents matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The target database and collection
    /// * `filter` - Selects the documents to stream
    /// * `spec` - Skip, limit and sort to apply
    ///
    /// # Returns
    ///
    /// A [`DocumentStream`] yielding documents in delivery order. An `Err` item reports
    /// a cursor failure; callers stop iterating at the first one.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Filter,
        spec: FindSpec,
    ) -> BomResult<DocumentStream>;
}

#[async_trait]
impl<B> CollectionBackend for &B
where
    B: CollectionBackend,
{
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> BomResult<InsertOneOutcome> {
        (*self).insert_one(namespace, document).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Filter,
        update: Document,
    ) -> BomResult<UpdateOutcome> {
        (*self).update_one(namespace, filter, update).await
    }

    async fn find_one(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        (*self).find_one(namespace, filter).await
    }

    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Filter,
    ) -> BomResult<Option<Document>> {
        (*self).find_one_and_delete(namespace, filter).await
    }

    async fn count(&self, namespace: &Namespace, filter: Filter) -> BomResult<u64> {
        (*self).count(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Filter,
        spec: FindSpec,
    ) -> BomResult<DocumentStream> {
        (*self).find(namespace, filter, spec).await
    }
}

#[async_trait]
impl<B> CollectionBackend for Arc<B>
where
    B: CollectionBackend,
{
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> BomResult<InsertOneOutcome> {
        (**self).insert_one(namespace, document).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Filter,
        update: Document,
    ) -> BomResult<UpdateOutcome> {
        (**self).update_one(namespace, filter, update).await
    }

    async fn find_one(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        (**self).find_one(namespace, filter).await
    }

    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Filter,
    ) -> BomResult<Option<Document>> {
        (**self).find_one_and_delete(namespace, filter).await
    }

    async fn count(&self, namespace: &Namespace, filter: Filter) -> BomResult<u64> {
        (**self).count(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Filter,
        spec: FindSpec,
    ) -> BomResult<DocumentStream> {
        (**self).find(namespace, filter, spec).await
    }
}

#[async_trait]
pub trait CollectionBackendBuilder {
    type Backend: CollectionBackend;

    async fn build(self) -> BomResult<Self::Backend>;
}
