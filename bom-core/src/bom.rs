//! The fluent query builder.
//!
//! [`Bom`] binds a [`CollectionBackend`] to one database and collection, accumulates
//! predicates, limit and sort through chained calls, and delegates each execution
//! method to the backend with the resolved filter.
//!
//! # Example
//!
//! ```ignore
//! use bom_core::{bom::Bom, page::Limit, query::Sort};
//!
//! let mut users = Bom::builder()
//!     .client(backend)
//!     .database("app")
//!     .collection("users")
//!     .build()?
//!     .where_eq("status", "active")
//!     .in_where("role", vec!["admin", "owner"])
//!     .with_limit(Limit::new(2, 10))
//!     .with_sort(Sort::desc("createdAt"));
//!
//! let pagination = users
//!     .list_with_pagination(|document| {
//!         println!("{document}");
//!         Ok(())
//!     })
//!     .await?;
//! ```
//!
//! # Timeouts
//!
//! Every execution method runs inside its own `tokio::time::timeout` of
//! [`Bom::query_timeout`]. Expiry yields [`BomError::Timeout`] and drops any open cursor.
//! A Tokio runtime with the time driver enabled is required.

use bson::Document;
use futures::StreamExt;
use serde::{Serialize, de::DeserializeOwned};
use std::{future::Future, time::Duration};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    backend::{CollectionBackend, DocumentStream, FindSpec, InsertOneOutcome, Namespace, UpdateOutcome},
    config::BomOptions,
    document::{DocumentExt, SingleResult, encode},
    error::{BomError, BomResult},
    page::{Limit, Page, Pagination},
    query::{Filter, QueryBuilder, Sort},
};

/// A query builder bound to a single collection.
///
/// Setters consume and return the builder. A builder is meant to serve one request and
/// is not shared between tasks.
#[derive(Debug)]
pub struct Bom<B: CollectionBackend> {
    client: B,
    namespace: Namespace,
    query_timeout: Duration,
    page_size: u32,
    query: QueryBuilder,
    pagination: Pagination,
}

impl<B: CollectionBackend> Bom<B> {
    /// Starts a set of [`BomOptions`].
    pub fn builder() -> BomOptions<B> {
        BomOptions::new()
    }

    /// Creates a builder from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::Configuration`] when no client was supplied or the page size
    /// is 0.
    pub fn new(options: BomOptions<B>) -> BomResult<Self> {
        let client = options
            .client
            .ok_or_else(|| BomError::Configuration("database client is required".to_string()))?;

        if options.page_size == 0 {
            return Err(BomError::Configuration("page size must be greater than 0".to_string()));
        }

        Ok(Self {
            client,
            namespace: Namespace::new(options.database, options.collection),
            query_timeout: options.query_timeout,
            page_size: options.page_size,
            query: QueryBuilder::new().limit(Limit::new(1, options.page_size)),
            pagination: Pagination::new(options.page_size),
        })
    }

    pub fn client(&self) -> &B {
        &self.client
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn database(&self) -> &str {
        &self.namespace.database
    }

    pub fn collection(&self) -> &str {
        &self.namespace.collection
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// The snapshot recorded by the last paginated listing.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn with_db(mut self, database: impl Into<String>) -> Self {
        self.namespace.database = database.into();
        self
    }

    pub fn with_coll(mut self, collection: impl Into<String>) -> Self {
        self.namespace.collection = collection.into();
        self
    }

    pub fn with_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Sets a raw filter that replaces every accumulated predicate.
    pub fn with_condition(mut self, condition: Document) -> Self {
        self.query = self.query.condition(condition);
        self
    }

    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.query = self.query.sort(sort);
        self
    }

    /// Adds an equality constraint to the `$and` group.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<bson::Bson>) -> Self {
        self.query = self.query.where_eq(field, value);
        self
    }

    /// Adds an equality constraint to the `$or` group.
    pub fn or_where(mut self, field: impl Into<String>, value: impl Into<bson::Bson>) -> Self {
        self.query = self.query.or_where(field, value);
        self
    }

    /// Requires `field` to be one of the values in the array `value`.
    pub fn in_where(mut self, field: impl Into<String>, value: impl Into<bson::Bson>) -> Self {
        self.query = self.query.in_where(field, value);
        self
    }

    /// Excludes documents where `field` equals `value`.
    pub fn not_where(mut self, field: impl Into<String>, value: impl Into<bson::Bson>) -> Self {
        self.query = self.query.not_where(field, value);
        self
    }

    /// Resolves the current filter without executing anything.
    pub fn resolve(&self) -> Filter {
        self.query.resolve()
    }

    /// Inserts `document`, which may be a [`Document`] or any `Serialize` value.
    pub async fn insert_one<T>(&self, document: &T) -> BomResult<InsertOneOutcome>
    where
        T: Serialize + ?Sized,
    {
        let document = encode(document)?;
        debug!(namespace = %self.namespace, "insert_one");

        self.scoped("insert_one", async {
            self.client
                .insert_one(&self.namespace, document)
                .await
        })
        .await
    }

    /// Applies `update` to the first document matching the current filter.
    pub async fn update_one(&self, update: Document) -> BomResult<UpdateOutcome> {
        let filter = self.query.resolve();
        debug!(namespace = %self.namespace, %filter, "update_one");

        self.scoped("update_one", async {
            self.client
                .update_one(&self.namespace, filter, update)
                .await
        })
        .await
    }

    /// Looks up the first matching document and hands the result to `consumer`.
    ///
    /// The consumer is called exactly once, also when nothing matched, and its result is
    /// returned as-is.
    pub async fn find_one<F, T>(&self, consumer: F) -> BomResult<T>
    where
        F: FnOnce(SingleResult) -> BomResult<T>,
    {
        let filter = self.query.resolve();
        debug!(namespace = %self.namespace, %filter, "find_one");

        let document = self
            .scoped("find_one", async {
                self.client
                    .find_one(&self.namespace, filter)
                    .await
            })
            .await?;

        consumer(SingleResult::new(self.namespace.clone(), document))
    }

    /// Removes the first matching document and returns it.
    pub async fn find_one_and_delete(&self) -> BomResult<SingleResult> {
        let filter = self.query.resolve();
        debug!(namespace = %self.namespace, %filter, "find_one_and_delete");

        let document = self
            .scoped("find_one_and_delete", async {
                self.client
                    .find_one_and_delete(&self.namespace, filter)
                    .await
            })
            .await?;

        Ok(SingleResult::new(self.namespace.clone(), document))
    }

    /// Streams every matching document to `consumer` in delivery order.
    ///
    /// Limit and sort are not applied. Iteration stops at the first consumer error or
    /// cursor error, which is returned.
    pub async fn list<F>(&self, mut consumer: F) -> BomResult<()>
    where
        F: FnMut(Document) -> BomResult<()>,
    {
        let filter = self.query.resolve();
        debug!(namespace = %self.namespace, %filter, "list");

        self.scoped("list", async {
            let cursor = self
                .client
                .find(&self.namespace, filter, FindSpec::default())
                .await?;

            drain(cursor, &mut consumer).await
        })
        .await
    }

    /// Streams one page of matching documents to `consumer` and returns the updated
    /// pagination snapshot.
    ///
    /// The current [`Limit`] and [`Sort`] are applied to the find, and a count is issued
    /// against the same filter. Count and find are separate operations, so concurrent
    /// writes may make them disagree.
    pub async fn list_with_pagination<F>(&mut self, mut consumer: F) -> BomResult<Pagination>
    where
        F: FnMut(Document) -> BomResult<()>,
    {
        let filter = self.query.resolve();
        let limit = *self.query.current_limit();
        let window = limit.window(self.page_size);
        let spec = FindSpec {
            skip: Some(window.offset),
            limit: Some(i64::from(window.limit)),
            sort: self.query.current_sort().and_then(Sort::resolve),
        };
        debug!(
            namespace = %self.namespace,
            %filter,
            skip = window.offset,
            limit = window.limit,
            sort = ?spec.sort,
            "list_with_pagination"
        );

        let total_count = self
            .scoped("list_with_pagination", async {
                let total_count = self
                    .client
                    .count(&self.namespace, filter.clone())
                    .await?;
                let cursor = self
                    .client
                    .find(&self.namespace, filter, spec)
                    .await?;

                drain(cursor, &mut consumer).await?;

                Ok(total_count)
            })
            .await?;

        Ok(self.pagination.update(total_count, limit.page, limit.size))
    }

    /// Collects one page of matching documents decoded as `T`.
    pub async fn page<T>(&mut self) -> BomResult<Page<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let pagination = self
            .list_with_pagination(|document| {
                items.push(document.decode::<T>()?);
                Ok(())
            })
            .await?;

        Ok(Page::new(items, pagination))
    }

    async fn scoped<T, W>(&self, operation: &'static str, work: W) -> BomResult<T>
    where
        W: Future<Output = BomResult<T>>,
    {
        match timeout(self.query_timeout, work).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                debug!(operation, namespace = %self.namespace, error = %err, "operation failed");
                Err(err)
            }
            Err(_) => {
                warn!(
                    operation,
                    namespace = %self.namespace,
                    timeout = ?self.query_timeout,
                    "operation timed out"
                );
                Err(BomError::Timeout(self.query_timeout))
            }
        }
    }
}

async fn drain<F>(mut cursor: DocumentStream, consumer: &mut F) -> BomResult<()>
where
    F: FnMut(Document) -> BomResult<()>,
{
    while let Some(item) = cursor.next().await {
        consumer(item?)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::{Bson, doc};
    use futures::stream;
    use std::sync::Mutex;

    /// Records what it is asked to do and serves a fixed document list.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        documents: Vec<Document>,
        filters: Mutex<Vec<Filter>>,
        specs: Mutex<Vec<FindSpec>>,
    }

    impl RecordingBackend {
        fn with(documents: Vec<Document>) -> Self {
            Self { documents, ..Default::default() }
        }

        fn record(&self, filter: &Filter) {
            self.filters.lock().unwrap().push(filter.clone());
        }
    }

    #[async_trait]
    impl CollectionBackend for RecordingBackend {
        async fn insert_one(&self, _: &Namespace, document: Document) -> BomResult<InsertOneOutcome> {
            Ok(InsertOneOutcome { inserted_id: document.get("_id").cloned().unwrap_or(Bson::Null) })
        }

        async fn update_one(&self, _: &Namespace, filter: Filter, _: Document) -> BomResult<UpdateOutcome> {
            self.record(&filter);
            Ok(UpdateOutcome::default())
        }

        async fn find_one(&self, _: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
            self.record(&filter);
            Ok(self.documents.first().cloned())
        }

        async fn find_one_and_delete(&self, _: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
            self.record(&filter);
            Ok(None)
        }

        async fn count(&self, _: &Namespace, filter: Filter) -> BomResult<u64> {
            self.record(&filter);
            Ok(self.documents.len() as u64)
        }

        async fn find(&self, _: &Namespace, filter: Filter, spec: FindSpec) -> BomResult<DocumentStream> {
            self.record(&filter);
            self.specs.lock().unwrap().push(spec);
            Ok(stream::iter(self.documents.clone().into_iter().map(Ok)).boxed())
        }
    }

    fn bom(backend: RecordingBackend) -> Bom<RecordingBackend> {
        Bom::builder()
            .client(backend)
            .database("app")
            .collection("users")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_one_sends_resolved_filter() {
        let bom = bom(RecordingBackend::default()).where_eq("name", "alice");
        bom.update_one(doc! { "$set": { "status": "active" } }).await.unwrap();

        assert_eq!(
            bom.client().filters.lock().unwrap().as_slice(),
            &[Filter::from(doc! { "$and": [{ "name": "alice" }] })]
        );
    }

    #[tokio::test]
    async fn test_list_sends_no_window_or_sort() {
        let bom = bom(RecordingBackend::with(vec![doc! { "n": 1 }]))
            .with_limit(Limit::new(3, 5))
            .with_sort(Sort::desc("n"));
        bom.list(|_| Ok(())).await.unwrap();

        assert_eq!(bom.client().specs.lock().unwrap().as_slice(), &[FindSpec::default()]);
    }

    #[tokio::test]
    async fn test_list_with_pagination_sends_window_and_sort() {
        let mut bom = bom(RecordingBackend::with(vec![doc! { "n": 1 }; 3]))
            .in_where("role", vec!["admin"])
            .with_limit(Limit::new(3, 5))
            .with_sort(Sort::desc("CreatedAt"));

        let pagination = bom.list_with_pagination(|_| Ok(())).await.unwrap();

        assert_eq!(
            bom.client().specs.lock().unwrap().as_slice(),
            &[FindSpec { skip: Some(10), limit: Some(5), sort: Some(doc! { "createdat": -1 }) }]
        );
        let filters = bom.client().filters.lock().unwrap().clone();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], filters[1]);
        assert_eq!(filters[0], Filter::from(doc! { "role": { "$in": ["admin"] } }));
        assert_eq!(pagination.total_count, 3);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.current_page, 3);
    }

    #[tokio::test]
    async fn test_page_zero_behaves_as_page_one() {
        let mut bom = bom(RecordingBackend::default()).with_limit(Limit::new(0, 10));
        bom.list_with_pagination(|_| Ok(())).await.unwrap();

        let specs = bom.client().specs.lock().unwrap().clone();
        assert_eq!(specs[0].skip, Some(0));
        assert_eq!(specs[0].limit, Some(10));
        assert_eq!(bom.pagination().current_page, 1);
    }

    #[tokio::test]
    async fn test_find_one_propagates_consumer_error() {
        let bom = bom(RecordingBackend::with(vec![doc! { "n": 1 }]));

        let err = bom
            .find_one(|_| -> BomResult<()> { Err(BomError::callback("bad row")) })
            .await
            .unwrap_err();

        assert_eq!(err, BomError::Callback("bad row".into()));
    }

    #[tokio::test]
    async fn test_find_one_and_delete_without_match() {
        let result = bom(RecordingBackend::default()).find_one_and_delete().await.unwrap();

        assert!(!result.is_found());
        assert!(matches!(result.decode::<Document>(), Err(BomError::DocumentNotFound(_))));
    }
}
