//! In-memory collection backend.
//!
//! This module provides a backend that keeps every collection as an ordered list of
//! BSON documents behind an async-safe read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use bson::{Bson, Document, oid::ObjectId};

use bom_core::{
    backend::{
        CollectionBackend, CollectionBackendBuilder, DocumentStream, FindSpec, InsertOneOutcome,
        Namespace, UpdateOutcome,
    },
    error::{BomError, BomResult},
    query::Filter,
};

use crate::evaluator::{FilterEvaluator, compare_by};

type StoreMap = HashMap<Namespace, Vec<Document>>;


/// Thread-safe in-memory collection backend.
///
/// Documents are kept in insertion order per namespace, so unsorted finds return them
/// in the order they were inserted. Filters are evaluated by scanning the collection.
///
/// # Thread Safety
///
/// `InMemoryBackend` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same data.
///
/// # Example
///
/// ```ignore
/// use bom_memory::InMemoryBackend;
/// use bom_core::{backend::{CollectionBackend, Namespace}, query::Filter};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///     let users = Namespace::new("app", "users");
///
///     backend.insert_one(&users, doc! { "name": "Alice" }).await?;
///     assert_eq!(backend.count(&users, Filter::match_all()).await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBackend {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryBackend`.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::default()
    }

    /// Returns a copy of every document stored in `namespace`, in insertion order.
    pub async fn snapshot(&self, namespace: &Namespace) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    fn position(documents: &[Document], filter: &Document) -> BomResult<Option<usize>> {
        for (index, document) in documents.iter().enumerate() {
            if FilterEvaluator::new(document).matches(filter)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }
}


#[async_trait]
impl CollectionBackend for InMemoryBackend {
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> BomResult<InsertOneOutcome> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.clone())
            .or_default();

        let document = match document.get("_id") {
            Some(_) => document,
            None => {
                let mut with_id = Document::new();
                with_id.insert("_id", ObjectId::new());
                with_id.extend(document);
                with_id
            },
        };
        let inserted_id = document
            .get("_id")
            .cloned()
            .unwrap_or(Bson::Null);

        if collection.iter().any(|existing| existing.get("_id") == Some(&inserted_id)) {
            return Err(BomError::Backend(format!(
                "duplicate key {inserted_id} in collection {namespace}"
            )));
        }

        collection.push(document);

        Ok(InsertOneOutcome { inserted_id })
    }

    async fn update_one(&self, namespace: &Namespace, filter: Filter, update: Document) -> BomResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let Some(collection) = store.get_mut(namespace) else {
            return Ok(UpdateOutcome::default());
        };

        let Some(index) = Self::position(collection, filter.as_document())? else {
            return Ok(UpdateOutcome::default());
        };

        let updated = apply_update(&collection[index], &update)?;
        let modified = updated != collection[index];
        collection[index] = updated;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: None,
        })
    }

    async fn find_one(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(collection) = store.get(namespace) else {
            return Ok(None);
        };

        Ok(Self::position(collection, filter.as_document())?.map(|index| collection[index].clone()))
    }

    async fn find_one_and_delete(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        let mut store = self.store.write().await;
        let Some(collection) = store.get_mut(namespace) else {
            return Ok(None);
        };

        Ok(Self::position(collection, filter.as_document())?.map(|index| collection.remove(index)))
    }

    async fn count(&self, namespace: &Namespace, filter: Filter) -> BomResult<u64> {
        let store = self.store.read().await;
        let Some(collection) = store.get(namespace) else {
            return Ok(0);
        };

        Ok(FilterEvaluator::filter_documents(collection, filter.as_document())?.len() as u64)
    }

    async fn find(&self, namespace: &Namespace, filter: Filter, spec: FindSpec) -> BomResult<DocumentStream> {
        let store = self.store.read().await;
        let mut documents = match store.get(namespace) {
            Some(collection) => FilterEvaluator::filter_documents(collection, filter.as_document())?,
            None => vec![],
        };

        if let Some(sort) = &spec.sort {
            documents.sort_by(|a, b| compare_by(sort, a, b));
        }

        // A limit of 0 means no limit; a negative limit is taken by magnitude.
        let limit = match spec.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        let documents = documents
            .into_iter()
            .skip(spec.skip.unwrap_or(0) as usize)
            .take(limit)
            .map(Ok)
            .collect::<Vec<BomResult<Document>>>();

        Ok(stream::iter(documents).boxed())
    }
}

/// Applies a `$set` / `$unset` / `$inc` update document to a copy of `document`.
fn apply_update(document: &Document, update: &Document) -> BomResult<Document> {
    if update.is_empty() {
        return Err(BomError::InvalidDocument("update document must not be empty".into()));
    }

    let mut updated = document.clone();

    for (op, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| BomError::InvalidDocument(format!("{op} requires a document")))?;

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    updated.insert(field.clone(), value.clone());
                }
            },
            "$unset" => {
                for (field, _) in fields {
                    updated.remove(field);
                }
            },
            "$inc" => {
                for (field, delta) in fields {
                    let value = increment(field, updated.get(field), delta)?;
                    updated.insert(field.clone(), value);
                }
            },
            other => {
                return Err(BomError::InvalidDocument(format!("unsupported update operator {other}")));
            },
        }
    }

    Ok(updated)
}

fn increment(field: &str, current: Option<&Bson>, delta: &Bson) -> BomResult<Bson> {
    let overflow = || BomError::InvalidDocument(format!("incrementing {field} overflows int64"));

    let value = match (current.unwrap_or(&Bson::Int32(0)), delta) {
        // An int32 that overflows is promoted to int64.
        (Bson::Int32(a), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(i64::from(*a) + i64::from(*b)),
        },
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?),
        (Bson::Int32(a), Bson::Int64(b)) => Bson::Int64(i64::from(*a).checked_add(*b).ok_or_else(overflow)?),
        (Bson::Int64(a), Bson::Int32(b)) => Bson::Int64(a.checked_add(i64::from(*b)).ok_or_else(overflow)?),
        (Bson::Double(a), Bson::Double(b)) => Bson::Double(a + b),
        (Bson::Double(a), Bson::Int32(b)) => Bson::Double(a + f64::from(*b)),
        (Bson::Int32(a), Bson::Double(b)) => Bson::Double(f64::from(*a) + b),
        (Bson::Double(a), Bson::Int64(b)) => Bson::Double(a + *b as f64),
        (Bson::Int64(a), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        _ => return Err(BomError::InvalidDocument(format!("cannot increment {field}"))),
    };

    Ok(value)
}


/// Builder for constructing [`InMemoryBackend`] instances.
#[derive(Default)]
pub struct InMemoryBackendBuilder;

#[async_trait]
impl CollectionBackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    /// Builds and returns a new [`InMemoryBackend`] instance.
    ///
    /// This always succeeds and returns a freshly initialized backend.
    async fn build(self) -> BomResult<Self::Backend> {
        Ok(InMemoryBackend::new())
    }
}
