use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use bson::Document;
use mongodb::{
    Client, Collection as MongoCollection,
    options::ClientOptions,
};
use tracing::debug;
use bom_core::{
    backend::{
        CollectionBackend, CollectionBackendBuilder, DocumentStream, FindSpec, InsertOneOutcome,
        Namespace, UpdateOutcome,
    },
    error::{BomError, BomResult},
    query::Filter,
};

use crate::query::find_options;


/// Collection backend over the official MongoDB driver.
///
/// The client is cheap to clone and pools its connections, so one `MongoDbBackend` can
/// serve any number of query builders across databases and collections.
#[derive(Debug, Clone)]
pub struct MongoDbBackend {
    client: Client,
}

impl MongoDbBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder(dsn: &str) -> MongoDbBackendBuilder {
        MongoDbBackendBuilder::new(dsn)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl CollectionBackend for MongoDbBackend {
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> BomResult<InsertOneOutcome> {
        let result = self.get_collection(namespace)
            .insert_one(document)
            .await
            .map_err(|e| BomError::Backend(e.to_string()))?;

        Ok(InsertOneOutcome { inserted_id: result.inserted_id })
    }

    async fn update_one(&self, namespace: &Namespace, filter: Filter, update: Document) -> BomResult<UpdateOutcome> {
        let result = self.get_collection(namespace)
            .update_one(filter.into_document(), update)
            .await
            .map_err(|e| BomError::Backend(e.to_string()))?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn find_one(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        self.get_collection(namespace)
            .find_one(filter.into_document())
            .await
            .map_err(|e| BomError::Backend(e.to_string()))
    }

    async fn find_one_and_delete(&self, namespace: &Namespace, filter: Filter) -> BomResult<Option<Document>> {
        self.get_collection(namespace)
            .find_one_and_delete(filter.into_document())
            .await
            .map_err(|e| BomError::Backend(e.to_string()))
    }

    async fn count(&self, namespace: &Namespace, filter: Filter) -> BomResult<u64> {
        self.get_collection(namespace)
            .count_documents(filter.into_document())
            .await
            .map_err(|e| BomError::Backend(e.to_string()))
    }

    async fn find(&self, namespace: &Namespace, filter: Filter, spec: FindSpec) -> BomResult<DocumentStream> {
        let cursor = self.get_collection(namespace)
            .find(filter.into_document())
            .with_options(find_options(spec))
            .await
            .map_err(|e| BomError::Backend(e.to_string()))?;

        Ok(
            cursor
                .map_err(|e| BomError::Backend(e.to_string()))
                .boxed()
        )
    }
}

pub struct MongoDbBackendBuilder {
    dsn: String,
}

impl MongoDbBackendBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
        }
    }
}

#[async_trait]
impl CollectionBackendBuilder for MongoDbBackendBuilder {
    type Backend = MongoDbBackend;

    async fn build(self) -> BomResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| BomError::Configuration(e.to_string()))?;
        debug!(hosts = ?options.hosts, "connecting to mongodb");

        Ok(MongoDbBackend::new(
            Client::with_options(options)
                .map_err(|e| BomError::Configuration(e.to_string()))?,
        ))
    }
}
