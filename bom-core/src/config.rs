//! Construction options for the query builder.
//!
//! [`BomOptions`] carries everything [`Bom::new`](crate::bom::Bom::new) needs. The
//! serializable part of it, [`BomConfig`], can be loaded from JSON so that database and
//! paging defaults live in configuration while the client is always supplied in code.
//!
//! ```ignore
//! use bom_core::config::{BomConfig, BomOptions};
//!
//! let config = BomConfig::from_json(r#"{ "database": "app", "query_timeout_ms": 2000 }"#)?;
//! let bom = BomOptions::from_config(config)
//!     .client(backend)
//!     .collection("users")
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    backend::CollectionBackend,
    bom::Bom,
    error::BomResult,
    page::DEFAULT_PAGE_SIZE,
};

/// Timeout applied to every delegated operation unless overridden.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializable builder settings.
///
/// Every field is optional in the serialized form and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    /// The database name.
    pub database: String,
    /// The collection name.
    pub collection: String,
    /// Timeout for each delegated operation, in milliseconds.
    pub query_timeout_ms: u64,
    /// Default number of items per page.
    pub page_size: u32,
}

impl BomConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::Serialization`](crate::error::BomError::Serialization) if the
    /// input is not valid JSON or a field has the wrong type.
    pub fn from_json(input: &str) -> BomResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            collection: String::new(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT.as_millis() as u64,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Options consumed by [`Bom::new`](crate::bom::Bom::new).
///
/// # Type Parameters
///
/// * `B` - The database client backend
#[derive(Debug, Clone)]
pub struct BomOptions<B> {
    pub(crate) client: Option<B>,
    pub(crate) database: String,
    pub(crate) collection: String,
    pub(crate) query_timeout: Duration,
    pub(crate) page_size: u32,
}

impl<B> BomOptions<B> {
    /// Creates options with default timeout and page size and no client.
    pub fn new() -> Self {
        Self::from_config(BomConfig::default())
    }

    /// Seeds options from a loaded [`BomConfig`].
    pub fn from_config(config: BomConfig) -> Self {
        Self {
            client: None,
            query_timeout: config.query_timeout(),
            database: config.database,
            collection: config.collection,
            page_size: config.page_size,
        }
    }

    /// Sets the database client. Required.
    pub fn client(mut self, client: B) -> Self {
        self.client = Some(client);
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Sets the default page size, used when a [`Limit`](crate::page::Limit) has size 0.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl<B: CollectionBackend> BomOptions<B> {
    /// Builds the query builder.
    ///
    /// # Errors
    ///
    /// See [`Bom::new`](crate::bom::Bom::new).
    pub fn build(self) -> BomResult<Bom<B>> {
        Bom::new(self)
    }
}

impl<B> Default for BomOptions<B> {
    fn default() -> Self {
        Self::new()
    }
}
