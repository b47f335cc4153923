//! Fluent, paginated CRUD over a single document collection.
//!
//! This crate is the primary entry point for users of bom. It re-exports the core types
//! from `bom-core` and gives access to the available collection backends.
//!
//! A [`Bom`](bom::Bom) is bound to one database and collection. Predicates, a page
//! limit and a sort are accumulated through chained calls, and each execution method
//! hands the resolved filter to the backend under a per-operation timeout.
//!
//! # Quick Start
//!
//! ```ignore
//! use bom::{prelude::*, memory::InMemoryBackend};
//! use bson::doc;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub status: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> BomResult<()> {
//!     let backend = InMemoryBackend::new();
//!
//!     let users = Bom::builder()
//!         .client(backend.clone())
//!         .database("app")
//!         .collection("users")
//!         .build()?;
//!
//!     users
//!         .insert_one(&User { name: "Alice".into(), status: "active".into() })
//!         .await?;
//!
//!     // Fetch the second page of active users, ten per page, newest first
//!     let page = Bom::builder()
//!         .client(backend)
//!         .database("app")
//!         .collection("users")
//!         .build()?
//!         .where_eq("status", "active")
//!         .with_limit(Limit::new(2, 10))
//!         .with_sort(Sort::desc("name"))
//!         .page::<User>()
//!         .await?;
//!
//!     println!("{} of {} users", page.items.len(), page.pagination.total_count);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Filters
//!
//! Each predicate call files an equality fragment under a combinator:
//!
//! - `where_eq` - appended to `$and`
//! - `or_where` - appended to `$or`
//! - `in_where` - resolved to `{ field: { $in: values } }`
//! - `not_where` - appended to `$nor`
//!
//! A raw condition set with `with_condition` replaces all of them.
//!
//! # Backends
//!
//! - [`memory`] - In-memory collections for development and testing
//! - [`mongodb`] - MongoDB through the official driver (requires `mongodb` feature)

pub mod prelude;

pub use bom_core::{backend, bom, config, document, error, id, page, query};

// Re-export BSON types for convenience
pub use bson;

/// In-memory collection backend.
pub mod memory {
    pub use bom_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// MongoDB collection backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use bom_mongodb::{MongoDbBackend, MongoDbBackendBuilder};
}
