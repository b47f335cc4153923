//! In-memory collection backend for bom.
//!
//! This crate provides a thread-safe, in-memory implementation of the `CollectionBackend`
//! trait. It keeps documents behind async-aware read-write locks and evaluates the same
//! filter, sort and paging documents the query builder produces, which makes it a good
//! fit for tests and local development.
//!
//! # Supported filters
//!
//! - Logical groups: `$and`, `$or`, `$nor`
//! - Field operators: `$eq`, `$ne`, `$in`, `$nin`, `$exists`, `$gt`, `$gte`, `$lt`, `$lte`
//! - Implicit equality, including membership in array fields and dotted paths
//!
//! Updates accept `$set`, `$unset` and `$inc`.
//!
//! # Quick Start
//!
//! ```ignore
//! use bom::{bom::Bom, memory::InMemoryBackend};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Bom::builder()
//!         .client(InMemoryBackend::new())
//!         .database("app")
//!         .collection("users")
//!         .build()?;
//!
//!     users.insert_one(&doc! { "name": "Alice" }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as bom_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};
