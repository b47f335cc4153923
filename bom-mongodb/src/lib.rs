//! MongoDB backend implementation for bom.
//!
//! This crate provides a MongoDB-based implementation of the `CollectionBackend` trait.
//! Filters, sorts and paging windows built by the query builder are handed to the
//! server unchanged, and cursors are streamed to consumers one document at a time.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! bom = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bom::{backend::CollectionBackendBuilder, bom::Bom, mongodb::MongoDbBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbBackend::builder("mongodb://localhost:27017")
//!         .build()
//!         .await?;
//!
//!     let users = Bom::builder()
//!         .client(backend)
//!         .database("app")
//!         .collection("users")
//!         .build()?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as bom_mongodb;

mod query;
pub mod store;

pub use store::{MongoDbBackend, MongoDbBackendBuilder};
