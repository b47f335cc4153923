//! A fluent query builder for paginated CRUD against a single document collection.
//!
//! This crate is the core of the bom project and provides:
//!
//! - **Query builder** ([`bom`]) - Chained predicates, limit and sort, executed through a backend
//! - **Filter resolution** ([`query`]) - Fragments, combinators, raw conditions and sort directives
//! - **Pagination** ([`page`]) - Skip/limit arithmetic, pagination snapshots and typed pages
//! - **Backend abstraction** ([`backend`]) - The narrow interface to a database client
//! - **Configuration** ([`config`]) - Builder options and serializable defaults
//! - **Documents** ([`document`]) - BSON encoding/decoding helpers and single results
//! - **Identifiers** ([`id`]) - Object id parsing, strict and best-effort
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use bom_core::bom::Bom;
//! use bson::doc;
//!
//! let bom = Bom::builder()
//!     .client(backend)
//!     .database("app")
//!     .collection("users")
//!     .build()?;
//!
//! bom.insert_one(&doc! { "name": "Alice", "status": "active" }).await?;
//!
//! let alice = bom
//!     .where_eq("name", "Alice")
//!     .find_one(|result| result.decode::<User>())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as bom_core;

pub mod backend;
pub mod bom;
pub mod config;
pub mod document;
pub mod error;
pub mod id;
pub mod page;
pub mod query;
