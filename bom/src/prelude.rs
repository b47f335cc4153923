//! Convenient re-exports of commonly used types from bom.
//!
//! ```ignore
//! use bom::prelude::*;
//! ```

pub use bom_core::{
    bom::Bom,
    config::{BomConfig, BomOptions},
    backend::{CollectionBackend, CollectionBackendBuilder, DocumentStream, FindSpec, Namespace, InsertOneOutcome, UpdateOutcome},
    document::{DocumentExt, SingleResult},
    query::{Combinator, Filter, Fragment, QueryBuilder, Sort},
    page::{Limit, Page, Pagination},
    error::{BomError, BomResult},
};
