//! Predicate accumulation and filter resolution.
//!
//! A [`QueryBuilder`] collects [`Fragment`]s under one of four [`Combinator`]s, plus an
//! optional raw condition, a [`Limit`] and a [`Sort`]. Calling [`QueryBuilder::resolve`]
//! turns the accumulated state into an immutable [`Filter`] that can be handed to a
//! backend.
//!
//! # Resolution
//!
//! ```ignore
//! use bom_core::query::QueryBuilder;
//!
//! let filter = QueryBuilder::new()
//!     .where_eq("status", "active")
//!     .or_where("role", "admin")
//!     .or_where("role", "owner")
//!     .in_where("tier", vec!["gold", "silver"])
//!     .not_where("banned", true)
//!     .resolve();
//!
//! // {
//! //   "$and": [{ "status": "active" }],
//! //   "$or":  [{ "role": "admin" }, { "role": "owner" }],
//! //   "tier": { "$in": ["gold", "silver"] },
//! //   "$nor": [{ "banned": true }],
//! // }
//! ```
//!
//! `$and` and `$or` live side by side in the top-level document, so the database
//! conjoins them: the OR group narrows the AND group instead of widening it.
//!
//! A raw condition set with [`QueryBuilder::condition`] replaces all of the above and is
//! returned verbatim.

use std::fmt;

use bson::{Bson, Document, doc};

use crate::page::Limit;

/// Direction tokens recognized by [`Sort`], matched case-insensitively.
pub const SORT_DIRECTIONS: [(&str, i32); 2] = [("asc", 1), ("desc", -1)];

/// How a fragment participates in the resolved filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Equality constraint collected under `$and`.
    And,
    /// Equality constraint collected under `$or`.
    Or,
    /// Membership constraint, `field: { $in: value }`.
    In,
    /// Negated equality constraint collected under `$nor`.
    Not,
}

impl Combinator {
    /// The query operator this combinator resolves to.
    pub fn operator(&self) -> &'static str {
        match self {
            Combinator::And => "$and",
            Combinator::Or => "$or",
            Combinator::In => "$in",
            Combinator::Not => "$nor",
        }
    }
}

/// A single field/value predicate contributed by a chained call.
///
/// The value is left opaque: scalars, arrays and nested documents are all accepted and
/// any type mismatch is reported by the database when the query runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The field name, used as-is.
    pub field: String,
    /// The value to compare against.
    pub value: Bson,
}

impl Fragment {
    pub fn new(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    fn to_document(&self) -> Document {
        Document::from_iter([(self.field.clone(), self.value.clone())])
    }
}

/// Ordered fragment sequences, one per [`Combinator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicates {
    and: Vec<Fragment>,
    or: Vec<Fragment>,
    within: Vec<Fragment>,
    not: Vec<Fragment>,
}

impl Predicates {
    /// Appends a fragment to the sequence for `combinator`.
    pub fn push(&mut self, combinator: Combinator, fragment: Fragment) {
        self.sequence_mut(combinator).push(fragment);
    }

    /// Returns the fragments recorded for `combinator` in insertion order.
    pub fn fragments(&self, combinator: Combinator) -> &[Fragment] {
        match combinator {
            Combinator::And => &self.and,
            Combinator::Or => &self.or,
            Combinator::In => &self.within,
            Combinator::Not => &self.not,
        }
    }

    /// Returns `true` when no fragment has been recorded.
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.within.is_empty() && self.not.is_empty()
    }

    /// Combines all fragments into a single filter document.
    pub fn resolve(&self) -> Document {
        let mut result = Document::new();

        for combinator in [Combinator::And, Combinator::Or] {
            let fragments = self.fragments(combinator);
            if !fragments.is_empty() {
                result.insert(
                    combinator.operator(),
                    fragments.iter().map(Fragment::to_document).collect::<Vec<_>>(),
                );
            }
        }

        for fragment in &self.within {
            result.insert(fragment.field.clone(), doc! { "$in": fragment.value.clone() });
        }

        if !self.not.is_empty() {
            result.insert(
                Combinator::Not.operator(),
                self.not.iter().map(Fragment::to_document).collect::<Vec<_>>(),
            );
        }

        result
    }

    fn sequence_mut(&mut self, combinator: Combinator) -> &mut Vec<Fragment> {
        match combinator {
            Combinator::And => &mut self.and,
            Combinator::Or => &mut self.or,
            Combinator::In => &mut self.within,
            Combinator::Not => &mut self.not,
        }
    }
}

/// A resolved, immutable filter document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// The empty filter, which matches every document.
    pub fn match_all() -> Self {
        Filter(Document::new())
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    /// Returns `true` when the filter places no constraint on documents.
    pub fn is_match_all(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        Filter(document)
    }
}

impl From<Filter> for Document {
    fn from(filter: Filter) -> Self {
        filter.0
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Sort directive for listing queries.
///
/// `direction` is a free-form token so it can be taken straight from request
/// parameters. Tokens not listed in [`SORT_DIRECTIONS`] sort ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by. An empty field disables sorting.
    pub field: String,
    /// The direction token, e.g. `"asc"` or `"DESC"`.
    pub direction: String,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: impl Into<String>) -> Self {
        Self { field: field.into(), direction: direction.into() }
    }

    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, "asc")
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, "desc")
    }

    /// Builds the sort specification, or `None` when the field is empty.
    ///
    /// The field name is lower-cased. A recognized direction token sets the field's
    /// order; anything else leaves it ascending.
    pub fn resolve(&self) -> Option<Document> {
        if self.field.is_empty() {
            return None;
        }

        let order = direction_code(&self.direction).unwrap_or(1);

        Some(Document::from_iter([(self.field.to_lowercase(), Bson::Int32(order))]))
    }
}

fn direction_code(token: &str) -> Option<i32> {
    SORT_DIRECTIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, code)| *code)
}

/// Accumulates predicates, a raw condition override, a limit and a sort.
///
/// All setters consume and return the builder so calls can be chained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    condition: Option<Document>,
    predicates: Predicates,
    limit: Limit,
    sort: Option<Sort>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint to the `$and` group.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.predicates.push(Combinator::And, Fragment::new(field, value));
        self
    }

    /// Adds an equality constraint to the `$or` group.
    pub fn or_where(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.predicates.push(Combinator::Or, Fragment::new(field, value));
        self
    }

    /// Requires `field` to match one of the values in `value`, which should be an array.
    pub fn in_where(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.predicates.push(Combinator::In, Fragment::new(field, value));
        self
    }

    /// Excludes documents where `field` equals `value`.
    pub fn not_where(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.predicates.push(Combinator::Not, Fragment::new(field, value));
        self
    }

    /// Sets a raw condition that replaces every accumulated predicate.
    pub fn condition(mut self, condition: Document) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    pub fn current_limit(&self) -> &Limit {
        &self.limit
    }

    pub fn current_sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Resolves the accumulated state into a filter.
    ///
    /// The raw condition wins whenever it is set; otherwise the fragments are combined.
    pub fn resolve(&self) -> Filter {
        match &self.condition {
            Some(condition) => Filter(condition.clone()),
            None => Filter(self.predicates.resolve()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_matches_all() {
        let filter = QueryBuilder::new().resolve();
        assert!(filter.is_match_all());
        assert_eq!(filter, Filter::match_all());
    }

    #[test]
    fn test_single_where_resolves_to_and_group() {
        let filter = QueryBuilder::new().where_eq("a", 1).resolve();
        assert_eq!(filter.into_document(), doc! { "$and": [{ "a": 1 }] });
    }

    #[test]
    fn test_single_in_where_sets_field_directly() {
        let filter = QueryBuilder::new().in_where("b", vec![1, 2]).resolve();
        assert_eq!(filter.into_document(), doc! { "b": { "$in": [1, 2] } });
    }

    #[test]
    fn test_and_and_or_groups_coexist_at_top_level() {
        let filter = QueryBuilder::new()
            .where_eq("status", "active")
            .or_where("role", "admin")
            .or_where("role", "owner")
            .resolve();

        assert_eq!(
            filter.into_document(),
            doc! {
                "$and": [{ "status": "active" }],
                "$or": [{ "role": "admin" }, { "role": "owner" }],
            }
        );
    }

    #[test]
    fn test_later_in_where_on_same_field_replaces_earlier() {
        let filter = QueryBuilder::new()
            .in_where("tier", vec!["gold"])
            .in_where("tier", vec!["silver", "bronze"])
            .resolve();

        assert_eq!(filter.into_document(), doc! { "tier": { "$in": ["silver", "bronze"] } });
    }

    #[test]
    fn test_not_fragments_resolve_to_nor_group() {
        // Behavior change: NOT fragments used to be dropped from the filter entirely.
        let filter = QueryBuilder::new()
            .where_eq("a", 1)
            .not_where("banned", true)
            .not_where("deleted", true)
            .resolve();

        assert_eq!(
            filter.into_document(),
            doc! {
                "$and": [{ "a": 1 }],
                "$nor": [{ "banned": true }, { "deleted": true }],
            }
        );
    }

    #[test]
    fn test_condition_overrides_fragments() {
        let filter = QueryBuilder::new()
            .where_eq("a", 1)
            .or_where("b", 2)
            .in_where("c", vec![3])
            .not_where("d", 4)
            .condition(doc! { "age": { "$gte": 18 } })
            .resolve();

        assert_eq!(filter.into_document(), doc! { "age": { "$gte": 18 } });
    }

    #[test]
    fn test_fragments_keep_insertion_order() {
        let builder = QueryBuilder::new()
            .where_eq("z", 1)
            .where_eq("a", 2)
            .where_eq("m", 3);

        let fields = builder
            .predicates()
            .fragments(Combinator::And)
            .iter()
            .map(|f| f.field.as_str())
            .collect::<Vec<_>>();

        assert_eq!(fields, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_sort_with_empty_field_is_absent() {
        assert_eq!(Sort::new("", "desc").resolve(), None);
    }

    #[test]
    fn test_sort_lowercases_field_and_defaults_ascending() {
        assert_eq!(Sort::new("Name", "").resolve(), Some(doc! { "name": 1 }));
    }

    #[test]
    fn test_sort_direction_overwrites_field_order() {
        assert_eq!(Sort::new("CreatedAt", "DESC").resolve(), Some(doc! { "createdat": -1 }));
        assert_eq!(Sort::asc("name").resolve(), Some(doc! { "name": 1 }));
        assert_eq!(Sort::desc("name").resolve(), Some(doc! { "name": -1 }));
    }

    #[test]
    fn test_sort_unknown_direction_stays_ascending() {
        assert_eq!(Sort::new("name", "sideways").resolve(), Some(doc! { "name": 1 }));
    }
}
