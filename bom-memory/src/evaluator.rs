//! Filter document evaluation for in-memory collections.
//!
//! This module matches BSON documents against the filter documents the query builder
//! resolves, covering the logical groups (`$and`, `$or`, `$nor`), implicit equality and
//! the field operators `$eq`, `$ne`, `$in`, `$nin`, `$gt`, `$gte`, `$lt`, `$lte` and
//! `$exists`.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use bom_core::error::{BomError, BomResult};


/// Type-erased, comparable representation of BSON values.
///
/// Integers are widened to `i64` and compared exactly. Only a comparison against a
/// `Double` falls back to `f64`, so `Int32(1)` still equals `Double(1.0)`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (int32 and int64 widened to i64)
    Int(i64),
    /// Floating point value
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// ObjectId value
    ObjectId(ObjectId),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64) == *b,
            (Comparable::Number(a), Comparable::Int(b)) => *a == (*b as f64),
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Comparable<'_> {
    /// Position in the cross-type sort order: null (and missing), numbers, strings,
    /// documents, arrays, object ids, booleans, dates.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Int(_) | Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total order used for sorting. Values of different types are ordered by type.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

/// Looks up a possibly dotted field path such as `address.city`.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}


pub(crate) struct FilterEvaluator<'a> {
    document: &'a Document,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every top-level clause of `filter`.
    pub fn matches(&self, filter: &Document) -> BomResult<bool> {
        for (key, value) in filter {
            if !self.clause(key, value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> BomResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if FilterEvaluator::new(document).matches(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn clause(&self, key: &str, value: &Bson) -> BomResult<bool> {
        match key {
            "$and" => {
                for sub in Self::sub_filters(key, value)? {
                    if !self.matches(sub)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            "$or" => {
                for sub in Self::sub_filters(key, value)? {
                    if self.matches(sub)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            },
            "$nor" => {
                for sub in Self::sub_filters(key, value)? {
                    if self.matches(sub)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            operator if operator.starts_with('$') => Err(BomError::InvalidDocument(
                format!("unsupported top-level operator {operator}"),
            )),
            field => {
                let field_value = lookup(self.document, field);

                match value {
                    Bson::Document(ops) if is_operator_document(ops) => {
                        for (op, operand) in ops {
                            if !Self::operator(field_value, op, operand)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    },
                    _ => Ok(Self::equals(field_value, value)),
                }
            },
        }
    }

    fn sub_filters<'f>(key: &str, value: &'f Bson) -> BomResult<Vec<&'f Document>> {
        match value {
            Bson::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_document().ok_or_else(|| {
                        BomError::InvalidDocument(format!("{key} entries must be documents"))
                    })
                })
                .collect(),
            _ => Err(BomError::InvalidDocument(format!("{key} requires an array"))),
        }
    }

    fn operator(field_value: Option<&Bson>, op: &str, operand: &Bson) -> BomResult<bool> {
        match op {
            "$eq" => Ok(Self::equals(field_value, operand)),
            "$ne" => Ok(!Self::equals(field_value, operand)),
            "$in" => Ok(Self::any_equals(field_value, Self::operand_array(op, operand)?)),
            "$nin" => Ok(!Self::any_equals(field_value, Self::operand_array(op, operand)?)),
            "$exists" => Ok(field_value.is_some() == is_truthy(operand)),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                let Some(field_value) = field_value else {
                    return Ok(false);
                };

                match Comparable::from(field_value).partial_cmp(&Comparable::from(operand)) {
                    Some(ordering) => Ok(match op {
                        "$gt" => ordering == Ordering::Greater,
                        "$gte" => ordering != Ordering::Less,
                        "$lt" => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }),
                    None => Ok(false),
                }
            },
            other => Err(BomError::InvalidDocument(format!("unsupported operator {other}"))),
        }
    }

    fn operand_array<'o>(op: &str, operand: &'o Bson) -> BomResult<&'o [Bson]> {
        match operand {
            Bson::Array(values) => Ok(values),
            _ => Err(BomError::InvalidDocument(format!("{op} requires an array"))),
        }
    }

    /// Equality with array semantics: an array field matches if it equals the value
    /// outright or contains it. A missing field only equals `null`.
    fn equals(field_value: Option<&Bson>, value: &Bson) -> bool {
        let expected = Comparable::from(value);

        match field_value {
            None => expected == Comparable::Null,
            Some(field_value) => {
                Comparable::from(field_value) == expected || Self::contains(field_value, &expected)
            },
        }
    }

    fn contains(array: &Bson, expected: &Comparable<'_>) -> bool {
        array
            .as_array()
            .map(|items| items.iter().any(|item| &Comparable::from(item) == expected))
            .unwrap_or(false)
    }

    fn any_equals(field_value: Option<&Bson>, values: &[Bson]) -> bool {
        values
            .iter()
            .any(|value| Self::equals(field_value, value))
    }
}

/// Truthiness of an operator flag: `false`, `null` and numeric zero are false.
fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|key| key.starts_with('$'))
}

/// Orders two documents by a sort specification such as `{ "age": -1, "name": 1 }`.
pub(crate) fn compare_by(sort: &Document, left: &Document, right: &Document) -> Ordering {
    for (field, direction) in sort {
        let a = lookup(left, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let b = lookup(right, field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = a.sort_cmp(&b);
        let ordering = match direction {
            Bson::Int32(d) if *d < 0 => ordering.reverse(),
            Bson::Int64(d) if *d < 0 => ordering.reverse(),
            Bson::Double(d) if *d < 0.0 => ordering.reverse(),
            _ => ordering,
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn matches(document: &Document, filter: Document) -> bool {
        FilterEvaluator::new(document).matches(&filter).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches(&doc! { "a": 1 }, doc! {}));
    }

    #[test]
    fn test_implicit_equality_normalizes_numbers() {
        let document = doc! { "a": 1_i64, "name": "Alice" };
        assert!(matches(&document, doc! { "a": 1 }));
        assert!(matches(&document, doc! { "a": 1.0 }));
        assert!(!matches(&document, doc! { "a": 2 }));
        assert!(!matches(&document, doc! { "missing": 1 }));
        assert!(matches(&document, doc! { "missing": null }));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let document = doc! { "n": 9_007_199_254_740_992_i64 };
        assert!(matches(&document, doc! { "n": 9_007_199_254_740_992_i64 }));
        assert!(!matches(&document, doc! { "n": 9_007_199_254_740_993_i64 }));
        assert!(!matches(&document, doc! { "n": { "$in": [9_007_199_254_740_993_i64] } }));
        assert!(matches(&document, doc! { "n": { "$lt": 9_007_199_254_740_993_i64 } }));
        assert!(matches(&document, doc! { "n": 9_007_199_254_740_992.0 }));
    }

    #[test]
    fn test_exists_accepts_numeric_flags() {
        let document = doc! { "a": 1 };
        assert!(matches(&document, doc! { "a": { "$exists": 1 } }));
        assert!(!matches(&document, doc! { "a": { "$exists": 0 } }));
        assert!(matches(&document, doc! { "b": { "$exists": 0 } }));
        assert!(!matches(&document, doc! { "b": { "$exists": true } }));
    }

    #[test]
    fn test_array_field_contains_value() {
        let document = doc! { "tags": ["red", "blue"] };
        assert!(matches(&document, doc! { "tags": "red" }));
        assert!(matches(&document, doc! { "tags": ["red", "blue"] }));
        assert!(!matches(&document, doc! { "tags": "green" }));
    }

    #[test]
    fn test_logical_groups() {
        let document = doc! { "status": "active", "role": "admin", "banned": false };

        assert!(matches(&document, doc! { "$and": [{ "status": "active" }, { "role": "admin" }] }));
        assert!(matches(&document, doc! { "$or": [{ "role": "owner" }, { "role": "admin" }] }));
        assert!(!matches(&document, doc! { "$or": [{ "role": "owner" }] }));
        assert!(matches(&document, doc! { "$nor": [{ "banned": true }] }));
        assert!(!matches(&document, doc! { "$nor": [{ "banned": false }] }));
    }

    #[test]
    fn test_field_operators() {
        let document = doc! { "age": 30, "tier": "gold" };

        assert!(matches(&document, doc! { "tier": { "$in": ["gold", "silver"] } }));
        assert!(!matches(&document, doc! { "tier": { "$nin": ["gold"] } }));
        assert!(matches(&document, doc! { "age": { "$gte": 30, "$lt": 31 } }));
        assert!(!matches(&document, doc! { "age": { "$gt": 30 } }));
        assert!(matches(&document, doc! { "age": { "$ne": 29 } }));
        assert!(matches(&document, doc! { "nickname": { "$exists": false } }));
    }

    #[test]
    fn test_dotted_paths() {
        let document = doc! { "address": { "city": "Oslo" } };
        assert!(matches(&document, doc! { "address.city": "Oslo" }));
        assert!(!matches(&document, doc! { "address.zip": "0150" }));
    }

    #[test]
    fn test_unsupported_operator_is_an_error() {
        let document = doc! { "a": 1 };
        assert!(FilterEvaluator::new(&document).matches(&doc! { "$where": "true" }).is_err());
        assert!(FilterEvaluator::new(&document).matches(&doc! { "a": { "$regex": "x" } }).is_err());
        assert!(FilterEvaluator::new(&document).matches(&doc! { "a": { "$in": 1 } }).is_err());
    }

    #[test]
    fn test_compare_by_multiple_keys() {
        let a = doc! { "age": 30, "name": "b" };
        let b = doc! { "age": 30, "name": "a" };
        let c = doc! { "age": 40, "name": "c" };

        let sort = doc! { "age": -1, "name": 1 };
        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| compare_by(&sort, x, y));

        assert_eq!(docs, vec![c, b, a]);
    }

    #[test]
    fn test_compare_by_orders_across_types() {
        let missing = doc! { "name": "missing" };
        let null = doc! { "age": null };
        let number = doc! { "age": 5 };
        let text = doc! { "age": "five" };

        let mut docs = vec![text.clone(), number.clone(), missing.clone(), null.clone()];
        docs.sort_by(|x, y| compare_by(&doc! { "age": 1 }, x, y));
        assert_eq!(docs, vec![missing.clone(), null.clone(), number.clone(), text.clone()]);

        docs.sort_by(|x, y| compare_by(&doc! { "age": -1 }, x, y));
        assert_eq!(docs, vec![text, number, missing, null]);
    }
}
