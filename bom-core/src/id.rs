//! Object identifier parsing.
//!
//! [`parse_object_id`] and [`parse_object_ids`] report malformed input as
//! [`BomError::InvalidId`]. The `to_*` variants are best-effort: they never fail, but
//! every input they discard is logged at `warn` level.

use bson::oid::ObjectId;
use tracing::warn;

use crate::error::{BomError, BomResult};

/// The all-zero identifier returned by [`to_object_id`] for unparseable input.
pub const NIL_OBJECT_ID: ObjectId = ObjectId::from_bytes([0; 12]);

/// Parses a 24-character hex string into an [`ObjectId`].
pub fn parse_object_id(id: &str) -> BomResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| BomError::InvalidId(id.to_string(), e.to_string()))
}

/// Parses every string in `ids`, failing on the first malformed entry.
pub fn parse_object_ids<S>(ids: &[S]) -> BomResult<Vec<ObjectId>>
where
    S: AsRef<str>,
{
    ids.iter()
        .map(|id| parse_object_id(id.as_ref()))
        .collect()
}

/// Parses `id`, returning [`NIL_OBJECT_ID`] when it is malformed.
pub fn to_object_id(id: &str) -> ObjectId {
    parse_object_id(id).unwrap_or_else(|err| {
        warn!(error = %err, "substituting nil object id");
        NIL_OBJECT_ID
    })
}

/// Parses every string in `ids`, skipping malformed entries.
pub fn to_object_ids<S>(ids: &[S]) -> Vec<ObjectId>
where
    S: AsRef<str>,
{
    ids.iter()
        .filter_map(|id| match parse_object_id(id.as_ref()) {
            Ok(oid) => Some(oid),
            Err(err) => {
                warn!(error = %err, "skipping malformed object id");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn test_parse_valid_id() {
        assert_eq!(parse_object_id(VALID).unwrap().to_hex(), VALID);
    }

    #[test]
    fn test_parse_invalid_id_is_an_error() {
        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(BomError::InvalidId(id, _)) if id == "not-an-id"
        ));
    }

    #[test]
    fn test_best_effort_yields_nil_id() {
        assert_eq!(to_object_id("zzz"), NIL_OBJECT_ID);
        assert_eq!(to_object_id("").to_hex(), "000000000000000000000000");
        assert_eq!(to_object_id(VALID).to_hex(), VALID);
    }

    #[test]
    fn test_batch_forms() {
        let ids = ["bogus", VALID, "507f191e810c19729de860ea"];

        let parsed = to_object_ids(&ids);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].to_hex(), VALID);

        assert!(parse_object_ids(&ids).is_err());
        assert_eq!(parse_object_ids(&ids[1..]).unwrap(), parsed);
    }
}
