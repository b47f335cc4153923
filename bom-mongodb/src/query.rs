//! Translation of backend find specs into MongoDB find options.

use mongodb::options::FindOptions;

use bom_core::backend::FindSpec;


/// Converts a [`FindSpec`] into the driver's [`FindOptions`].
///
/// Unset parts of the spec leave the corresponding option unset, so the server applies
/// its own defaults (no skip, no limit, natural order).
pub(crate) fn find_options(spec: FindSpec) -> FindOptions {
    let mut options = FindOptions::default();

    if let Some(skip) = spec.skip {
        options.skip = Some(skip);
    }
    if let Some(limit) = spec.limit {
        options.limit = Some(limit);
    }
    if let Some(sort) = spec.sort {
        options.sort = Some(sort);
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_empty_spec_leaves_options_unset() {
        let options = find_options(FindSpec::default());

        assert_eq!(options.skip, None);
        assert_eq!(options.limit, None);
        assert_eq!(options.sort, None);
    }

    #[test]
    fn test_spec_maps_to_options() {
        let options = find_options(FindSpec {
            skip: Some(20),
            limit: Some(10),
            sort: Some(doc! { "createdat": -1 }),
        });

        assert_eq!(options.skip, Some(20));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.sort, Some(doc! { "createdat": -1 }));
    }
}
