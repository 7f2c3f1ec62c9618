use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::constants::{ORDER_ID, RESTAURANT_ID, USER_ID};
use crate::table::Source;

/// Synonym spellings shared by every source, checked after lower-casing.
const SHARED_SYNONYMS: &[(&str, &str)] = &[
    ("userid", USER_ID),
    ("user id", USER_ID),
    ("restaurantid", RESTAURANT_ID),
    ("restaurant id", RESTAURANT_ID),
    ("orderid", ORDER_ID),
    ("order id", ORDER_ID),
];

/// Fixed, source-specific rename table for column identifiers
#[derive(Debug, Clone)]
pub struct RenameTable {
    renames: HashMap<&'static str, &'static str>,
}

impl RenameTable {
    fn for_source(source: Source) -> Self {
        let mut renames: HashMap<&'static str, &'static str> =
            SHARED_SYNONYMS.iter().copied().collect();
        // A bare `id` is the source's own primary key
        renames.insert("id", primary_key(source));
        Self { renames }
    }

    /// Canonical name for an already lower-cased identifier, if it is a known synonym.
    pub fn canonical(&self, lowered: &str) -> Option<&'static str> {
        self.renames.get(lowered).copied()
    }
}

/// Key identifying rows of `source`.
pub fn primary_key(source: Source) -> &'static str {
    match source {
        Source::Orders => ORDER_ID,
        Source::Users => USER_ID,
        Source::Restaurants => RESTAURANT_ID,
    }
}

static REGISTRY: Lazy<HashMap<Source, RenameTable>> = Lazy::new(|| {
    Source::ALL
        .into_iter()
        .map(|source| (source, RenameTable::for_source(source)))
        .collect()
});

/// Rename table for `source`.
pub fn rename_table(source: Source) -> &'static RenameTable {
    // Every Source variant is inserted when the registry is built
    &REGISTRY[&source]
}
