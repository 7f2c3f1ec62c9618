//! Column identifier normalization.
//!
//! Identifiers are lower-cased, then known synonyms are mapped to canonical
//! join-key names using the source's rename table. A synonym is only renamed
//! when its canonical name is not already taken in the same table, so the
//! explicit canonical column always wins and normalizing twice changes nothing.

pub mod registry;

use std::collections::HashSet;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::table::{Source, Table};

pub use registry::{primary_key, rename_table, RenameTable};

/// New column list for `columns` under `source`'s rename table.
pub fn normalize_identifiers(columns: &[String], source: Source) -> Vec<String> {
    let renames = rename_table(source);
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    let mut taken: HashSet<String> = lowered.iter().cloned().collect();

    lowered
        .into_iter()
        .map(|name| match renames.canonical(&name) {
            Some(canonical) if !taken.contains(canonical) => {
                taken.insert(canonical.to_string());
                canonical.to_string()
            }
            _ => name,
        })
        .collect()
}

/// Returns `table` with normalized column identifiers; rows are untouched.
pub fn normalize_columns(table: Table, source: Source) -> Table {
    let columns = normalize_identifiers(table.columns(), source);
    debug!("normalize_columns: {} {:?} -> {:?}", source.as_str(), table.columns(), columns);
    table.with_columns(columns)
}

/// Fails with `MissingJoinKey` unless `table` has a column named `key`.
pub fn require_key(table: &Table, source: Source, key: &str) -> Result<()> {
    if table.has_column(key) {
        Ok(())
    } else {
        Err(PipelineError::MissingJoinKey {
            source_name: source,
            key: key.to_string(),
            found: table.columns().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{RESTAURANT_ID, USER_ID};

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lowercases_and_renames_synonyms() {
        let out = normalize_identifiers(
            &cols(&["OrderID", "UserID", "Restaurant ID", "Amount"]),
            Source::Orders,
        );
        assert_eq!(out, cols(&["order_id", "user_id", "restaurant_id", "amount"]));
    }

    #[test]
    fn test_generic_id_is_source_specific() {
        assert_eq!(normalize_identifiers(&cols(&["ID", "Name"]), Source::Users), cols(&["user_id", "name"]));
        assert_eq!(
            normalize_identifiers(&cols(&["id", "name"]), Source::Restaurants),
            cols(&["restaurant_id", "name"])
        );
    }

    #[test]
    fn test_existing_canonical_column_wins_over_synonym() {
        let out = normalize_identifiers(&cols(&["id", "user_id", "name"]), Source::Users);
        assert_eq!(out, cols(&["id", "user_id", "name"]));
    }

    #[test]
    fn test_first_synonym_claims_the_canonical_name() {
        let out = normalize_identifiers(&cols(&["UserId", "id"]), Source::Users);
        assert_eq!(out, cols(&["user_id", "id"]));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for source in Source::ALL {
            let input = cols(&["ID", "UserID", "user id", "RestaurantId", "Order ID", "Name", "profile.City"]);
            let once = normalize_identifiers(&input, source);
            let twice = normalize_identifiers(&once, source);
            assert_eq!(once, twice, "{source:?}");
        }
    }

    #[test]
    fn test_normalize_columns_keeps_rows() {
        let table = Table::from_rows(cols(&["ID"]), vec![vec![crate::table::Value::Integer(5)]]);
        let out = normalize_columns(table, Source::Users);
        assert_eq!(out.columns(), [USER_ID]);
        assert_eq!(out.num_rows(), 1);
    }

    #[test]
    fn test_missing_key_names_the_source_and_columns() {
        let table = Table::new(cols(&["name", "city"]));
        let err = require_key(&table, Source::Restaurants, RESTAURANT_ID).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("restaurants.sql must contain a 'restaurant_id' column"));
        assert!(message.contains("name, city"));
        assert!(require_key(&Table::new(cols(&[USER_ID])), Source::Users, USER_ID).is_ok());
    }
}
