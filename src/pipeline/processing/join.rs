use std::collections::HashMap;
use tracing::info;

use crate::constants::{LEFT_SUFFIX, RIGHT_SUFFIX};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::table::{Source, Table, Value};

/// Counts reported by a left join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    /// Left rows with at least one matching right row
    pub matched: usize,
    /// Left rows kept with null right-hand columns
    pub unmatched: usize,
}

/// Left-preserving equi-join of `left` and `right` on the column `key`.
///
/// Output columns are every left column followed by every right column except
/// the key. Non-key names present on both sides get `_x` (left) and `_y`
/// (right) suffixes. Each left row yields one row per matching right row, in
/// right-table order, or a single row with nulls when nothing matches. Keys
/// compare by [`Value::join_key`]; a null key matches nothing.
pub fn left_join(
    left: &Table,
    right: &Table,
    key: &'static str,
    left_source: Source,
    right_source: Source,
) -> Result<(Table, JoinStats)> {
    let left_key = left.column_index(key).ok_or_else(|| missing(left, left_source, key))?;
    let right_key = right.column_index(key).ok_or_else(|| missing(right, right_source, key))?;

    let right_kept: Vec<usize> = (0..right.num_columns()).filter(|&i| i != right_key).collect();
    let columns = joined_columns(left, right, right_key, &right_kept);

    // key -> right row positions, in table order
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (pos, row) in right.rows().iter().enumerate() {
        if let Some(k) = row[right_key].join_key() {
            index.entry(k).or_default().push(pos);
        }
    }

    let mut out = Table::new(columns);
    let mut stats = JoinStats::default();
    for row in left.rows() {
        let matches = row[left_key]
            .join_key()
            .and_then(|k| index.get(&k))
            .filter(|positions| !positions.is_empty());

        match matches {
            Some(positions) => {
                stats.matched += 1;
                for &pos in positions {
                    let right_row = &right.rows()[pos];
                    let mut joined = row.clone();
                    joined.extend(right_kept.iter().map(|&i| right_row[i].clone()));
                    out.push_row(joined);
                }
            }
            None => {
                stats.unmatched += 1;
                let mut joined = row.clone();
                joined.extend(std::iter::repeat(Value::Null).take(right_kept.len()));
                out.push_row(joined);
            }
        }
    }

    metrics::join::rows(key, stats.matched, stats.unmatched);
    info!(
        "left_join on {}: {} rows out ({} matched, {} unmatched)",
        key,
        out.num_rows(),
        stats.matched,
        stats.unmatched
    );
    Ok((out, stats))
}

fn missing(table: &Table, source: Source, key: &str) -> PipelineError {
    PipelineError::MissingJoinKey {
        source_name: source,
        key: key.to_string(),
        found: table.columns().to_vec(),
    }
}

fn joined_columns(left: &Table, right: &Table, right_key: usize, right_kept: &[usize]) -> Vec<String> {
    let right_key_name = &right.columns()[right_key];
    let right_names: Vec<&String> = right_kept.iter().map(|&i| &right.columns()[i]).collect();

    let mut columns: Vec<String> = Vec::with_capacity(left.num_columns() + right_names.len());
    for name in left.columns() {
        if name == right_key_name || !right_names.contains(&name) {
            columns.push(name.clone());
            continue;
        }
        let mut candidate = format!("{}{}", name, LEFT_SUFFIX);
        while left.has_column(&candidate)
            || right_names.iter().any(|r| **r == candidate)
            || columns.contains(&candidate)
        {
            candidate.push_str(LEFT_SUFFIX);
        }
        columns.push(candidate);
    }

    for name in right_names {
        let mut candidate = if left.has_column(name) {
            format!("{}{}", name, RIGHT_SUFFIX)
        } else {
            name.clone()
        };
        // A suffixed name can still collide with an existing column
        while columns.contains(&candidate) {
            candidate.push_str(RIGHT_SUFFIX);
        }
        columns.push(candidate);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::USER_ID;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(columns.iter().map(|s| s.to_string()).collect(), rows)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_keeps_every_left_row_and_null_fills_misses() {
        let orders = table(
            &["order_id", "user_id"],
            vec![vec![text("1"), text("5")], vec![text("2"), text("99")], vec![text("3"), Value::Null]],
        );
        let users = table(&["user_id", "city"], vec![vec![Value::Integer(5), text("Oslo")]]);

        let (out, stats) = left_join(&orders, &users, USER_ID, Source::Orders, Source::Users).unwrap();
        assert_eq!(out.columns(), ["order_id", "user_id", "city"]);
        assert_eq!(out.num_rows(), 3);
        assert_eq!(out.get(0, "city"), Some(&text("Oslo")));
        assert_eq!(out.get(1, "city"), Some(&Value::Null));
        assert_eq!(out.get(2, "city"), Some(&Value::Null));
        assert_eq!(stats, JoinStats { matched: 1, unmatched: 2 });
    }

    #[test]
    fn test_overlapping_columns_get_x_and_y_suffixes() {
        let left = table(&["user_id", "name"], vec![vec![text("5"), text("Ann")]]);
        let right = table(&["user_id", "name"], vec![vec![text("5"), text("Bistro")]]);

        let (out, _) = left_join(&left, &right, USER_ID, Source::Users, Source::Restaurants).unwrap();
        assert_eq!(out.columns(), ["user_id", "name_x", "name_y"]);
        assert_eq!(out.rows()[0], vec![text("5"), text("Ann"), text("Bistro")]);
    }

    #[test]
    fn test_suffixing_repeats_until_unique() {
        let left = table(&["user_id", "name", "name_y"], vec![vec![text("5"), text("a"), text("b")]]);
        let right = table(&["user_id", "name"], vec![vec![text("5"), text("c")]]);

        let (out, _) = left_join(&left, &right, USER_ID, Source::Orders, Source::Users).unwrap();
        assert_eq!(out.columns(), ["user_id", "name_x", "name_y", "name_y_y"]);
    }

    #[test]
    fn test_left_suffix_skips_names_the_left_already_has() {
        let left = table(
            &["user_id", "name", "name_x"],
            vec![vec![text("5"), text("Ann"), text("legacy")]],
        );
        let right = table(&["user_id", "name"], vec![vec![text("5"), text("Bistro")]]);

        let (out, _) = left_join(&left, &right, USER_ID, Source::Orders, Source::Users).unwrap();
        assert_eq!(out.columns(), ["user_id", "name_x_x", "name_x", "name_y"]);
        assert_eq!(out.get(0, "name_x_x"), Some(&text("Ann")));
        assert_eq!(out.get(0, "name_x"), Some(&text("legacy")));
        assert_eq!(out.get(0, "name_y"), Some(&text("Bistro")));
    }

    #[test]
    fn test_duplicate_right_keys_fan_out_in_right_order() {
        let left = table(&["user_id"], vec![vec![text("1")]]);
        let right = table(
            &["user_id", "tag"],
            vec![vec![text("1"), text("a")], vec![text("1"), text("b")]],
        );

        let (out, stats) = left_join(&left, &right, USER_ID, Source::Orders, Source::Users).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.get(1, "tag"), Some(&text("b")));
        assert_eq!(stats.matched, 1);
    }

    #[test]
    fn test_missing_key_is_reported_before_joining() {
        let left = table(&["user_id"], vec![]);
        let right = table(&["id"], vec![]);
        let err = left_join(&left, &right, USER_ID, Source::Orders, Source::Users).unwrap_err();
        assert!(matches!(err, PipelineError::MissingJoinKey { source_name: Source::Users, .. }));
    }
}
