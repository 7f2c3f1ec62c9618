use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};

use crate::config::Config;
use crate::constants::{RESTAURANTS_TABLE, RESTAURANT_ID, USER_ID};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::{load_csv, load_records, load_sql_table, LoadedRecords};
use crate::pipeline::processing::join::{left_join, JoinStats};
use crate::pipeline::processing::normalize::{normalize_columns, require_key};
use crate::pipeline::storage::csv_out::{file_sha256, write_csv};
use crate::table::{Source, Table};

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_file: PathBuf,
    pub store_file: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub users_tier: &'static str,
    pub user_matches: usize,
    pub restaurant_matches: usize,
    pub output_sha256: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Raw tables as loaded, before any renaming.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub orders: Table,
    pub users: Table,
    pub users_tier: &'static str,
    pub restaurants: Table,
}

/// The merged table and per-join stats.
#[derive(Debug, Clone)]
pub struct Merged {
    pub table: Table,
    pub users: JoinStats,
    pub restaurants: JoinStats,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads all three sources, merges them, and writes the output file.
    pub fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let timer = Instant::now();
        println!("\n========== FOOD DELIVERY DATA PIPELINE ==========");

        let sources = self.load_all()?;

        println!("\nStandardizing column names...");
        println!("\nMerging datasets...");
        let merged = merge(sources.orders, sources.users, sources.restaurants)?;

        let output_file = self.config.output_path();
        write_csv(&merged.table, &output_file)?;
        let output_sha256 = file_sha256(&output_file)?;

        let rows = merged.table.num_rows();
        metrics::run::completed(rows, timer.elapsed().as_secs_f64());
        info!(rows, output = %output_file.display(), "pipeline finished");

        Ok(RunSummary {
            output_file,
            store_file: self.config.store_path(),
            rows,
            columns: merged.table.columns().to_vec(),
            users_tier: sources.users_tier,
            user_matches: merged.users.matched,
            restaurant_matches: merged.restaurants.matched,
            output_sha256,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Runs the three loaders in order, printing each table's columns.
    pub fn load_all(&self) -> Result<LoadedSources> {
        let orders = self.load_orders()?;
        let users = self.load_users()?;
        let restaurants = self.load_restaurants()?;
        Ok(LoadedSources {
            orders,
            users: users.table,
            users_tier: users.tier,
            restaurants,
        })
    }

    pub fn load_orders(&self) -> Result<Table> {
        let _enter = info_span!("load", source = "orders").entered();
        let path = self.announce(Source::Orders);
        let table = load_csv(&path)?;
        self.report(Source::Orders, &table);
        Ok(table)
    }

    pub fn load_users(&self) -> Result<LoadedRecords> {
        let _enter = info_span!("load", source = "users").entered();
        let path = self.announce(Source::Users);
        let loaded = load_records(&path)?;
        println!("Users parsed as {}", loaded.tier);
        self.report(Source::Users, &loaded.table);
        Ok(loaded)
    }

    pub fn load_restaurants(&self) -> Result<Table> {
        let _enter = info_span!("load", source = "restaurants").entered();
        let path = self.announce(Source::Restaurants);
        let table = load_sql_table(&path, &self.config.store_path(), RESTAURANTS_TABLE)?;
        self.report(Source::Restaurants, &table);
        Ok(table)
    }

    /// Loads one source and applies its column normalization.
    pub fn inspect(&self, source: Source) -> Result<Table> {
        let table = match source {
            Source::Orders => self.load_orders()?,
            Source::Users => self.load_users()?.table,
            Source::Restaurants => self.load_restaurants()?,
        };
        let normalized = normalize_columns(table, source);
        println!("Normalized columns: {:?}", normalized.columns());
        Ok(normalized)
    }

    fn announce(&self, source: Source) -> PathBuf {
        println!("\nLoading {} ...", source.file_name());
        self.config.input_path(source.file_name())
    }

    fn report(&self, source: Source, table: &Table) {
        metrics::loaders::rows_loaded(source.as_str(), table.num_rows());
        println!("{} columns: {:?}", capitalize(source.as_str()), table.columns());
    }
}

/// Normalizes identifiers, checks join keys, and performs both left joins.
pub fn merge(orders: Table, users: Table, restaurants: Table) -> Result<Merged> {
    let orders = normalize_columns(orders, Source::Orders);
    let users = normalize_columns(users, Source::Users);
    let restaurants = normalize_columns(restaurants, Source::Restaurants);

    require_key(&users, Source::Users, USER_ID)?;
    require_key(&restaurants, Source::Restaurants, RESTAURANT_ID)?;
    require_key(&orders, Source::Orders, USER_ID)?;
    require_key(&orders, Source::Orders, RESTAURANT_ID)?;

    let (with_users, user_stats) = left_join(&orders, &users, USER_ID, Source::Orders, Source::Users)?;
    let (table, restaurant_stats) =
        left_join(&with_users, &restaurants, RESTAURANT_ID, Source::Orders, Source::Restaurants)?;

    Ok(Merged { table, users: user_stats, restaurants: restaurant_stats })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::table::Value;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(columns.iter().map(|s| s.to_string()).collect(), rows)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_merge_preserves_order_cardinality() {
        let orders = table(
            &["OrderID", "UserID", "RestaurantID"],
            vec![
                vec![text("1"), text("5"), text("9")],
                vec![text("2"), text("6"), text("9")],
                vec![text("3"), text("5"), text("10")],
            ],
        );
        let users = table(&["id", "name"], vec![vec![Value::Integer(5), text("Ann")]]);
        let restaurants = table(&["restaurant_id", "name"], vec![vec![Value::Integer(9), text("Bistro")]]);

        let merged = merge(orders, users, restaurants).unwrap();
        assert_eq!(merged.table.num_rows(), 3);
        assert_eq!(
            merged.table.columns(),
            ["order_id", "user_id", "restaurant_id", "name_x", "name_y"]
        );
        assert_eq!(merged.table.get(1, "name_x"), Some(&Value::Null));
        assert_eq!(merged.table.get(2, "name_y"), Some(&Value::Null));
        assert_eq!(merged.users, JoinStats { matched: 2, unmatched: 1 });
    }

    #[test]
    fn test_users_without_key_fail_before_joining() {
        let orders = table(&["user_id", "restaurant_id"], vec![]);
        let users = table(&["uid", "name"], vec![]);
        let restaurants = table(&["restaurant_id"], vec![]);

        let err = merge(orders, users, restaurants).unwrap_err();
        match err {
            PipelineError::MissingJoinKey { source_name, key, .. } => {
                assert_eq!(source_name, Source::Users);
                assert_eq!(key, USER_ID);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_restaurants_keyed_by_bare_id_still_join() {
        let orders = table(&["user_id", "restaurant_id"], vec![vec![text("1"), text("9")]]);
        let users = table(&["user_id"], vec![vec![text("1")]]);
        let restaurants = table(&["ID", "cuisine"], vec![vec![Value::Integer(9), text("Thai")]]);

        let merged = merge(orders, users, restaurants).unwrap();
        assert_eq!(merged.table.get(0, "cuisine"), Some(&text("Thai")));
    }

    #[test]
    fn test_capitalize_handles_empty() {
        assert_eq!(capitalize("users"), "Users");
        assert_eq!(capitalize(""), "");
    }
}
