/// File name constants for the pipeline's fixed inputs and outputs.
/// These are resolved relative to the configured data directory.

pub const ORDERS_FILE: &str = "orders.csv";
pub const USERS_FILE: &str = "users.json";
pub const RESTAURANTS_SQL_FILE: &str = "restaurants.sql";

pub const RESTAURANTS_DB_FILE: &str = "restaurants.db";
pub const OUTPUT_FILE: &str = "final_food_delivery_dataset.csv";

/// Table the SQL script must populate
pub const RESTAURANTS_TABLE: &str = "restaurants";

// Canonical join keys
pub const ORDER_ID: &str = "order_id";
pub const USER_ID: &str = "user_id";
pub const RESTAURANT_ID: &str = "restaurant_id";

// Suffixes for non-key columns present on both sides of a join
pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

/// Separator for compound column names produced by record flattening
pub const FLATTEN_SEPARATOR: &str = ".";

/// Optional configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "pipeline.toml";
