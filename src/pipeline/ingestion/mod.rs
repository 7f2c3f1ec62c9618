// Pipeline ingestion: one loader per input format

pub mod records;
pub mod relational;
pub mod tabular;

pub use records::{load_records, LoadedRecords, RecordParser};
pub use relational::{load_sql_table, ScriptStore};
pub use tabular::load_csv;
