//! Batch pipeline that merges an orders CSV, a users JSON export and a
//! restaurants SQL dump into a single flat CSV dataset.

pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod table;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunSummary};
pub use table::{Source, Table, Value};
