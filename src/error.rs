use std::path::PathBuf;
use thiserror::Error;

use crate::table::Source;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Required input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read {} as records; tried {}", path.display(), describe_attempts(attempts))]
    RecordFormat {
        path: PathBuf,
        /// (tier name, failure) for every tier, in the order they were tried
        attempts: Vec<(String, String)>,
    },

    #[error("SQL script {} failed to execute: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Table '{table}' does not exist after running {}", path.display())]
    MissingTable { table: String, path: PathBuf },

    #[error("{source_name} must contain a '{key}' column (found: {})", found.join(", "))]
    MissingJoinKey {
        source_name: Source,
        key: String,
        found: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

fn describe_attempts(attempts: &[(String, String)]) -> String {
    attempts
        .iter()
        .map(|(tier, err)| format!("{tier} ({err})"))
        .collect::<Vec<_>>()
        .join(", then ")
}

impl PipelineError {
    /// Maps a `NotFound` I/O error on `path` to `MissingInput`.
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingInput { path: path.to_path_buf() }
        } else {
            PipelineError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
