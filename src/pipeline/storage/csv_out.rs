use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::table::Table;

/// Writes `table` as comma-delimited text with a header row and no row index,
/// replacing any existing file at `path`.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_field()))?;
    }
    writer.flush()?;

    info!("write_csv: {} rows written to {}", table.num_rows(), path.display());
    Ok(())
}

/// Hex SHA-256 of the file at `path`.
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
