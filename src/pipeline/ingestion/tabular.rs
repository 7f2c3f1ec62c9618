use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::{Table, Value};

/// Reads a comma-delimited file with a header row.
///
/// Column names are taken verbatim from the header. Cells stay as text; an
/// empty field becomes `Null`. Rows whose field count differs from the header
/// fail with a CSV error.
pub fn load_csv(path: &Path) -> Result<Table> {
    debug!("load_csv: opening {}", path.display());
    let file = File::open(path).map_err(|e| PipelineError::from_io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(file);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(columns);

    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::Text(field.to_string())
                }
            })
            .collect();
        table.push_row(row);
    }

    info!(
        "load_csv: {} rows, {} columns from {}",
        table.num_rows(),
        table.num_columns(),
        path.display()
    );
    Ok(table)
}
