//! Record loader for JSON-shaped exports.
//!
//! Upstream exports arrive as a JSON array, as newline-delimited objects, or
//! as one nested document. The loader tries an ordered list of parsers and
//! keeps the first table a parser accepts. The array tier also refuses a
//! table with no columns, so an empty array falls through to later tiers.

use anyhow::{anyhow, bail, Context};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::FLATTEN_SEPARATOR;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::table::{Table, Value};

/// One interpretation of a JSON-shaped file.
pub trait RecordParser {
    /// Stable name used in logs, metrics and error reports.
    fn name(&self) -> &'static str;
    fn parse(&self, text: &str) -> anyhow::Result<Table>;
}

/// Tier 1: the whole file is one array of objects, yielding at least one column.
pub struct RecordArrayParser;

impl RecordParser for RecordArrayParser {
    fn name(&self) -> &'static str {
        "json_array"
    }

    fn parse(&self, text: &str) -> anyhow::Result<Table> {
        let doc: Json = serde_json::from_str(text)?;
        let items = doc
            .as_array()
            .ok_or_else(|| anyhow!("top-level value is not an array"))?;
        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .ok_or_else(|| anyhow!("element {} is not an object", i))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let table = table_from_objects(records.into_iter().map(|obj| obj.iter()));
        if table.num_columns() == 0 {
            bail!("parsed table has no columns");
        }
        Ok(table)
    }
}

/// Tier 2: one JSON object per non-blank line.
pub struct JsonLinesParser;

impl RecordParser for JsonLinesParser {
    fn name(&self) -> &'static str {
        "json_lines"
    }

    fn parse(&self, text: &str) -> anyhow::Result<Table> {
        let mut records: Vec<Map<String, Json>> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Json = serde_json::from_str(line)
                .with_context(|| format!("line {}", lineno + 1))?;
            match value {
                Json::Object(obj) => records.push(obj),
                _ => bail!("line {} is not a JSON object", lineno + 1),
            }
        }
        if records.is_empty() {
            bail!("no records found");
        }
        Ok(table_from_objects(records.iter().map(|obj| obj.iter())))
    }
}

/// Tier 3: one arbitrary document, nested keys flattened into compound names.
pub struct NestedDocumentParser;

impl RecordParser for NestedDocumentParser {
    fn name(&self) -> &'static str {
        "nested_document"
    }

    fn parse(&self, text: &str) -> anyhow::Result<Table> {
        let doc: Json = serde_json::from_str(text)?;
        let flattened: Vec<Vec<(String, Json)>> = match &doc {
            Json::Object(obj) => vec![flatten_object(obj)],
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Json::Object(obj) => Ok(flatten_object(obj)),
                    _ => Err(anyhow!("element {} is not an object", i)),
                })
                .collect::<anyhow::Result<_>>()?,
            other => bail!("cannot flatten a top-level {}", json_kind(other)),
        };
        Ok(table_from_objects(
            flattened
                .iter()
                .map(|pairs| pairs.iter().map(|(k, v)| (k, v))),
        ))
    }
}

/// The tiers in priority order.
pub fn default_parsers() -> Vec<Box<dyn RecordParser>> {
    vec![
        Box::new(RecordArrayParser),
        Box::new(JsonLinesParser),
        Box::new(NestedDocumentParser),
    ]
}

/// Table plus the name of the tier that produced it.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub table: Table,
    pub tier: &'static str,
}

/// Reads `path` and tries each tier of [`default_parsers`] in order.
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    load_records_with(path, &default_parsers())
}

/// Tries `parsers` in order. A tier is skipped when it errors; the first
/// table returned wins.
pub fn load_records_with(path: &Path, parsers: &[Box<dyn RecordParser>]) -> Result<LoadedRecords> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::from_io(path, e))?;
    let mut attempts: Vec<(String, String)> = Vec::new();

    for parser in parsers {
        let tier = parser.name();
        metrics::loaders::tier_attempt(tier);
        debug!("load_records: trying {} on {}", tier, path.display());

        let failure = match parser.parse(&text) {
            Ok(table) => {
                info!(
                    "load_records: {} parsed {} rows, {} columns from {}",
                    tier,
                    table.num_rows(),
                    table.num_columns(),
                    path.display()
                );
                return Ok(LoadedRecords { table, tier });
            }
            Err(e) => format!("{:#}", e),
        };

        metrics::loaders::tier_failure(tier);
        warn!("load_records: {} rejected {}: {}", tier, path.display(), failure);
        attempts.push((tier.to_string(), failure));
    }

    Err(PipelineError::RecordFormat { path: path.to_path_buf(), attempts })
}

/// Builds a table from key/value rows. Columns appear in order of first
/// appearance; absent keys are `Null`.
fn table_from_objects<'a, R, I>(records: R) -> Table
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = (&'a String, &'a Json)>,
{
    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<(usize, Value)>> = Vec::new();

    for record in records {
        let mut cells = Vec::new();
        for (key, value) in record {
            let idx = match columns.iter().position(|c| c == key) {
                Some(idx) => idx,
                None => {
                    columns.push(key.clone());
                    columns.len() - 1
                }
            };
            cells.push((idx, Value::from_json(value)));
        }
        rows.push(cells);
    }

    let width = columns.len();
    let rows = rows
        .into_iter()
        .map(|cells| {
            let mut row = vec![Value::Null; width];
            for (idx, value) in cells {
                row[idx] = value;
            }
            row
        })
        .collect();
    Table::from_rows(columns, rows)
}

/// Flattens nested objects into `parent.child` keys. Arrays and scalars are
/// leaves; an empty nested object contributes no key.
fn flatten_object(obj: &Map<String, Json>) -> Vec<(String, Json)> {
    let mut out = Vec::new();
    flatten_into(None, obj, &mut out);
    out
}

fn flatten_into(prefix: Option<&str>, obj: &Map<String, Json>, out: &mut Vec<(String, Json)>) {
    for (key, value) in obj {
        let name = match prefix {
            Some(p) => format!("{}{}{}", p, FLATTEN_SEPARATOR, key),
            None => key.clone(),
        };
        match value {
            Json::Object(inner) => flatten_into(Some(&name), inner, out),
            other => out.push((name, other.clone())),
        }
    }
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
