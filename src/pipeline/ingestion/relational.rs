use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::{Table, Value};

/// File-backed SQLite store rebuilt from a SQL script on every open.
pub struct ScriptStore {
    conn: Connection,
    db_path: PathBuf,
}

impl ScriptStore {
    /// Deletes any store at `db_path` (and its journal side files) and opens a fresh one.
    pub fn create_fresh<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let stale = PathBuf::from(format!("{}{}", db_path.display(), suffix));
            match fs::remove_file(&stale) {
                Ok(()) => debug!("ScriptStore: removed stale {}", stale.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        let conn = Connection::open(&db_path)?;
        Ok(Self { conn, db_path })
    }

    /// Runs every statement of the script at `script_path`, in file order.
    pub fn execute_script(&self, script_path: &Path) -> Result<()> {
        let script =
            fs::read_to_string(script_path).map_err(|e| PipelineError::from_io(script_path, e))?;
        self.conn
            .execute_batch(&script)
            .map_err(|source| PipelineError::Script { path: script_path.to_path_buf(), source })?;
        debug!(
            "ScriptStore: executed {} bytes of SQL into {}",
            script.len(),
            self.db_path.display()
        );
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
        )?;
        let mut rows = stmt.query(params![table])?;
        let exists = rows.next()?.is_some();
        Ok(exists)
    }

    /// All rows of `table`, with column names from the result set.
    pub fn read_table(&self, table: &str) -> Result<Table> {
        let sql = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let mut out = Table::new(columns);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(match row.get_ref(i)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::Integer(v),
                    ValueRef::Real(v) => Value::Float(v),
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        Value::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                });
            }
            out.push_row(cells);
        }
        Ok(out)
    }

    /// Closes the connection so the store file is complete on disk.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| PipelineError::Sqlite(e))
    }
}

/// Rebuilds the store at `db_path` from `script_path` and extracts `table`.
pub fn load_sql_table(script_path: &Path, db_path: &Path, table: &str) -> Result<Table> {
    if !script_path.exists() {
        return Err(PipelineError::MissingInput { path: script_path.to_path_buf() });
    }

    let store = ScriptStore::create_fresh(db_path)?;
    store.execute_script(script_path)?;
    if !store.table_exists(table)? {
        return Err(PipelineError::MissingTable {
            table: table.to_string(),
            path: script_path.to_path_buf(),
        });
    }
    let out = store.read_table(table)?;
    store.close()?;

    info!(
        "load_sql_table: {} rows, {} columns from table '{}' in {}",
        out.num_rows(),
        out.num_columns(),
        table,
        db_path.display()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "CREATE TABLE restaurants (restaurant_id INTEGER, name TEXT, rating REAL);\n\
                          INSERT INTO restaurants VALUES (9, 'Bistro', 4.5);\n\
                          INSERT INTO restaurants VALUES (10, NULL, NULL);\n";

    fn setup(script: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("restaurants.sql");
        fs::write(&script_path, script).unwrap();
        let db_path = dir.path().join("restaurants.db");
        (dir, script_path, db_path)
    }

    #[test]
    fn test_extracts_rows_with_sqlite_types() {
        let (_dir, script_path, db_path) = setup(SCRIPT);
        let table = load_sql_table(&script_path, &db_path, "restaurants").unwrap();

        assert_eq!(table.columns(), ["restaurant_id", "name", "rating"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.get(0, "restaurant_id"), Some(&Value::Integer(9)));
        assert_eq!(table.get(0, "rating"), Some(&Value::Float(4.5)));
        assert_eq!(table.get(1, "name"), Some(&Value::Null));
        assert!(db_path.exists(), "store file is left on disk");
    }

    #[test]
    fn test_rerun_replaces_the_store_instead_of_appending() {
        let (_dir, script_path, db_path) = setup(SCRIPT);
        load_sql_table(&script_path, &db_path, "restaurants").unwrap();
        // CREATE TABLE without IF NOT EXISTS would fail against the old store
        let second = load_sql_table(&script_path, &db_path, "restaurants").unwrap();
        assert_eq!(second.num_rows(), 2);
    }

    #[test]
    fn test_invalid_statement_is_a_script_error() {
        let (_dir, script_path, db_path) = setup("CREATE TABLE restaurants (;\n");
        let err = load_sql_table(&script_path, &db_path, "restaurants").unwrap_err();
        assert!(matches!(err, PipelineError::Script { .. }));
    }

    #[test]
    fn test_table_lookup_ignores_identifier_case() {
        let (_dir, script_path, db_path) = setup(
            "CREATE TABLE Restaurants (restaurant_id INTEGER, name TEXT);\n\
             INSERT INTO Restaurants VALUES (9, 'Bistro');\n",
        );
        let table = load_sql_table(&script_path, &db_path, "restaurants").unwrap();
        assert_eq!(table.columns(), ["restaurant_id", "name"]);
        assert_eq!(table.get(0, "name"), Some(&Value::Text("Bistro".to_string())));
    }

    #[test]
    fn test_absent_table_is_reported_by_name() {
        let (_dir, script_path, db_path) = setup("CREATE TABLE vendors (id INTEGER);\n");
        let err = load_sql_table(&script_path, &db_path, "restaurants").unwrap_err();
        match err {
            PipelineError::MissingTable { table, .. } => assert_eq!(table, "restaurants"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_script_leaves_existing_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("restaurants.db");
        fs::write(&db_path, b"old").unwrap();
        let err = load_sql_table(&dir.path().join("restaurants.sql"), &db_path, "restaurants")
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
        assert!(db_path.exists());
    }
}
