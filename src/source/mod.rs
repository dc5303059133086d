//! Data sources for dataset-building tasks.
//!
//! A [`DataSource`] is chosen explicitly by the caller and placed in the run
//! [`Env`](crate::runner::Env). Each variant knows how to produce a [`Table`].

pub mod csv;
pub mod table;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use self::csv::{parse_csv, read_csv};
pub use self::table::Table;
use crate::error::{Result, StepgateError};

/// Access to tables in an external database.
///
/// Implementations own connection handling; the engine never retries.
pub trait TableReader: Send + Sync {
    /// Names of the tables that can be read.
    fn table_names(&self) -> Vec<String>;

    /// Read every row of a table.
    fn read_table(&self, name: &str) -> anyhow::Result<Table>;
}

/// Where a dataset comes from.
#[derive(Clone)]
pub enum DataSource {
    /// A table read through a database collaborator.
    Database {
        reader: Arc<dyn TableReader>,
        table: Option<String>,
    },
    /// A CSV file with a header row.
    Csv(PathBuf),
    /// A table built by the caller.
    InMemory(Table),
}

impl DataSource {
    /// Load the table this source points at.
    ///
    /// A database source without a table name, or naming a table the reader
    /// does not know, yields an empty table.
    pub fn load(&self) -> Result<Table> {
        match self {
            DataSource::Database { reader, table } => {
                let Some(name) = table.as_deref().filter(|n| !n.is_empty()) else {
                    tracing::debug!("no table name given, using empty dataset");
                    return Ok(Table::empty());
                };
                if !reader.table_names().iter().any(|t| t == name) {
                    tracing::debug!(table = name, "unknown table, using empty dataset");
                    return Ok(Table::empty());
                }
                reader
                    .read_table(name)
                    .map_err(|e| StepgateError::DataSource {
                        message: format!("reading table '{}': {:#}", name, e),
                    })
            }
            DataSource::Csv(path) => read_csv(path),
            DataSource::InMemory(table) => Ok(table.clone()),
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSource::Database { .. } => "database",
            DataSource::Csv(_) => "csv",
            DataSource::InMemory(_) => "in-memory",
        }
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Database { table, .. } => {
                f.debug_struct("Database").field("table", table).finish()
            }
            DataSource::Csv(path) => f.debug_tuple("Csv").field(path).finish(),
            DataSource::InMemory(table) => f
                .debug_struct("InMemory")
                .field("rows", &table.row_count())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FakeDb;

    impl TableReader for FakeDb {
        fn table_names(&self) -> Vec<String> {
            vec!["orders".into(), "broken".into()]
        }

        fn read_table(&self, name: &str) -> anyhow::Result<Table> {
            match name {
                "orders" => Ok(Table::new(["id"]).with_row(vec![json!(1)])?),
                _ => anyhow::bail!("connection reset"),
            }
        }
    }

    fn db(table: Option<&str>) -> DataSource {
        DataSource::Database {
            reader: Arc::new(FakeDb),
            table: table.map(String::from),
        }
    }

    #[test]
    fn database_reads_known_table() {
        let table = db(Some("orders")).load().unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn database_without_or_with_unknown_table_is_empty() {
        assert!(db(None).load().unwrap().is_empty());
        assert!(db(Some("")).load().unwrap().is_empty());
        assert!(db(Some("customers")).load().unwrap().is_empty());
    }

    #[test]
    fn database_read_error_is_reported() {
        let err = db(Some("broken")).load().unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn in_memory_returns_copy() {
        let table = Table::new(["a"]).with_row(vec![json!(1)]).unwrap();
        let source = DataSource::InMemory(table.clone());
        assert_eq!(source.load().unwrap(), table);
        assert_eq!(source.kind(), "in-memory");
    }
}
