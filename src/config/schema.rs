//! Run configuration schema.
//!
//! ```yaml
//! source:
//!   csv: data/orders.csv
//! params:
//!   group_key: region
//!   required_columns: [region, amount]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::runner::Params;
use crate::source::{DataSource, Table};

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Where the dataset comes from.
    pub source: Option<SourceConfig>,

    /// Parameters handed to every step.
    pub params: Params,
}

/// Dataset source declared in config.
///
/// When both are set, `csv` wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Path to a CSV file, relative to the config file.
    pub csv: Option<PathBuf>,

    /// Inline rows, each a column-keyed map.
    pub records: Option<Vec<Map<String, Value>>>,
}

impl SourceConfig {
    /// Turn this into a [`DataSource`], resolving relative paths against `base_dir`.
    pub fn to_data_source(&self, base_dir: &Path) -> Option<DataSource> {
        if let Some(csv) = &self.csv {
            if self.records.is_some() {
                tracing::warn!("source has both csv and records; using csv");
            }
            return Some(DataSource::Csv(base_dir.join(csv)));
        }
        self.records
            .as_ref()
            .map(|records| DataSource::InMemory(Table::from_records(records.clone())))
    }
}
