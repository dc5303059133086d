//! Run configuration loading and parsing.
//!
//! A run is configured by an optional YAML file (`stepgate.yml` by default)
//! naming the data source and the step parameters. CLI flags are layered on
//! top by the `run` command.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_file, parse_config, LoadedConfig, DEFAULT_CONFIG_FILE};
pub use schema::{RunConfig, SourceConfig};
