//! Configuration file discovery and loading.

use crate::config::schema::RunConfig;
use crate::error::{Result, StepgateError};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "stepgate.yml";

/// A loaded config and the directory relative paths resolve against.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: RunConfig,
    pub base_dir: PathBuf,
    /// The file it came from, if any.
    pub path: Option<PathBuf>,
}

/// Load a single config file and parse it into RunConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepgateError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepgateError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into RunConfig.
///
/// `source_path` is used for error reporting only.
pub fn parse_config(content: &str, source_path: &Path) -> Result<RunConfig> {
    // An empty file is an empty config
    if content.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| StepgateError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, that file must exist. Otherwise
/// `stepgate.yml` in `working_dir` is used when present, and defaults apply
/// when it is not.
pub fn load_config(config_override: Option<&Path>, working_dir: &Path) -> Result<LoadedConfig> {
    let path = match config_override {
        Some(path) => working_dir.join(path),
        None => {
            let candidate = working_dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                return Ok(LoadedConfig {
                    config: RunConfig::default(),
                    base_dir: working_dir.to_path_buf(),
                    path: None,
                });
            }
            candidate
        }
    };

    tracing::debug!(path = %path.display(), "loading config");
    let config = load_config_file(&path)?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| working_dir.to_path_buf());

    Ok(LoadedConfig {
        config,
        base_dir,
        path: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_explicit_config_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(Path::new("nope.yml")), temp.path()).unwrap_err();
        assert!(matches!(err, StepgateError::ConfigNotFound { .. }));
    }

    #[test]
    fn missing_default_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = load_config(None, temp.path()).unwrap();
        assert_eq!(loaded.config, RunConfig::default());
        assert!(loaded.path.is_none());
        assert_eq!(loaded.base_dir, temp.path());
    }

    #[test]
    fn discovers_default_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            "params:\n  group_key: region\n",
        )
        .unwrap();

        let loaded = load_config(None, temp.path()).unwrap();
        assert_eq!(loaded.config.params.str("group_key"), Some("region"));
        assert_eq!(loaded.base_dir, temp.path());
    }

    #[test]
    fn explicit_config_in_subdir_sets_base_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("conf")).unwrap();
        fs::write(temp.path().join("conf/run.yml"), "source:\n  csv: data.csv\n").unwrap();

        let loaded = load_config(Some(Path::new("conf/run.yml")), temp.path()).unwrap();
        assert_eq!(loaded.base_dir, temp.path().join("conf"));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let err = parse_config("params: [unclosed", Path::new("stepgate.yml")).unwrap_err();
        match err {
            StepgateError::ConfigParseError { path, .. } => {
                assert_eq!(path, PathBuf::from("stepgate.yml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("\n", Path::new("stepgate.yml")).unwrap();
        assert_eq!(config, RunConfig::default());
    }
}
