use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Run settings. Every field has a default, so a config file may set any subset.
///
/// ```json
/// {
///   "data_dir": "data",
///   "csv_path": "jades_results_table.csv",
///   "parquet_path": "jades_results.parquet",
///   "images_dir": "images",
///   "charts": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Directory scanned (non-recursively) for `*.fits` inputs.
    pub data_dir: PathBuf,
    pub csv_path: PathBuf,
    /// Parquet export is skipped when unset.
    pub parquet_path: Option<PathBuf>,
    pub images_dir: PathBuf,
    pub charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            csv_path: PathBuf::from("jades_results_table.csv"),
            parquet_path: None,
            images_dir: PathBuf::from("images"),
            charts: true,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "data_dir": "fits", "charts": false }"#).unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("fits"));
        assert!(!config.charts);
        assert_eq!(config.csv_path, AnalysisConfig::default().csv_path);
        assert_eq!(config.parquet_path, None);
    }

    #[test]
    fn unknown_keys_and_bad_json_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.json");
        std::fs::write(&path, r#"{ "data_directory": "fits" }"#).unwrap();
        assert!(AnalysisConfig::load(&path).is_err());

        std::fs::write(&path, "{ not json").unwrap();
        let err = AnalysisConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AnalysisConfig::load(Path::new("/nonexistent/config.json")).is_err());
    }
}
