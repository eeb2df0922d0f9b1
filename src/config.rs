use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::AqiCategory;

/// File looked up in the working directory when no config path is given.
pub const CONFIG_FILE_NAME: &str = "aqi_dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Startup settings. Every field is optional in the JSON file.
///
/// ```json
/// {
///   "data_path": "AQI and Lat Long of Countries.csv",
///   "default_countries": ["China", "India"],
///   "default_categories": ["Good", "Moderate"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub default_countries: Vec<String>,
    pub default_categories: Vec<AqiCategory>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("AQI and Lat Long of Countries.csv"),
            default_countries: ["United States of America", "China", "India", "Brazil"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_categories: AqiCategory::ALL.to_vec(),
        }
    }
}

impl DashboardConfig {
    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load `aqi_dashboard.json` from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::info!("Using config {}", path.display());
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::discover(dir.path()).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.default_countries.len(), 4);
        assert_eq!(config.default_categories.len(), 6);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "data_path": "other.parquet", "default_categories": ["Hazardous"] }"#,
        )
        .unwrap();

        let config = DashboardConfig::discover(dir.path()).unwrap();
        assert_eq!(config.data_path, PathBuf::from("other.parquet"));
        assert_eq!(config.default_categories, vec![AqiCategory::Hazardous]);
        assert_eq!(
            config.default_countries,
            DashboardConfig::default().default_countries
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let err = DashboardConfig::discover(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
