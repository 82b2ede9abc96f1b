// crates/popatlas-core/src/config.rs

//! Runtime configuration.
//!
//! Every field has a default matching the public UNHCR endpoints, so an empty
//! TOML document is a valid configuration.

use crate::alias::AliasTable;
use crate::error::{AtlasError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const STATISTICS_URL: &str = "https://api.unhcr.org/population/v1/population/";
pub const DEMOGRAPHICS_URL: &str = "https://api.unhcr.org/population/v1/demographics/";
pub const GEOGRAPHY_URL: &str =
    "https://raw.githubusercontent.com/johan/world.geo.json/master/countries.geo.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub statistics_url: String,
    pub demographics_url: String,
    pub geography_url: String,
    /// Local geography file (plain or gzip), preferred over `geography_url`.
    pub geography_path: Option<PathBuf>,
    /// Deadline per request.
    pub timeout_ms: u64,
    /// Number of choropleth buckets.
    pub bucket_count: usize,
    pub top_n: usize,
    pub default_year: i32,
    pub years: Vec<i32>,
    /// Extra alias classes merged into the built-in table.
    pub aliases: Vec<Vec<String>>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            statistics_url: STATISTICS_URL.to_string(),
            demographics_url: DEMOGRAPHICS_URL.to_string(),
            geography_url: GEOGRAPHY_URL.to_string(),
            geography_path: None,
            timeout_ms: 5_000,
            bucket_count: 10,
            top_n: 10,
            default_year: 2024,
            years: vec![2024, 2023, 2022, 2021, 2020],
            aliases: Vec::new(),
        }
    }
}

impl AtlasConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AtlasConfig =
            toml::from_str(s).map_err(|e| AtlasError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AtlasError::NotFound(format!("Config not found at {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(AtlasError::InvalidConfig("bucket_count must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(AtlasError::InvalidConfig("timeout_ms must be > 0".into()));
        }
        if self.top_n == 0 {
            return Err(AtlasError::InvalidConfig("top_n must be > 0".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The built-in alias table extended with `aliases`.
    pub fn alias_table(&self) -> AliasTable {
        AliasTable::builtin_with(&self.aliases)
    }
}
