//src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{LineageError, Result};

/// Taxid NCBI uses for "root".
pub const ROOT_TAXID: u32 = 1;
/// Taxid NCBI uses for "cellular organisms".
pub const CELLULAR_ORGANISMS_TAXID: u32 = 131567;

/// Settings for loading and checking a lineage listing.
///
/// Every field has a default, so a config file only needs the keys it changes:
/// ```toml
/// strict = true
/// report_min_records = 2
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineageConfig {
    /// Taxid every chain is expected to start with.
    pub root_taxid: u32,
    /// Taxid expected right after the root.
    pub cellular_organisms_taxid: u32,
    /// Promote a missing "cellular organisms" node from warning to error.
    pub require_cellular_organisms: bool,
    /// Fail loading when any error-level issue is found.
    pub strict: bool,
    /// Clades with fewer records are left out of the report.
    pub report_min_records: u64,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            root_taxid: ROOT_TAXID,
            cellular_organisms_taxid: CELLULAR_ORGANISMS_TAXID,
            require_cellular_organisms: false,
            strict: false,
            report_min_records: 1,
        }
    }
}

impl LineageConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| LineageError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded config from {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = LineageConfig::from_toml_str("strict = true\nreport_min_records = 3\n")
            .expect("valid config");
        assert!(config.strict);
        assert_eq!(config.report_min_records, 3);
        assert_eq!(config.root_taxid, ROOT_TAXID);
        assert_eq!(config.cellular_organisms_taxid, CELLULAR_ORGANISMS_TAXID);
        assert!(!config.require_cellular_organisms);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = LineageConfig::from_toml_str("stric = true").unwrap_err();
        assert!(matches!(err, LineageError::Config(_)));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = LineageConfig::from_toml_str("").unwrap();
        assert_eq!(config.report_min_records, 1);
        assert!(!config.strict);
    }
}
