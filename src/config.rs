use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::export::ExportFormat;

/// Default handover delay between two files of one split video
pub const DEFAULT_CLIP_TOLERANCE_MS: u64 = 5000;

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub schema_version: u32,

    /// Largest gap between one video's end and the next one's start for the
    /// two to count as one split recording
    pub clip_tolerance_ms: u64,

    /// Column layout and date conventions of the exports
    pub format: ExportFormat,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            clip_tolerance_ms: DEFAULT_CLIP_TOLERANCE_MS,
            format: ExportFormat::neuroworkbench(),
        }
    }
}

impl ExtractConfig {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            serde_json::from_str(&content)
                .context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")
    }

    pub fn with_clip_tolerance(mut self, tolerance: chrono::Duration) -> Self {
        self.clip_tolerance_ms = tolerance.num_milliseconds().max(0) as u64;
        self
    }

    pub fn clip_tolerance(&self) -> chrono::Duration {
        let millis = i64::try_from(self.clip_tolerance_ms).unwrap_or(i64::MAX);
        chrono::Duration::try_milliseconds(millis).unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::DateMode;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ExtractConfig::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.clip_tolerance(), chrono::Duration::seconds(5));
        assert_eq!(config.format.patient_id_column, "ID");
    }

    #[test]
    fn test_with_clip_tolerance() {
        let config = ExtractConfig::default().with_clip_tolerance(chrono::Duration::seconds(30));
        assert_eq!(config.clip_tolerance_ms, 30_000);

        let negative = ExtractConfig::default().with_clip_tolerance(chrono::Duration::seconds(-1));
        assert_eq!(negative.clip_tolerance_ms, 0);
    }

    #[test]
    fn test_huge_tolerance_saturates() {
        let mut config = ExtractConfig::default();
        config.clip_tolerance_ms = u64::MAX;
        assert_eq!(config.clip_tolerance(), chrono::Duration::MAX);
        assert!(config.clip_tolerance() > chrono::Duration::zero());
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempdir().unwrap();
        let config = ExtractConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ExtractConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nk-export.json");

        let mut config = ExtractConfig::default().with_clip_tolerance(chrono::Duration::seconds(2));
        config.format.date_mode = DateMode::Excel1904;
        config.save(&path).unwrap();

        let loaded = ExtractConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"clip_tolerance_ms": 1500, "format": {"start_column": "Begin"}}"#)
            .unwrap();

        let config = ExtractConfig::load(&path).unwrap();
        assert_eq!(config.clip_tolerance_ms, 1500);
        assert_eq!(config.format.start_column, "Begin");
        assert_eq!(config.format.end_column, "End");
        assert_eq!(config.schema_version, 1);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(ExtractConfig::load(&path).is_err());
    }
}
