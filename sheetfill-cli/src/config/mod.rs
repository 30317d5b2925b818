//! Run configuration
//!
//! Values come from built-in defaults, an optional TOML file and command-line
//! overrides (which clap also fills from `SHEETFILL_*` environment variables),
//! later sources winning.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::a1;
use crate::error::SyncError;
use crate::reconcile::{SheetLayout, misses};

pub const DEFAULT_KEY_COLUMN: &str = "J";
pub const DEFAULT_MAPPING_FILE: &str = "google_docs_upload_output/text_id_to_url_mapping.json";
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_OUTPUT_DIR: &str = "google_sheets_update_output";
pub const LOG_FILE: &str = "google_sheets_update.log";

/// Partially specified configuration, as read from a TOML file or the CLI
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub key_column: Option<String>,
    pub start_row: Option<u32>,
    pub end_row: Option<u32>,
    pub mapping_file: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigLayer {
    /// Fields set in `other` replace fields set here
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            spreadsheet_id: other.spreadsheet_id.or(self.spreadsheet_id),
            sheet_name: other.sheet_name.or(self.sheet_name),
            key_column: other.key_column.or(self.key_column),
            start_row: other.start_row.or(self.start_row),
            end_row: other.end_row.or(self.end_row),
            mapping_file: other.mapping_file.or(self.mapping_file),
            credentials_path: other.credentials_path.or(self.credentials_path),
            token_path: other.token_path.or(self.token_path),
            output_dir: other.output_dir.or(self.output_dir),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, SyncError> {
        toml::from_str(content)
            .map_err(|e| SyncError::configuration(format!("Invalid config file: {}", e)))
    }

    /// Read a TOML layer
    ///
    /// An explicit path must exist. Without one, `<config_dir>/sheetfill/config.toml`
    /// is used if present and an empty layer otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SyncError::configuration(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            SyncError::configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sheetfill").join("config.toml"))
}

/// Fully resolved configuration for an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub key_column: String,
    pub start_row: u32,
    pub end_row: u32,
    pub mapping_file: PathBuf,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Config {
    /// Fill defaults and validate
    pub fn resolve(layer: ConfigLayer) -> Result<Self, SyncError> {
        let credentials_path = layer.credentials_path();
        let token_path = layer.token_path();
        let output_dir = layer.output_dir();

        let spreadsheet_id = required(layer.spreadsheet_id, "spreadsheet_id")?;
        let sheet_name = required(layer.sheet_name, "sheet_name")?;
        let start_row = layer
            .start_row
            .ok_or_else(|| SyncError::configuration("Missing required setting: start_row"))?;
        let end_row = layer
            .end_row
            .ok_or_else(|| SyncError::configuration("Missing required setting: end_row"))?;

        let key_column = layer
            .key_column
            .unwrap_or_else(|| DEFAULT_KEY_COLUMN.to_string())
            .trim()
            .to_ascii_uppercase();

        let config = Self {
            spreadsheet_id,
            sheet_name,
            key_column,
            start_row,
            end_row,
            mapping_file: layer
                .mapping_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE)),
            credentials_path,
            token_path,
            output_dir,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SyncError> {
        if self.start_row == 0 {
            return Err(SyncError::configuration("start_row is 1-based and must be at least 1"));
        }
        if self.start_row > self.end_row {
            return Err(SyncError::configuration(format!(
                "start_row ({}) is after end_row ({})",
                self.start_row, self.end_row
            )));
        }
        a1::offset_column(&self.key_column, SheetLayout::VALUE_OFFSET)
            .map_err(|e| SyncError::configuration(format!("Invalid key_column: {}", e)))?;
        Ok(())
    }

    /// Fail before doing anything else if the OAuth client file is missing
    pub fn check_credentials(&self) -> Result<(), SyncError> {
        if !self.credentials_path.exists() {
            return Err(SyncError::configuration(format!(
                "Credentials file not found: {}",
                self.credentials_path.display()
            )));
        }
        Ok(())
    }

    pub fn misses_file(&self) -> PathBuf {
        misses::misses_path(&self.output_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, SyncError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(SyncError::configuration(format!(
            "Missing required setting: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ConfigLayer {
        ConfigLayer {
            spreadsheet_id: Some("sheet-id".into()),
            sheet_name: Some("Sheet1".into()),
            start_row: Some(1005),
            end_row: Some(1006),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::resolve(minimal()).unwrap();

        assert_eq!(config.key_column, "J");
        assert_eq!(config.mapping_file, PathBuf::from(DEFAULT_MAPPING_FILE));
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(
            config.misses_file(),
            PathBuf::from("google_sheets_update_output/missing_text_ids.json")
        );
        assert_eq!(
            config.log_file(),
            PathBuf::from("google_sheets_update_output/google_sheets_update.log")
        );
    }

    #[test]
    fn test_toml_layer() {
        let layer = ConfigLayer::from_toml(
            r#"
            spreadsheet_id = "abc"
            sheet_name = "Texts"
            key_column = "b"
            start_row = 2
            end_row = 40
            mapping_file = "mapping.json"
            "#,
        )
        .unwrap();

        let config = Config::resolve(layer).unwrap();
        assert_eq!(config.spreadsheet_id, "abc");
        assert_eq!(config.key_column, "B");
        assert_eq!(config.end_row, 40);
        assert_eq!(config.mapping_file, PathBuf::from("mapping.json"));
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let err = ConfigLayer::from_toml("start_rows = 3").unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_later_layer_wins() {
        let file = ConfigLayer {
            start_row: Some(10),
            end_row: Some(20),
            ..minimal()
        };
        let cli = ConfigLayer {
            end_row: Some(30),
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.start_row, Some(10));
        assert_eq!(merged.end_row, Some(30));
        assert_eq!(merged.spreadsheet_id.as_deref(), Some("sheet-id"));
    }

    #[test]
    fn test_missing_required_settings() {
        let mut layer = minimal();
        layer.spreadsheet_id = Some("  ".into());
        assert!(Config::resolve(layer).is_err());

        let mut layer = minimal();
        layer.end_row = None;
        let err = Config::resolve(layer).unwrap_err();
        assert!(err.to_string().contains("end_row"));
    }

    #[test]
    fn test_row_range_validation() {
        let mut layer = minimal();
        layer.start_row = Some(0);
        assert!(Config::resolve(layer).is_err());

        let mut layer = minimal();
        layer.start_row = Some(50);
        layer.end_row = Some(10);
        assert!(Config::resolve(layer).is_err());

        let mut layer = minimal();
        layer.start_row = Some(7);
        layer.end_row = Some(7);
        assert!(Config::resolve(layer).is_ok());
    }

    #[test]
    fn test_bad_key_column() {
        let mut layer = minimal();
        layer.key_column = Some("J1".into());
        assert!(Config::resolve(layer).is_err());

        let mut layer = minimal();
        layer.key_column = Some("ABCDEFG".into());
        assert!(Config::resolve(layer).is_err());

        // Value column would land past ZZZ
        let mut layer = minimal();
        layer.key_column = Some("ZZY".into());
        assert!(Config::resolve(layer).is_err());
    }

    #[test]
    fn test_explicit_config_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLayer::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_check_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::resolve(minimal()).unwrap();
        config.credentials_path = dir.path().join("credentials.json");
        assert!(config.check_credentials().is_err());

        std::fs::write(&config.credentials_path, "{}").unwrap();
        assert!(config.check_credentials().is_ok());
    }
}
