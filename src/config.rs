use crate::types::Bounds;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    /// Optional override of the built-in island envelope.
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Raw census export: spreadsheet (xlsx/xls/xlsb/ods) or delimited text.
    pub census_table: PathBuf,
    /// Sheet to read when the export is a spreadsheet.
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Merged boundary GeoJSON.
    pub geometry: PathBuf,
}

fn default_sheet() -> String {
    "Population".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub cleaned_csv: PathBuf,
    pub mismatch_report: PathBuf,
    pub position_report: PathBuf,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
