//! Configuration types for the grovegrid pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::record::ParseMode;

/// Configuration for locating and parsing input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// File extension of input slices (matched case-insensitively)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Reject unparseable fields instead of defaulting them
    #[serde(default)]
    pub strict: bool,
}

fn default_extension() -> String {
    "csv".to_string()
}

impl IngestConfig {
    /// Parse mode implied by the `strict` flag.
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            strict: false,
        }
    }
}

/// Presentation settings copied into the output metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Page title
    #[serde(default = "default_title")]
    pub title: String,

    /// Color for cells whose value is exactly zero
    #[serde(default = "default_zero_color")]
    pub zero_color: String,

    /// Color for cells with no data
    #[serde(default = "default_nodata_color")]
    pub nodata_color: String,

    /// Gradient stops for positive values, low to high
    #[serde(default = "default_grad_colors")]
    pub grad_colors: Vec<String>,
}

fn default_title() -> String {
    "GroveGrid".to_string()
}

fn default_zero_color() -> String {
    "#555555".to_string()
}

fn default_nodata_color() -> String {
    "#222222".to_string()
}

fn default_grad_colors() -> Vec<String> {
    [
        "#d73027", // red
        "#fdae61", // orange
        "#fee08b", // yellow
        "#a6d96a", // light green
        "#1a9850", // green
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            zero_color: default_zero_color(),
            nodata_color: default_nodata_color(),
            grad_colors: default_grad_colors(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
