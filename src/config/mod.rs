// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the drawing renamer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Scratch directory layout
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Upload intake rules
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Spreadsheet export/import settings
    #[serde(default)]
    pub spreadsheet: SpreadsheetConfig,

    /// Output archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkspaceConfig {
    /// Root for per-session scratch directories (system temp dir when unset)
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SpreadsheetConfig {
    #[serde(default = "default_original_column")]
    pub original_column: String,
    #[serde(default = "default_renamed_column")]
    pub renamed_column: String,
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub compression: Compression,
}

/// Compression used for archive entries
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

// Default value functions
fn default_staging_dir() -> String { "temp_uploaded_files".to_string() }
fn default_output_dir() -> String { "temp_renamed_files".to_string() }
fn default_original_column() -> String { "Original Title".to_string() }
fn default_renamed_column() -> String { "Renamed Title".to_string() }
fn default_export_file_name() -> String { "exported_file_names.xlsx".to_string() }
fn default_archive_file_name() -> String { "renamed_files.zip".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8501 }
fn default_max_upload_mb() -> usize { 200 }

fn default_allowed_extensions() -> Vec<String> {
    vec!["png", "jpg", "jpeg", "pdf"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            staging_dir: default_staging_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            original_column: default_original_column(),
            renamed_column: default_renamed_column(),
            export_file_name: default_export_file_name(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            file_name: default_archive_file_name(),
            compression: Compression::default(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl WorkspaceConfig {
    /// Directory under which session scratch directories are created
    pub fn root_dir(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("drawing-renamer"))
    }
}

impl UploadConfig {
    /// Check a file name against the allowed drawing extensions (case-insensitive)
    pub fn accepts(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::RenamerError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
