// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the drawing renamer

use thiserror::Error;

/// Result type alias for renamer operations
pub type Result<T> = std::result::Result<T, RenamerError>;

/// Renamer error types
#[derive(Error, Debug)]
pub enum RenamerError {
    /// Imported spreadsheet lacks a required column
    #[error("Spreadsheet schema error: {0}")]
    Schema(String),

    /// Bytes could not be read as a spreadsheet at all
    #[error("Spreadsheet format error: {0}")]
    Format(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// Nothing to export, or nothing staged to process
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Spreadsheet writer error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenamerError {
    /// Whether the error was caused by user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(_)
                | Self::Format(_)
                | Self::EmptyInput(_)
                | Self::InvalidFileName(_)
                | Self::UnsupportedFileType(_)
                | Self::Upload(_)
        )
    }

    /// Message shown to the user at the interaction boundary
    pub fn user_message(&self) -> String {
        match self {
            Self::Schema(_) => {
                "The uploaded Excel file does not have the required columns.".to_string()
            }
            Self::Format(detail) => format!("Error reading the Excel file: {}", detail),
            Self::EmptyInput(detail) => detail.clone(),
            Self::InvalidFileName(name) => format!("Invalid file name: {}", name),
            Self::UnsupportedFileType(name) => format!("Unsupported file type: {}", name),
            Self::Upload(detail) => format!("Upload failed: {}", detail),
            other => format!("Something went wrong: {}", other),
        }
    }
}
