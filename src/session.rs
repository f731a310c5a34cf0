// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Interactive session state: the mapping table and staged uploads
//!
//! Every user action (upload, manual edit, export, import, process) is a
//! method on [`Session`] and runs to completion before the next one. A
//! failed action leaves the session usable.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::mapping::{reconcile, MappingTable};
use crate::materialize::{materialize, RenamedArchive, ZIP_MIME};
use crate::spreadsheet::{self, XLSX_MIME};
use crate::staging::{validate_file_name, StagingStore, UploadedFile};
use crate::{RenamerError, Result};

/// A named byte stream offered for download
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl From<RenamedArchive> for Download {
    fn from(archive: RenamedArchive) -> Self {
        Self {
            file_name: archive.file_name,
            mime: ZIP_MIME,
            bytes: archive.bytes,
        }
    }
}

/// State for one user working through one batch of drawings
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    root: PathBuf,
    table: MappingTable,
    staging: Option<StagingStore>,
}

impl Session {
    /// Start an empty session with its own scratch directory
    pub fn new(config: AppConfig) -> Self {
        let id = Uuid::new_v4();
        let root = config.workspace.root_dir().join(format!("session-{}", id));
        debug!("New session {} at {:?}", id, root);
        Self {
            config,
            root,
            table: MappingTable::new(),
            staging: None,
        }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Scratch directory holding this session's staging and output locations
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether uploaded bytes are available for processing
    pub fn has_staged_files(&self) -> bool {
        self.staging.as_ref().is_some_and(StagingStore::exists)
    }

    /// Accept a batch of uploads and reconcile the mapping table against it.
    ///
    /// The whole batch is validated before anything is stored. An empty
    /// batch changes nothing. Returns the number of files staged.
    pub fn upload(&mut self, files: Vec<UploadedFile>) -> Result<usize> {
        if files.is_empty() {
            debug!("Empty upload batch ignored");
            return Ok(0);
        }

        for file in &files {
            validate_file_name(&file.name)?;
            if !self.config.uploads.accepts(&file.name) {
                return Err(RenamerError::UnsupportedFileType(file.name.clone()));
            }
        }

        let staging = match self.staging.take() {
            Some(store) if store.exists() => store,
            _ => StagingStore::create(self.root.join(&self.config.workspace.staging_dir))?,
        };

        let stored = files
            .iter()
            .try_for_each(|file| staging.put(&file.name, &file.bytes));
        self.staging = Some(staging);
        stored?;

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        self.table = reconcile(&self.table, &names[..]);

        info!("Uploaded {} drawing(s)", files.len());
        Ok(files.len())
    }

    /// Manually set (or clear, with an empty string) one row's replacement name
    pub fn set_new_name(&mut self, original_name: &str, new_name: &str) -> Result<()> {
        if self.table.set_new_name(original_name, new_name) {
            debug!("Manual edit: '{}' -> '{}'", original_name, new_name);
            Ok(())
        } else {
            Err(RenamerError::InvalidFileName(original_name.to_string()))
        }
    }

    /// Export the current file names as a blank rename sheet
    pub fn export_spreadsheet(&self) -> Result<Download> {
        let bytes = spreadsheet::export(&self.table, &self.config.spreadsheet)?
            .ok_or_else(|| RenamerError::EmptyInput("No file names to export.".to_string()))?;

        Ok(Download {
            file_name: self.config.spreadsheet.export_file_name.clone(),
            mime: XLSX_MIME,
            bytes,
        })
    }

    /// Apply a completed rename sheet; returns the number of rows in the table.
    ///
    /// The table is replaced only if the sheet was read successfully.
    pub fn import_spreadsheet(&mut self, bytes: &[u8]) -> Result<usize> {
        let updated = spreadsheet::import(bytes, &self.table, &self.config.spreadsheet)?;
        debug!("Table after import: {:?}", updated);
        self.table = updated;
        Ok(self.table.len())
    }

    /// Copy staged files under their final names and build the archive.
    ///
    /// Consumes the staged uploads on success; the mapping table is kept.
    /// After a failure the uploads stay staged so the batch can be fixed and
    /// processed again.
    pub fn process(&mut self) -> Result<RenamedArchive> {
        let output_dir = self.root.join(&self.config.workspace.output_dir);
        let staging = match self.staging.as_ref() {
            Some(store) if store.exists() => store,
            _ => {
                return Err(RenamerError::EmptyInput(
                    "No files uploaded or temporary directory missing.".to_string(),
                ))
            }
        };

        let archive = materialize(&self.table, staging, &output_dir, &self.config.archive)?;
        self.staging = None;
        Ok(archive)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.root.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                warn!("Failed to clean up session directory {:?}: {}", self.root, e);
            }
        }
    }
}
