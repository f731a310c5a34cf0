// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Scratch storage for uploaded drawings, keyed by original file name

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{RenamerError, Result};

/// An uploaded file as received from the intake surface
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RenamerError::InvalidFileName(path.display().to_string()))?;
        Ok(Self::new(name, fs::read(path)?))
    }
}

/// Reject names that are not a single, plain path component
pub fn validate_file_name(name: &str) -> Result<&str> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);

    if plain {
        Ok(name)
    } else {
        tracing::warn!("Rejected upload name: {:?}", name);
        Err(RenamerError::InvalidFileName(name.to_string()))
    }
}

/// Uploaded file bytes stored under their original names in one directory
#[derive(Debug)]
pub struct StagingStore {
    dir: PathBuf,
}

impl StagingStore {
    /// Create (or reuse) the staging directory
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Staging directory ready: {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the staging directory is still present on disk
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Store bytes under `name`, replacing any previous file of that name
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let name = validate_file_name(name)?;
        fs::write(self.dir.join(name), bytes)?;
        debug!("Staged {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    /// Path of a staged file, if present
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        let name = validate_file_name(name).ok()?;
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }

    /// Remove the staging directory and everything in it
    pub fn remove(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
            info!("Removed staging directory {:?}", self.dir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::create(dir.path().join("staging")).unwrap();

        store.put("plan.pdf", b"%PDF-1.4").unwrap();
        store.put("plan.pdf", b"%PDF-1.7").unwrap();

        let path = store.path_of("plan.pdf").unwrap();
        assert!(store.path_of("other.pdf").is_none());
        assert_eq!(fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_rejects_path_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::create(dir.path()).unwrap();

        for bad in ["", ".", "..", "../escape.png", "dir/file.png", "dir\\file.png"] {
            assert!(
                matches!(store.put(bad, b"x"), Err(RenamerError::InvalidFileName(_))),
                "accepted {:?}",
                bad
            );
        }
        assert!(validate_file_name("..plan.png").is_ok());
    }

    #[test]
    fn test_remove_deletes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staging");
        let store = StagingStore::create(&path).unwrap();
        store.put("a.png", b"a").unwrap();

        store.remove().unwrap();
        assert!(!path.exists());
        assert!(!store.exists());
        assert!(store.path_of("a.png").is_none());
    }
}
