// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch materialization: copy staged files under their final names and
//! package the result as a single zip archive

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::{ArchiveConfig, Compression};
use crate::mapping::{MappingEntry, MappingTable};
use crate::staging::StagingStore;
use crate::{RenamerError, Result};

/// MIME type of the produced archive
pub const ZIP_MIME: &str = "application/zip";

/// One file written to the output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub original_name: String,
    pub output_name: String,
}

/// What happened to each table row during materialization
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    /// Copies made, in table order
    pub written: Vec<RenamedFile>,
    /// Originals with no staged file
    pub skipped: Vec<String>,
    /// Output names written more than once (last write wins)
    pub collisions: Vec<String>,
}

/// The downloadable archive plus the report that produced it
#[derive(Debug, Clone)]
pub struct RenamedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub report: MaterializeReport,
}

/// Split a file name into stem and extension at the last dot.
///
/// The extension keeps its leading dot. A name without a dot, or whose
/// only dot is the first character, has an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Final output name for a table row.
///
/// A replacement name always gets the original file's extension; rows
/// without one keep their original name unchanged.
pub fn output_name(entry: &MappingEntry) -> String {
    if !entry.is_renamed() {
        return entry.original_name.clone();
    }
    let (_, extension) = split_extension(&entry.original_name);
    sanitize_component(&format!("{}{}", entry.new_name, extension))
}

/// Reduce a user-supplied name to a single safe path component
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();

    if cleaned == "." || cleaned == ".." {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

/// Copy every staged row to `output_dir` under its final name and zip the result.
///
/// Rows whose original is not staged are skipped and reported. The output
/// directory is always removed afterwards. The staging directory is removed
/// only once the archive is built, so a failed run can be retried.
pub fn materialize(
    table: &MappingTable,
    staging: &StagingStore,
    output_dir: &Path,
    archive: &ArchiveConfig,
) -> Result<RenamedArchive> {
    if !staging.exists() {
        return Err(RenamerError::EmptyInput(
            "No files uploaded or temporary directory missing.".to_string(),
        ));
    }

    let result = copy_and_package(table, staging, output_dir, archive.compression);

    if output_dir.exists() {
        if let Err(e) = fs::remove_dir_all(output_dir) {
            warn!("Failed to remove output directory {:?}: {}", output_dir, e);
        }
    }

    let (bytes, report) = result?;
    if let Err(e) = staging.remove() {
        warn!("Failed to remove staging directory {:?}: {}", staging.dir(), e);
    }

    info!(
        "Built {} ({} files, {} skipped, {} bytes)",
        archive.file_name,
        report.written.len() - report.collisions.len(),
        report.skipped.len(),
        bytes.len()
    );

    Ok(RenamedArchive {
        file_name: archive.file_name.clone(),
        bytes,
        report,
    })
}

fn copy_and_package(
    table: &MappingTable,
    staging: &StagingStore,
    output_dir: &Path,
    compression: Compression,
) -> Result<(Vec<u8>, MaterializeReport)> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    let mut report = MaterializeReport::default();
    let mut seen = HashSet::new();

    for entry in table {
        let source = match staging.path_of(&entry.original_name) {
            Some(path) => path,
            None => {
                warn!("Staged file missing, skipping: {}", entry.original_name);
                report.skipped.push(entry.original_name.clone());
                continue;
            }
        };

        let name = output_name(entry);
        if !seen.insert(name.clone()) {
            warn!("Output name collision, overwriting: {}", name);
            report.collisions.push(name.clone());
        }

        fs::copy(&source, output_dir.join(&name))?;
        info!("File '{}' renamed to '{}'", entry.original_name, name);

        report.written.push(RenamedFile {
            original_name: entry.original_name.clone(),
            output_name: name,
        });
    }

    let bytes = package_dir(output_dir, compression)?;
    Ok((bytes, report))
}

/// Zip every file in `dir`, using the file name as the entry name
fn package_dir(dir: &Path, compression: Compression) -> Result<Vec<u8>> {
    let method = match compression {
        Compression::Deflated => CompressionMethod::Deflated,
        Compression::Stored => CompressionMethod::Stored,
    };
    let options = SimpleFileOptions::default().compression_method(method);

    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for path in files {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => {
                warn!("Skipping non UTF-8 output file {:?}", path);
                continue;
            }
        };
        debug!("Adding {} to archive", name);
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(&path)?)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry(original: &str, new_name: &str) -> MappingEntry {
        MappingEntry::with_new_name(original, new_name)
    }

    fn archive_contents(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            out.push((file.name().to_string(), data));
        }
        out.sort();
        out
    }

    fn staged(dir: &Path, files: &[(&str, &[u8])]) -> StagingStore {
        let store = StagingStore::create(dir.join("staging")).unwrap();
        for (name, bytes) in files {
            store.put(name, bytes).unwrap();
        }
        store
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("plan.v2.pdf"), ("plan.v2", ".pdf"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
    }

    #[test]
    fn test_output_name_rules() {
        assert_eq!(output_name(&entry("a.png", "alpha")), "alpha.png");
        assert_eq!(output_name(&entry("b.jpg", "")), "b.jpg");
        // User-typed extensions do not replace the real one.
        assert_eq!(output_name(&entry("c.pdf", "gamma.png")), "gamma.png.pdf");
        assert_eq!(output_name(&entry("noext", "renamed")), "renamed");
        assert_eq!(output_name(&entry("d.pdf", "../up")), ".._up.pdf");
        assert_eq!(output_name(&entry("e", "..")), "__");
    }

    #[test]
    fn test_materialize_renames_and_keeps_originals() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staged(dir.path(), &[("a.png", b"png"), ("b.jpg", b"jpg")]);
        let staging_dir = staging.dir().to_path_buf();
        let output_dir = dir.path().join("output");
        let table: MappingTable = vec![entry("a.png", "alpha"), entry("b.jpg", "")]
            .into_iter()
            .collect();

        let archive = materialize(&table, &staging, &output_dir, &ArchiveConfig::default()).unwrap();

        assert_eq!(archive.file_name, "renamed_files.zip");
        assert_eq!(
            archive_contents(&archive.bytes),
            vec![
                ("alpha.png".to_string(), b"png".to_vec()),
                ("b.jpg".to_string(), b"jpg".to_vec()),
            ]
        );
        assert!(!staging_dir.exists());
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_missing_staged_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staged(dir.path(), &[("a.png", b"a")]);
        let table: MappingTable = vec![entry("gone.png", "x"), entry("a.png", "")]
            .into_iter()
            .collect();

        let archive = materialize(
            &table,
            &staging,
            &dir.path().join("output"),
            &ArchiveConfig::default(),
        )
        .unwrap();

        assert_eq!(archive.report.skipped, vec!["gone.png".to_string()]);
        assert_eq!(archive_contents(&archive.bytes).len(), 1);
    }

    #[test]
    fn test_collision_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staged(dir.path(), &[("a.png", b"first"), ("b.png", b"second")]);
        let table: MappingTable = vec![entry("a.png", "same"), entry("b.png", "same")]
            .into_iter()
            .collect();

        let archive = materialize(
            &table,
            &staging,
            &dir.path().join("output"),
            &ArchiveConfig {
                compression: Compression::Stored,
                ..ArchiveConfig::default()
            },
        )
        .unwrap();

        assert_eq!(archive.report.collisions, vec!["same.png".to_string()]);
        assert_eq!(
            archive_contents(&archive.bytes),
            vec![("same.png".to_string(), b"second".to_vec())]
        );
    }

    #[test]
    fn test_missing_staging_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingStore::create(dir.path().join("staging")).unwrap();
        fs::remove_dir_all(staging.dir()).unwrap();

        let err = materialize(
            &MappingTable::from_names(&["a.png"]),
            &staging,
            &dir.path().join("output"),
            &ArchiveConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenamerError::EmptyInput(_)));
    }

    #[test]
    fn test_stale_output_directory_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("stale.png"), b"old").unwrap();

        let staging = staged(dir.path(), &[("a.png", b"a")]);
        let archive = materialize(
            &MappingTable::from_names(&["a.png"]),
            &staging,
            &output_dir,
            &ArchiveConfig::default(),
        )
        .unwrap();

        let names: Vec<String> = archive_contents(&archive.bytes)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["a.png".to_string()]);
    }

    #[test]
    fn test_failed_copy_keeps_staging_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staged(dir.path(), &[("a.png", b"png"), ("b.png", b"b")]);
        let output_dir = dir.path().join("output");
        let too_long = "x".repeat(300);
        let table: MappingTable = vec![entry("b.png", ""), entry("a.png", &too_long)]
            .into_iter()
            .collect();

        let err = materialize(&table, &staging, &output_dir, &ArchiveConfig::default())
            .unwrap_err();
        assert!(matches!(err, RenamerError::FileSystem(_)), "got {:?}", err);
        assert!(!output_dir.exists());
        assert!(staging.exists());
        assert!(staging.path_of("a.png").is_some());

        let fixed: MappingTable = vec![entry("b.png", ""), entry("a.png", "alpha")]
            .into_iter()
            .collect();
        let archive = materialize(&fixed, &staging, &output_dir, &ArchiveConfig::default())
            .unwrap();
        assert_eq!(
            archive_contents(&archive.bytes),
            vec![
                ("alpha.png".to_string(), b"png".to_vec()),
                ("b.png".to_string(), b"b".to_vec()),
            ]
        );
        assert!(!staging.exists());
        assert!(!output_dir.exists());
    }
}
