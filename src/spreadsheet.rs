// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Spreadsheet export and import of the mapping table
//!
//! Export writes a two-column XLSX sheet (original name, blank replacement
//! column) for the user to fill in. Import reads a completed sheet back and
//! overwrites replacement names for matching rows.

use calamine::{Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info};

use crate::config::SpreadsheetConfig;
use crate::mapping::MappingTable;
use crate::{RenamerError, Result};

/// MIME type of exported spreadsheets
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Export the table as a fresh sheet to fill in.
///
/// Returns `None` for an empty table. Current replacement names are not
/// written; the second column is always blank.
pub fn export(table: &MappingTable, columns: &SpreadsheetConfig) -> Result<Option<Vec<u8>>> {
    if table.is_empty() {
        debug!("Nothing to export");
        return Ok(None);
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string(0, 0, columns.original_column.as_str())?;
    worksheet.write_string(0, 1, columns.renamed_column.as_str())?;

    for (i, entry) in table.iter().enumerate() {
        worksheet.write_string((i + 1) as u32, 0, entry.original_name.as_str())?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!("Exported {} file names ({} bytes)", table.len(), bytes.len());
    Ok(Some(bytes))
}

/// Read the original-to-renamed mapping from a completed sheet.
///
/// Only the first worksheet is read and its first row must be the header.
/// When an original name repeats, the last row wins. Rows with a blank
/// original name are ignored.
pub fn read_names(bytes: &[u8], columns: &SpreadsheetConfig) -> Result<HashMap<String, String>> {
    let range = first_sheet(bytes)?;
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .ok_or_else(|| RenamerError::Schema("worksheet is empty".to_string()))?;

    let find = |name: &str| header.iter().position(|h| h == name);
    let (original_idx, renamed_idx) = match (
        find(&columns.original_column),
        find(&columns.renamed_column),
    ) {
        (Some(o), Some(r)) => (o, r),
        (o, r) => {
            let missing: Vec<&str> = [
                (o, columns.original_column.as_str()),
                (r, columns.renamed_column.as_str()),
            ]
            .iter()
            .filter(|(idx, _)| idx.is_none())
            .map(|(_, name)| *name)
            .collect();
            return Err(RenamerError::Schema(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }
    };

    let mut names = HashMap::new();
    for row in rows {
        let original = row.get(original_idx).map(cell_text).unwrap_or_default();
        if original.is_empty() {
            continue;
        }
        let renamed = row.get(renamed_idx).map(cell_text).unwrap_or_default();
        names.insert(original, renamed);
    }

    debug!("Read {} name mappings from spreadsheet", names.len());
    Ok(names)
}

/// Apply a completed sheet to `table`, returning the updated copy.
///
/// On any error the caller's table is left as it was.
pub fn import(
    bytes: &[u8],
    table: &MappingTable,
    columns: &SpreadsheetConfig,
) -> Result<MappingTable> {
    let names = read_names(bytes, columns)?;
    let mut updated = table.clone();
    let count = updated.apply_names(&names);
    info!("File names updated from spreadsheet: {} of {} rows", count, updated.len());
    Ok(updated)
}

fn first_sheet(bytes: &[u8]) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| RenamerError::Format(e.to_string()))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RenamerError::Format("workbook has no worksheets".to_string()))?
        .map_err(|e| RenamerError::Format(e.to_string()))
}

/// Cell contents as text; numbers and booleans use their display form
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingEntry;

    fn columns() -> SpreadsheetConfig {
        SpreadsheetConfig::default()
    }

    fn sheet(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn table(rows: &[(&str, &str)]) -> MappingTable {
        rows.iter()
            .map(|(o, n)| MappingEntry::with_new_name(*o, *n))
            .collect()
    }

    #[test]
    fn test_export_empty_table_is_none() {
        assert!(export(&MappingTable::new(), &columns()).unwrap().is_none());
    }

    #[test]
    fn test_export_has_blank_renamed_column() {
        let t = table(&[("a.png", "alpha"), ("b.jpg", "")]);
        let bytes = export(&t, &columns()).unwrap().unwrap();

        let range = first_sheet(&bytes).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Original Title", "Renamed Title"]);
        assert_eq!(rows[1], vec!["a.png", ""]);
        assert_eq!(rows[2], vec!["b.jpg", ""]);
    }

    #[test]
    fn test_import_updates_matching_rows() {
        let t = table(&[("a.png", ""), ("b.png", "")]);
        let bytes = sheet(&[&["Original Title", "Renamed Title"], &["a.png", "alpha"]]);

        let updated = import(&bytes, &t, &columns()).unwrap();
        assert_eq!(updated, table(&[("a.png", "alpha"), ("b.png", "")]));
    }

    #[test]
    fn test_import_columns_in_any_order() {
        let t = table(&[("a.png", "")]);
        let bytes = sheet(&[&["Notes", "Renamed Title", "Original Title"], &["x", "alpha", "a.png"]]);

        let updated = import(&bytes, &t, &columns()).unwrap();
        assert_eq!(updated.get("a.png").unwrap().new_name, "alpha");
    }

    #[test]
    fn test_import_last_duplicate_wins_and_blank_clears() {
        let t = table(&[("a.png", "old"), ("b.png", "beta")]);
        let bytes = sheet(&[
            &["Original Title", "Renamed Title"],
            &["a.png", "first"],
            &["a.png", "second"],
            &["b.png", ""],
        ]);

        let updated = import(&bytes, &t, &columns()).unwrap();
        assert_eq!(updated, table(&[("a.png", "second"), ("b.png", "")]));
    }

    #[test]
    fn test_import_numeric_cell_uses_text() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Original Title").unwrap();
        worksheet.write_string(0, 1, "Renamed Title").unwrap();
        worksheet.write_string(1, 0, "a.png").unwrap();
        worksheet.write_number(1, 1, 101.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let updated = import(&bytes, &table(&[("a.png", "")]), &columns()).unwrap();
        assert_eq!(updated.get("a.png").unwrap().new_name, "101");
    }

    #[test]
    fn test_import_missing_column_is_schema_error() {
        let t = table(&[("a.png", "keep")]);
        let bytes = sheet(&[&["Original Title"], &["a.png"]]);

        let err = import(&bytes, &t, &columns()).unwrap_err();
        match err {
            RenamerError::Schema(msg) => assert!(msg.contains("Renamed Title")),
            other => panic!("expected schema error, got {:?}", other),
        }
        assert_eq!(t.get("a.png").unwrap().new_name, "keep");
    }

    #[test]
    fn test_import_garbage_is_format_error() {
        let err = import(b"definitely not a workbook", &MappingTable::new(), &columns()).unwrap_err();
        assert!(matches!(err, RenamerError::Format(_)));
    }

    #[test]
    fn test_round_trip_through_export() {
        let t = table(&[("draw1.pdf", ""), ("draw2.pdf", "")]);
        let exported = export(&t, &columns()).unwrap().unwrap();

        // An untouched export imports as all-blank.
        let updated = import(&exported, &t, &columns()).unwrap();
        assert_eq!(updated, t);
    }
}
