// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use drawing_renamer::config::SpreadsheetConfig;
use drawing_renamer::spreadsheet;
use drawing_renamer::MappingTable;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must produce an error or a table, never a panic.
fuzz_target!(|data: &[u8]| {
    let table = MappingTable::from_names(&["a.png", "b.pdf"]);
    if let Ok(updated) = spreadsheet::import(data, &table, &SpreadsheetConfig::default()) {
        assert_eq!(updated.len(), table.len());
    }
});
