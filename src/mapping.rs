// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Mapping table from uploaded file names to user-assigned replacement names

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A single row of the mapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Name the file was uploaded under (unique within a table)
    pub original_name: String,
    /// Replacement name without extension; empty means "keep original"
    pub new_name: String,
}

impl MappingEntry {
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            new_name: String::new(),
        }
    }

    pub fn with_new_name(original_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Whether the user asked for this file to be renamed
    pub fn is_renamed(&self) -> bool {
        !self.new_name.is_empty()
    }
}

/// Ordered original-name to replacement-name associations for the current batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table with blank replacement names, one row per distinct name.
    ///
    /// Repeated names keep the position of their first occurrence.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut seen = HashSet::new();
        let entries = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| seen.insert(n.to_string()))
            .map(MappingEntry::new)
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, original_name: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.original_name == original_name)
    }

    /// Original names in table order
    pub fn original_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.original_name.as_str()).collect()
    }

    /// True once at least one row carries a replacement name
    pub fn has_edits(&self) -> bool {
        self.entries.iter().any(MappingEntry::is_renamed)
    }

    /// Set the replacement name for one row; returns false if the row is absent
    pub fn set_new_name(&mut self, original_name: &str, new_name: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.original_name == original_name) {
            Some(entry) => {
                entry.new_name = new_name.into();
                true
            }
            None => false,
        }
    }

    /// Overwrite replacement names for every row present in `names`.
    ///
    /// Rows absent from `names` are untouched. An empty imported value
    /// clears the row. Returns the number of rows updated.
    pub fn apply_names(&mut self, names: &HashMap<String, String>) -> usize {
        let mut updated = 0;
        for entry in &mut self.entries {
            if let Some(new_name) = names.get(&entry.original_name) {
                debug!("Updated '{}' to '{}'", entry.original_name, new_name);
                entry.new_name = new_name.clone();
                updated += 1;
            }
        }
        updated
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = &'a MappingEntry;
    type IntoIter = std::slice::Iter<'a, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    /// Later rows with an already-seen original name are dropped
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let entries = iter
            .into_iter()
            .filter(|e| seen.insert(e.original_name.clone()))
            .collect();
        Self { entries }
    }
}

/// Merge a new upload batch into the previous table.
///
/// The result has exactly one row per uploaded name, in upload order.
/// Replacement names are carried forward only when the previous table
/// already holds at least one edit; an unedited table is treated as a
/// fresh start even when names overlap.
pub fn reconcile<S: AsRef<str>>(previous: &MappingTable, uploaded_names: &[S]) -> MappingTable {
    let mut table = MappingTable::from_names(uploaded_names);

    if !previous.has_edits() {
        debug!("No edits in previous table, starting fresh with {} rows", table.len());
        return table;
    }

    let carried: HashMap<&str, &str> = previous
        .iter()
        .map(|e| (e.original_name.as_str(), e.new_name.as_str()))
        .collect();

    for entry in &mut table.entries {
        if let Some(new_name) = carried.get(entry.original_name.as_str()) {
            entry.new_name = (*new_name).to_string();
        }
    }

    debug!(
        "Reconciled {} rows against {} previous rows",
        table.len(),
        previous.len()
    );
    table
}
