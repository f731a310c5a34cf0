// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Drawing Renamer: batch rename of uploaded drawings
//!
//! Uploaded drawings are staged under their original names, given
//! replacement names by hand or through a spreadsheet round-trip, and
//! downloaded again as a zip archive of renamed copies.

pub mod config;
pub mod error;
pub mod mapping;
pub mod materialize;
pub mod session;
pub mod spreadsheet;
pub mod staging;
pub mod web;

pub use config::AppConfig;
pub use error::{RenamerError, Result};
pub use mapping::{reconcile, MappingEntry, MappingTable};
pub use session::{Download, Session};
pub use staging::{StagingStore, UploadedFile};
