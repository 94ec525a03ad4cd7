//! Roster - employee spreadsheet ingestion and row validation
//!
//! This crate provides:
//! - Spreadsheet reading (`.xlsx`, `.xls`, `.xlsb`, `.ods`) into a [`Sheet`]
//! - Required column checks
//! - Employee number normalization and batch-wide duplicate detection
//! - Row validation into front/back badge inputs
//!
//! # Example
//!
//! ```ignore
//! use roster::{find_duplicates, missing_columns, validate_row, Sheet};
//!
//! let sheet = Sheet::from_path("employees.xlsx")?;
//! assert!(missing_columns(&sheet).is_empty());
//!
//! let duplicates = find_duplicates(&sheet);
//! for row in sheet.rows() {
//!     match validate_row(row, &duplicates) {
//!         Ok(valid) => println!("{}", valid.employee_number),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

mod sheet;
mod validate;

pub use sheet::{BatchRow, Sheet, PHOTO_COLUMN, REQUIRED_COLUMNS};
pub use validate::{
    find_duplicates, is_missing, missing_columns, normalize_employee_number, validate_row,
    RowError, ValidatedRow,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a spreadsheet
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to open spreadsheet '{path}': {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("The spreadsheet '{0}' contains no worksheet")]
    NoWorksheet(PathBuf),

    #[error("Failed to read worksheet: {0}")]
    Read(String),
}

/// Result type for roster operations
pub type Result<T> = std::result::Result<T, RosterError>;
