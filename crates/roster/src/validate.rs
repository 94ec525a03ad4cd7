//! Row validation and employee number checks

use crate::{BatchRow, Sheet, PHOTO_COLUMN, REQUIRED_COLUMNS};
use badge_template::{BadgeInput, ID_PREFIX};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

const EMPLOYEE_NUMBER: &str = "Employee Number";

/// A row that cannot be rendered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row {}: Missing fields - {}.", .line, .fields.join(", "))]
    MissingFields { line: usize, fields: Vec<String> },

    #[error("Row {line}: Employee Number '{employee_number}' is duplicated.")]
    Duplicate {
        line: usize,
        employee_number: String,
    },
}

impl RowError {
    pub fn line(&self) -> usize {
        match self {
            RowError::MissingFields { line, .. } | RowError::Duplicate { line, .. } => *line,
        }
    }
}

/// Inputs for both badge faces of one valid row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRow {
    pub line: usize,
    /// Normalized employee number, without the `No. ` prefix
    pub employee_number: String,
    /// Local-language values
    pub front: BadgeInput,
    /// English values
    pub back: BadgeInput,
}

/// A cell is missing when it is absent or blank after trimming
pub fn is_missing(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Normalize an employee number
///
/// Spreadsheets often store numbers as floats, so `"1023.0"` becomes
/// `"1023"`. Anything else is only trimmed.
pub fn normalize_employee_number(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_suffix(".0") {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Required columns absent from the header, in reporting order
pub fn missing_columns(sheet: &Sheet) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !sheet.has_column(column))
        .collect()
}

/// Normalized employee numbers that occur on more than one row
///
/// Blank employee numbers are never reported as duplicates; those rows fail
/// the missing-field check instead.
pub fn find_duplicates(sheet: &Sheet) -> BTreeSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in sheet.rows() {
        let value = row.get(EMPLOYEE_NUMBER);
        if is_missing(value) {
            continue;
        }
        let number = normalize_employee_number(value.unwrap_or_default());
        *counts.entry(number).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(number, _)| number)
        .collect()
}

/// Validate one row against the batch duplicate set
///
/// # Arguments
/// * `row` - Spreadsheet row
/// * `duplicates` - Result of [`find_duplicates`] for the whole sheet
pub fn validate_row(row: &BatchRow, duplicates: &BTreeSet<String>) -> Result<ValidatedRow, RowError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| is_missing(row.get(column)))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RowError::MissingFields {
            line: row.line,
            fields: missing,
        });
    }

    let value = |column: &str| row.get(column).unwrap_or_default().trim();
    let employee_number = normalize_employee_number(value(EMPLOYEE_NUMBER));
    if duplicates.contains(&employee_number) {
        return Err(RowError::Duplicate {
            line: row.line,
            employee_number,
        });
    }

    let id = format!("{ID_PREFIX}{employee_number}");
    let photo = value(PHOTO_COLUMN);
    let front = BadgeInput::new(value("Local Name"), &id, value("Department"), value("Position"))
        .with_photo(photo);
    let back = BadgeInput::new(
        value("English Name"),
        &id,
        value("Department_en"),
        value("Position_en"),
    );

    Ok(ValidatedRow {
        line: row.line,
        employee_number,
        front,
        back,
    })
}
