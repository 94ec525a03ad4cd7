//! Tabular input: a header row plus data rows

use crate::{Result, RosterError};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Columns every roster must provide, in reporting order
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Local Name",
    "English Name",
    "Employee Number",
    "Department",
    "Position",
    "Department_en",
    "Position_en",
];

/// Optional column holding a photo path for the front side
pub const PHOTO_COLUMN: &str = "Photo";

/// One data row of the spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    /// 1-based spreadsheet line (the header is line 1)
    pub line: usize,
    fields: HashMap<String, String>,
}

impl BatchRow {
    /// Build a row from (column, value) pairs
    pub fn new<I, K, V>(line: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw cell text for a column; `None` when the cell is empty or absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Header plus rows read from the first worksheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<BatchRow>,
}

impl Sheet {
    /// Build a sheet from a header row and data rows
    ///
    /// Rows are given as cell text in header order; `None` marks an empty
    /// cell. Data row `i` (0-based) is spreadsheet line `i + 2`. Empty rows
    /// after the last filled row are dropped; empty rows in between are kept
    /// so they are reported like any other incomplete row.
    pub fn new<H, S>(headers: H, mut rows: Vec<Vec<Option<String>>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .collect();

        let filled = rows
            .iter()
            .rposition(|cells| cells.iter().any(Option::is_some))
            .map_or(0, |last| last + 1);
        rows.truncate(filled);

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, cells)| {
                let fields = headers
                    .iter()
                    .zip(cells)
                    .filter_map(|(header, cell)| cell.map(|value| (header.clone(), value)));
                BatchRow::new(index + 2, fields)
            })
            .collect();

        Self { headers, rows }
    }

    /// Read the first worksheet of a workbook
    ///
    /// # Arguments
    /// * `path` - `.xlsx`, `.xlsm`, `.xls`, `.xlsb` or `.ods` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path).map_err(|e| RosterError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| RosterError::NoWorksheet(path.to_path_buf()))?
            .map_err(|e| RosterError::Read(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        };
        let data: Vec<Vec<Option<String>>> =
            rows.map(|row| row.iter().map(cell_text).collect()).collect();

        let sheet = Self::new(headers, data);
        debug!(
            path = %path.display(),
            columns = sheet.headers.len(),
            rows = sheet.rows.len(),
            "read spreadsheet"
        );
        Ok(sheet)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cell text; `None` for empty and error cells
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}
