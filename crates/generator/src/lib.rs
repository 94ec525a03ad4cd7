//! Badge Generator - batch badge rendering and print sheet assembly
//!
//! This crate provides:
//! - The batch orchestrator: spreadsheet rows rendered on a bounded worker
//!   pool, errors collected into a rewritten error log
//! - The PDF compositor: rendered fronts and backs paired by identifier and
//!   laid out three per page
//! - A notification queue drained by the control thread
//! - Logging setup for the `badge-generator` binary
//!
//! # Example
//!
//! ```ignore
//! use badge_generator::{composite, BatchOutcome, Orchestrator};
//!
//! let config = badge_template::load_config("config.json")?;
//! match Orchestrator::new(&config).run_file("employees.xlsx", "standard")? {
//!     BatchOutcome::Succeeded { rendered } => println!("{rendered} rows"),
//!     BatchOutcome::Failed { error_log, .. } => println!("see {}", error_log.display()),
//! }
//!
//! let layout = &config.pdf;
//! let pdf = composite(&layout.badge_folder, &layout.front_prefix, &layout.back_prefix, layout)?;
//! ```

pub mod batch;
pub mod compositor;
pub mod logging;
pub mod notify;

pub use batch::{write_error_log, BatchEntry, BatchOutcome, Orchestrator};
pub use compositor::{collect_pairs, composite, paginate, BadgePair, Placement, BADGES_PER_PAGE};
pub use notify::{channel, Dispatcher, Level, Notification, Notifier, POLL_INTERVAL};

use badge_template::Side;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a batch run
///
/// Per-row failures are not errors here; they end up in
/// [`BatchOutcome::Failed`].
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("The selected preset '{0}' does not exist.")]
    PresetNotFound(String),

    #[error("The spreadsheet is missing the following required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("General Error: {0}")]
    Roster(#[from] roster::RosterError),

    #[error("Failed to write to error log '{path}': {source}")]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors while assembling the print sheet
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("Badge folder '{0}' does not exist.")]
    SourceFolderNotFound(PathBuf),

    #[error("Failed to read badge folder '{path}': {source}")]
    ReadFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to insert {side} image '{path}': {reason}")]
    Placement {
        side: Side,
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to save PDF to '{path}': {reason}")]
    Save { path: PathBuf, reason: String },

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_sheet::PdfError),
}

/// Any failure of a background job
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Config(#[from] badge_template::TemplateError),

    #[error(transparent)]
    Render(#[from] badge_template::RenderError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("An error occurred during PDF generation: {0}")]
    Composite(#[from] CompositeError),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = BatchError::MissingColumns(vec!["Position".into(), "Position_en".into()]);
        assert_eq!(
            err.to_string(),
            "The spreadsheet is missing the following required columns: Position, Position_en"
        );
    }

    #[test]
    fn test_placement_message() {
        let err = CompositeError::Placement {
            side: Side::Front,
            path: PathBuf::from("Badge_output/badge_front_1.png"),
            reason: "bad image".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to insert front image 'Badge_output/badge_front_1.png': bad image"
        );
    }
}
