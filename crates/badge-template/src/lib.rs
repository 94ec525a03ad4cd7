//! Badge Template - presets, badge records and raster rendering
//!
//! This crate provides:
//! - Configuration schema types (presets, side templates, PDF layout)
//! - Configuration parsing from JSON
//! - Badge records: user input merged onto an immutable side template
//! - Badge rendering (background, photo, text fields) to PNG files
//! - Badge file naming and join-key parsing
//!
//! # Example
//!
//! ```ignore
//! use badge_template::{load_config, BadgeInput, BadgeRenderer, Side};
//!
//! let config = load_config("config.json")?;
//! let preset = config.presets.get("standard").unwrap();
//! let input = BadgeInput::new("Jonathan Smith", "1023", "Engineering", "Developer");
//! let record = preset.front.merge(Side::Front, input);
//!
//! let renderer = BadgeRenderer::new(&config.output_folder);
//! let path = renderer.render(&record)?;
//! ```

mod font;
pub mod naming;
pub mod parser;
mod record;
mod renderer;
mod schema;

pub use font::FontCache;
pub use naming::{badge_file_name, safe_identifier, sanitize_filename, BadgeFileName};
pub use parser::{load_config, parse_config};
pub use record::{format_employee_id, BadgeInput, BadgeRecord, NameLayout, ID_PREFIX};
pub use renderer::BadgeRenderer;
pub use schema::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("The configuration file '{path}' could not be read: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("The selected preset '{0}' does not exist.")]
    PresetNotFound(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors that can occur while rendering one badge
///
/// Every variant is scoped to a single record: no file is written when a
/// render fails.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(
        "The name '{name}' is too long. Please use spaces to separate first and last names or edit it manually."
    )]
    NameTooLong { name: String },

    #[error("Failed to load {side} image: {reason}")]
    BackgroundLoad { side: Side, reason: String },

    #[error("Failed to insert photo: {0}")]
    PhotoComposition(String),

    #[error("Font not found: {path}: {reason}")]
    FontNotFound { path: PathBuf, reason: String },

    #[error("The {side} template has no settings for field '{field}'")]
    MissingFieldSpec { side: Side, field: FieldKey },

    #[error("Failed to encode badge image: {0}")]
    Encode(String),

    #[error("Failed to save badge to '{path}': {source}")]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, TemplateError>;
