//! PDF Sheet - Low-level PDF writing for print sheets
//!
//! This crate provides functionality for:
//! - Creating blank PDF documents with custom page sizes
//! - Inserting images (JPEG, PNG) at physical coordinates
//! - Reading image resolution metadata (PNG `pHYs`, JPEG JFIF density)
//! - Writing resolution metadata into encoded PNG files
//! - Converting between pixels, millimetres and PDF points
//!
//! # Example
//!
//! ```ignore
//! use pdf_sheet::{units, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page(units::mm_to_pt(210.0), units::mm_to_pt(297.0))?;
//! doc.insert_image(&png_bytes, page, 42.5, 28.3, 153.0, 243.0)?;
//! doc.save("print/badges.pdf")?;
//! ```

mod document;
mod image;
pub mod units;

pub use document::PdfDocument;
pub use crate::image::{
    detect_format, get_dimensions, read_dpi, set_png_dpi, ImageDimensions, ImageFormat, ImageInfo,
    ImageXObject,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid page size: {0} x {1} points")]
    InvalidPageSize(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF structure error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PdfError::InvalidPage(3, 1);
        assert_eq!(err.to_string(), "Invalid page number: 3 (document has 1 pages)");

        let err = PdfError::ImageError("bad data".to_string());
        assert_eq!(err.to_string(), "Image error: bad data");
    }
}
