//! Unit conversion between pixel space and physical measurement space

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// PDF points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Resolution assumed for images without resolution metadata
pub const DEFAULT_DPI: f64 = 300.0;

/// Inches per metre, used for PNG `pHYs` chunks (pixels per metre)
pub const INCHES_PER_METRE: f64 = 1000.0 / MM_PER_INCH;

/// Convert a pixel length to millimetres at the given resolution
///
/// # Arguments
/// * `pixels` - Length in pixels
/// * `dpi` - Horizontal resolution in dots per inch
pub fn px_to_mm(pixels: u32, dpi: f64) -> f64 {
    pixels as f64 / dpi * MM_PER_INCH
}

/// Convert millimetres to PDF points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm / MM_PER_INCH * POINTS_PER_INCH
}

/// Convert PDF points to millimetres
pub fn pt_to_mm(pt: f64) -> f64 {
    pt / POINTS_PER_INCH * MM_PER_INCH
}

/// Convert a pixels-per-metre density to dots per inch
pub fn ppm_to_dpi(pixels_per_metre: u32) -> f64 {
    pixels_per_metre as f64 / INCHES_PER_METRE
}

/// Convert dots per inch to a whole pixels-per-metre density
pub fn dpi_to_ppm(dpi: f64) -> u32 {
    (dpi * INCHES_PER_METRE).round() as u32
}
