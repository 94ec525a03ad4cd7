//! Badge rendering
//!
//! A badge is the side template's background with the photo pasted into its
//! slot and the record's text fields drawn on top, saved as one PNG file.

use crate::naming::badge_file_name;
use crate::{BadgeRecord, Color, FontCache, PhotoSlot, RenderError, Side, TextFieldSpec};
use ab_glyph::{Font, FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Renders badge records into PNG files
#[derive(Debug, Clone)]
pub struct BadgeRenderer {
    /// Folder rendered badges are written to
    output_dir: PathBuf,
    fonts: FontCache,
}

impl BadgeRenderer {
    /// Create a renderer writing into `output_dir`
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self::with_font_cache(output_dir, FontCache::new())
    }

    /// Create a renderer sharing an existing font cache
    pub fn with_font_cache<P: Into<PathBuf>>(output_dir: P, fonts: FontCache) -> Self {
        Self {
            output_dir: output_dir.into(),
            fonts,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn font_cache(&self) -> &FontCache {
        &self.fonts
    }

    /// Render one badge face
    ///
    /// # Arguments
    /// * `record` - Field values merged with the side template
    ///
    /// # Returns
    /// Path of the written PNG file. Nothing is written on error.
    pub fn render(&self, record: &BadgeRecord<'_>) -> Result<PathBuf, RenderError> {
        let template = record.template;
        let fields = record.text_fields()?;

        let mut canvas = load_background(&template.background, record.side)?;

        if let Some(photo) = &record.photo {
            let slot = template.photo.ok_or_else(|| {
                RenderError::PhotoComposition(format!(
                    "the {} template has no photo slot",
                    record.side
                ))
            })?;
            paste_photo(&mut canvas, photo, &slot)?;
        }

        // Resolve every font before drawing anything
        let mut runs: Vec<(&TextFieldSpec, FontArc, &str)> = Vec::with_capacity(fields.len());
        for (key, text) in fields {
            let spec = template.field(key).ok_or(RenderError::MissingFieldSpec {
                side: record.side,
                field: key,
            })?;
            let font = self.fonts.load(&spec.font)?;
            runs.push((spec, font, text));
        }

        for (spec, font, text) in &runs {
            draw_text(&mut canvas, font, spec, text);
        }

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        if let Some(dpi) = template.dpi {
            png = pdf_sheet::set_png_dpi(&png, dpi).map_err(|e| RenderError::Encode(e.to_string()))?;
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| RenderError::Save {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = self
            .output_dir
            .join(badge_file_name(record.side, &record.id));
        std::fs::write(&path, &png).map_err(|source| RenderError::Save {
            path: path.clone(),
            source,
        })?;

        info!(side = %record.side, id = %record.id, path = %path.display(), "badge rendered");
        Ok(path)
    }
}

fn load_background(path: &Path, side: Side) -> Result<RgbaImage, RenderError> {
    let image = image::open(path).map_err(|e| RenderError::BackgroundLoad {
        side,
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

fn paste_photo(canvas: &mut RgbaImage, path: &Path, slot: &PhotoSlot) -> Result<(), RenderError> {
    let photo = image::open(path)
        .map_err(|e| RenderError::PhotoComposition(format!("{}: {e}", path.display())))?;
    if slot.size.width == 0 || slot.size.height == 0 {
        return Err(RenderError::PhotoComposition(
            "photo slot has an empty size".to_string(),
        ));
    }

    let has_alpha = photo.color().has_alpha();
    let resized = imageops::resize(
        &photo.to_rgba8(),
        slot.size.width,
        slot.size.height,
        FilterType::Lanczos3,
    );
    let (x, y) = (i64::from(slot.position.x), i64::from(slot.position.y));
    if has_alpha {
        imageops::overlay(canvas, &resized, x, y);
    } else {
        imageops::replace(canvas, &resized, x, y);
    }

    debug!(path = %path.display(), x, y, "photo pasted");
    Ok(())
}

/// Draw one line of text with its top-left corner at the field position
fn draw_text(canvas: &mut RgbaImage, font: &FontArc, spec: &TextFieldSpec, text: &str) {
    let scale = font
        .pt_to_px_scale(spec.size)
        .unwrap_or(PxScale::from(spec.size));
    let Color { r, g, b, a } = spec.color;
    draw_text_mut(
        canvas,
        Rgba([r, g, b, a]),
        spec.position.x,
        spec.position.y,
        scale,
        font,
        text,
    );
}
