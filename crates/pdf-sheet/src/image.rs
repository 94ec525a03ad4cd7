//! Image handling for PDF sheets

use crate::units::{dpi_to_ppm, ppm_to_dpi, px_to_mm, DEFAULT_DPI};
use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Stream};
use std::io::Cursor;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }

    // JPEG starts with FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Ok(ImageFormat::Jpeg);
    }

    if data[0..8] == PNG_SIGNATURE {
        return Ok(ImageFormat::Png);
    }

    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Pixel dimensions plus the embedded horizontal resolution, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Horizontal resolution in dots per inch
    pub dpi: Option<f64>,
}

impl ImageInfo {
    /// Read dimensions and resolution from image file bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let dims = get_dimensions(data)?;
        Ok(Self {
            width: dims.width,
            height: dims.height,
            dpi: read_dpi(data),
        })
    }

    /// Resolution used for physical sizing, falling back to [`DEFAULT_DPI`]
    pub fn effective_dpi(&self) -> f64 {
        self.dpi.unwrap_or(DEFAULT_DPI)
    }

    /// Physical size in millimetres as (width, height)
    ///
    /// Both axes use the horizontal resolution.
    pub fn size_mm(&self) -> (f64, f64) {
        let dpi = self.effective_dpi();
        (px_to_mm(self.width, dpi), px_to_mm(self.height, dpi))
    }
}

/// JPEG info including dimensions and color components
#[derive(Debug, Clone, Copy)]
struct JpegInfo {
    width: u32,
    height: u32,
    num_components: u8,
}

/// A chunk located inside a PNG byte stream
#[derive(Debug, Clone, Copy)]
struct PngChunk {
    /// Offset of the length field
    start: usize,
    /// Offset of the chunk data
    data_start: usize,
    /// Length of the chunk data
    len: usize,
    kind: [u8; 4],
}

impl PngChunk {
    /// Offset one past the CRC field
    fn end(&self) -> usize {
        self.data_start + self.len + 4
    }
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray")
    pub color_space: String,
    /// Bits per component
    pub bits_per_component: u8,
    /// PDF filter ("DCTDecode" for JPEG, "FlateDecode" for PNG)
    pub filter: String,
    /// Raw image data (compressed)
    pub data: Vec<u8>,
}

/// Get image dimensions without fully decoding
pub fn get_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    match detect_format(data)? {
        ImageFormat::Jpeg => {
            let info = get_jpeg_info(data)?;
            Ok(ImageDimensions {
                width: info.width,
                height: info.height,
            })
        }
        ImageFormat::Png => get_png_dimensions(data),
    }
}

/// Read the horizontal resolution (dots per inch) embedded in an image
///
/// PNG files carry it in a `pHYs` chunk (pixels per metre), JPEG files in the
/// JFIF APP0 segment. Returns `None` when absent, unitless or zero.
pub fn read_dpi(data: &[u8]) -> Option<f64> {
    match detect_format(data).ok()? {
        ImageFormat::Png => get_png_dpi(data),
        ImageFormat::Jpeg => get_jpeg_dpi(data),
    }
}

/// Get JPEG info including dimensions and color components
fn get_jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    // SOF segment: marker (2) length (2) precision (1) height (2) width (2) components (1)
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        if (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            let num_components = data[i + 9];
            return Ok(JpegInfo {
                width,
                height,
                num_components,
            });
        }

        if i + 4 < data.len() {
            let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            if length < 2 {
                break;
            }
            i += 2 + length;
        } else {
            break;
        }
    }

    Err(PdfError::ImageError(
        "Could not parse JPEG info".to_string(),
    ))
}

/// Read the JFIF density from the APP0 segment
fn get_jpeg_dpi(data: &[u8]) -> Option<f64> {
    // APP0: FF E0, length (2), "JFIF\0", version (2), units (1), Xdensity (2), Ydensity (2)
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;

        if marker == 0xE0 {
            let segment = data.get(i + 4..i + 2 + length)?;
            if segment.len() < 12 || &segment[0..5] != b"JFIF\0" {
                return None;
            }
            let units = segment[7];
            let x_density = u16::from_be_bytes([segment[8], segment[9]]) as f64;
            if x_density == 0.0 {
                return None;
            }
            return match units {
                1 => Some(x_density),
                2 => Some(x_density * 2.54),
                _ => None,
            };
        }

        // Start of scan: no more header segments
        if marker == 0xDA || length < 2 {
            return None;
        }
        i += 2 + length;
    }
    None
}

/// Walk the chunk list of a PNG byte stream
fn png_chunks(data: &[u8]) -> Result<Vec<PngChunk>> {
    if data.len() < 8 || data[0..8] != PNG_SIGNATURE {
        return Err(PdfError::ImageError("Invalid PNG signature".to_string()));
    }

    let mut chunks = Vec::new();
    let mut i = 8;
    while i + 8 <= data.len() {
        let len = u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]) as usize;
        let kind = [data[i + 4], data[i + 5], data[i + 6], data[i + 7]];
        let chunk = PngChunk {
            start: i,
            data_start: i + 8,
            len,
            kind,
        };
        if chunk.end() > data.len() {
            return Err(PdfError::ImageError(format!(
                "Truncated PNG chunk {}",
                String::from_utf8_lossy(&kind)
            )));
        }
        chunks.push(chunk);
        if &kind == b"IEND" {
            break;
        }
        i = chunk.end();
    }
    Ok(chunks)
}

/// Read the `pHYs` chunk of a PNG file
fn get_png_dpi(data: &[u8]) -> Option<f64> {
    let chunks = png_chunks(data).ok()?;
    let phys = chunks.iter().find(|c| &c.kind == b"pHYs" && c.len == 9)?;
    let d = &data[phys.data_start..phys.data_start + 9];
    let x_ppu = u32::from_be_bytes([d[0], d[1], d[2], d[3]]);
    // Unit 1 is the metre, unit 0 only gives an aspect ratio
    if d[8] != 1 || x_ppu == 0 {
        return None;
    }
    Some(ppm_to_dpi(x_ppu))
}

/// Get PNG dimensions from header
fn get_png_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    // IHDR starts at byte 8: length (4) + "IHDR" (4) + width (4) + height (4)
    if data.len() < 24 {
        return Err(PdfError::ImageError("PNG data too short".to_string()));
    }

    if &data[12..16] != b"IHDR" {
        return Err(PdfError::ImageError(
            "Invalid PNG: IHDR not found".to_string(),
        ));
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

    Ok(ImageDimensions { width, height })
}

/// Write a resolution into encoded PNG bytes
///
/// Any existing `pHYs` chunk is dropped and a new one, using the metre unit,
/// is placed right after `IHDR`.
pub fn set_png_dpi(png: &[u8], dpi: f64) -> Result<Vec<u8>> {
    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(PdfError::ImageError(format!("Invalid resolution: {dpi}")));
    }

    let chunks = png_chunks(png)?;
    let ihdr = chunks
        .first()
        .filter(|c| &c.kind == b"IHDR")
        .ok_or_else(|| PdfError::ImageError("Invalid PNG: IHDR not found".to_string()))?;

    let ppm = dpi_to_ppm(dpi).to_be_bytes();
    let mut body = Vec::with_capacity(13);
    body.extend_from_slice(b"pHYs");
    body.extend_from_slice(&ppm);
    body.extend_from_slice(&ppm);
    body.push(1);

    let mut crc = flate2::Crc::new();
    crc.update(&body);

    let mut out = Vec::with_capacity(png.len() + 21);
    out.extend_from_slice(&png[..ihdr.end()]);
    out.extend_from_slice(&9u32.to_be_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc.sum().to_be_bytes());

    for chunk in chunks.iter().skip(1) {
        if &chunk.kind != b"pHYs" {
            out.extend_from_slice(&png[chunk.start..chunk.end()]);
        }
    }

    Ok(out)
}

impl ImageXObject {
    /// Create an XObject from JPEG or PNG bytes, whichever the data is
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// Create XObject from JPEG data
    ///
    /// JPEG images can be embedded directly with DCTDecode filter.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let info = get_jpeg_info(data)?;

        let color_space = if info.num_components == 1 {
            "DeviceGray".to_string()
        } else {
            "DeviceRGB".to_string()
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space,
            bits_per_component: 8,
            filter: "DCTDecode".to_string(),
            data: data.to_vec(),
        })
    }

    /// Create XObject from PNG data
    ///
    /// PNG images are decoded and re-encoded with FlateDecode. Alpha is
    /// blended against a white sheet.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;

        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (raw_data, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = image.to_luma_alpha8();
                let gray = la
                    .pixels()
                    .map(|p| blend_on_white(p[0], p[1]))
                    .collect::<Vec<u8>>();
                (gray, "DeviceGray")
            }
            image::ColorType::Rgba8 | image::ColorType::Rgba16 | image::ColorType::Rgba32F => {
                let rgba = image.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                for p in rgba.pixels() {
                    rgb.push(blend_on_white(p[0], p[3]));
                    rgb.push(blend_on_white(p[1], p[3]));
                    rgb.push(blend_on_white(p[2], p[3]));
                }
                (rgb, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, &raw_data)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", lopdf::Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", lopdf::Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            lopdf::Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        dict.set(
            "Filter",
            lopdf::Object::Name(self.filter.as_bytes().to_vec()),
        );
        dict.set("Length", self.data.len() as i64);

        Stream::new(dict, self.data.clone())
    }
}

fn blend_on_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as f32 / 255.0;
    (value as f32 * a + 255.0 * (1.0 - a)) as u8
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom, PDF coordinates)
/// * `width` - Image width in points
/// * `height` - Image height in points
pub(crate) fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use pretty_assertions::assert_eq;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn jfif_jpeg(units: u8, density: u16) -> Vec<u8> {
        let d = density.to_be_bytes();
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        jpeg.extend_from_slice(b"JFIF\0");
        jpeg.extend_from_slice(&[0x01, 0x01, units, d[0], d[1], d[0], d[1], 0x00, 0x00]);
        // SOF0 with 20x10 pixels
        jpeg.extend_from_slice(&[
            0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x0A, 0x00, 0x14, 0x03, 0x01, 0x22, 0x00, 0x02,
            0x11, 0x01, 0x03, 0x11, 0x01, 0xFF, 0xD9,
        ]);
        jpeg
    }

    #[test]
    fn test_detect_formats() {
        let jpeg_header = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_format(&jpeg_header).unwrap(), ImageFormat::Jpeg);
        assert_eq!(detect_format(&PNG_SIGNATURE).unwrap(), ImageFormat::Png);
        assert!(detect_format(&[0u8; 8]).is_err());
        assert!(detect_format(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_png_dimensions() {
        let png = encode_png(100, 50);
        let dims = get_dimensions(&png).unwrap();
        assert_eq!(dims, ImageDimensions { width: 100, height: 50 });
    }

    #[test]
    fn test_png_without_phys_has_no_dpi() {
        let png = encode_png(4, 4);
        assert_eq!(read_dpi(&png), None);

        let info = ImageInfo::from_bytes(&png).unwrap();
        assert_eq!(info.effective_dpi(), DEFAULT_DPI);
    }

    #[test]
    fn test_set_png_dpi_is_readable() {
        let png = set_png_dpi(&encode_png(600, 300), 300.0).unwrap();
        let dpi = read_dpi(&png).unwrap();
        assert!((dpi - 300.0).abs() < 0.01);

        // Still a decodable PNG with the same pixels
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 600);
        assert_eq!(decoded.height(), 300);
    }

    #[test]
    fn test_set_png_dpi_replaces_existing_chunk() {
        let once = set_png_dpi(&encode_png(8, 8), 300.0).unwrap();
        let twice = set_png_dpi(&once, 150.0).unwrap();

        let phys_count = png_chunks(&twice)
            .unwrap()
            .iter()
            .filter(|c| &c.kind == b"pHYs")
            .count();
        assert_eq!(phys_count, 1);
        assert!((read_dpi(&twice).unwrap() - 150.0).abs() < 0.01);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_set_png_dpi_rejects_invalid_resolution() {
        let png = encode_png(2, 2);
        assert!(set_png_dpi(&png, 0.0).is_err());
        assert!(set_png_dpi(&png, f64::NAN).is_err());
    }

    #[test]
    fn test_size_mm_uses_dpi() {
        let png = set_png_dpi(&encode_png(600, 300), 300.0).unwrap();
        let (w, h) = ImageInfo::from_bytes(&png).unwrap().size_mm();
        assert!((w - 50.8).abs() < 0.01);
        assert!((h - 25.4).abs() < 0.01);
    }

    #[test]
    fn test_jpeg_jfif_density() {
        assert_eq!(read_dpi(&jfif_jpeg(1, 200)), Some(200.0));
        let per_cm = read_dpi(&jfif_jpeg(2, 100)).unwrap();
        assert!((per_cm - 254.0).abs() < 1e-9);
        assert_eq!(read_dpi(&jfif_jpeg(0, 1)), None);
        assert_eq!(read_dpi(&jfif_jpeg(1, 0)), None);
    }

    #[test]
    fn test_jpeg_dimensions_after_app0() {
        let info = ImageInfo::from_bytes(&jfif_jpeg(1, 300)).unwrap();
        assert_eq!(info.width, 20);
        assert_eq!(info.height, 10);
        assert_eq!(info.dpi, Some(300.0));
    }

    #[test]
    fn test_png_xobject_blends_alpha() {
        let img = ImageBuffer::from_pixel(2, 2, Rgba([0u8, 0, 0, 0]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let xobject = ImageXObject::from_bytes(&png).unwrap();
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.filter, "FlateDecode");

        let mut raw = Vec::new();
        std::io::Read::read_to_end(
            &mut flate2::read::ZlibDecoder::new(&xobject.data[..]),
            &mut raw,
        )
        .unwrap();
        assert_eq!(raw, vec![255u8; 12]);
    }

    #[test]
    fn test_image_xobject_to_pdf_stream() {
        let xobject = ImageXObject {
            width: 100,
            height: 50,
            color_space: "DeviceRGB".to_string(),
            bits_per_component: 8,
            filter: "DCTDecode".to_string(),
            data: vec![1, 2, 3, 4, 5],
        };

        let stream = xobject.to_pdf_stream();
        let dict = stream.dict;

        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(dict.get(b"Width").unwrap().as_i64().unwrap(), 100);
        assert_eq!(dict.get(b"Height").unwrap().as_i64().unwrap(), 50);
        assert_eq!(
            dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
        assert_eq!(stream.content, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_generate_image_operators() {
        let ops = String::from_utf8(generate_image_operators("Im1", 100.0, 200.0, 50.0, 75.0))
            .unwrap();
        assert_eq!(ops, "q\n50 0 0 75 100 200 cm\n/Im1 Do\nQ\n");
    }
}
