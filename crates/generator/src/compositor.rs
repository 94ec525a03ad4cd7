//! Print sheet compositor
//!
//! Pairs rendered fronts and backs by the key in their file names and lays
//! them out in columns, three per page. Each column holds the front at the
//! top with its back underneath. Image sizes come from the DPI stored in
//! each file.

use crate::CompositeError;
use badge_template::{BadgeFileName, PdfLayout, Side};
use pdf_sheet::{units, ImageInfo, PdfDocument};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Badge columns per page
pub const BADGES_PER_PAGE: usize = 3;

/// Front and back images sharing a key; either side may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgePair {
    pub front: Option<PathBuf>,
    pub back: Option<PathBuf>,
}

/// One image placed on a page, in millimetres from the top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub side: Side,
    pub path: PathBuf,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scan a folder for badge images and pair them by key
///
/// Keys come back sorted, which is the page order.
pub fn collect_pairs(
    folder: &Path,
    front_prefix: &str,
    back_prefix: &str,
) -> Result<BTreeMap<String, BadgePair>, CompositeError> {
    if !folder.is_dir() {
        return Err(CompositeError::SourceFolderNotFound(folder.to_path_buf()));
    }

    let read_err = |source| CompositeError::ReadFolder {
        path: folder.to_path_buf(),
        source,
    };

    let mut pairs: BTreeMap<String, BadgePair> = BTreeMap::new();
    for entry in std::fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.file_type().map_err(read_err)?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            debug!(name = ?file_name, "skipping non UTF-8 file name");
            continue;
        };
        let Some(parsed) = BadgeFileName::parse(file_name, front_prefix, back_prefix) else {
            continue;
        };

        let pair = pairs.entry(parsed.key).or_default();
        match parsed.side {
            Side::Front => pair.front = Some(entry.path()),
            Side::Back => pair.back = Some(entry.path()),
        }
    }

    Ok(pairs)
}

/// Split sorted keys into pages of [`BADGES_PER_PAGE`]
pub fn paginate<T>(items: &[T]) -> Vec<&[T]> {
    items.chunks(BADGES_PER_PAGE).collect()
}

/// Left edge of a column, in millimetres
pub fn slot_x(layout: &PdfLayout, slot: usize) -> f64 {
    slot as f64 * (layout.badge_width + layout.column_gap) + layout.column_gap
}

/// Physical size of an image file in millimetres
fn image_size_mm(data: &[u8]) -> Result<(f64, f64), pdf_sheet::PdfError> {
    Ok(ImageInfo::from_bytes(data)?.size_mm())
}

/// Build the print sheet
///
/// # Arguments
/// * `folder` - Folder holding rendered badges
/// * `front_prefix` - File name prefix of front images
/// * `back_prefix` - File name prefix of back images
/// * `layout` - Paper size, margins and output path
///
/// # Returns
/// Path of the written PDF. Nothing is written on error.
pub fn composite(
    folder: &Path,
    front_prefix: &str,
    back_prefix: &str,
    layout: &PdfLayout,
) -> Result<PathBuf, CompositeError> {
    let pairs = collect_pairs(folder, front_prefix, back_prefix)?;
    let entries: Vec<(&String, &BadgePair)> = pairs.iter().collect();

    let mut doc = PdfDocument::new();
    let (page_width, page_height) = (
        units::mm_to_pt(layout.paper_width),
        units::mm_to_pt(layout.paper_height),
    );

    for group in paginate(&entries) {
        let page = doc.add_page(page_width, page_height)?;
        for (slot, (key, pair)) in group.iter().enumerate() {
            let x = slot_x(layout, slot);
            let mut y = layout.start_y;

            for (side, path) in [(Side::Front, &pair.front), (Side::Back, &pair.back)] {
                let Some(path) = path else {
                    continue;
                };
                let placement = place(&mut doc, page, side, path, x, y)?;
                debug!(key = %key, page, side = %side, x, y, "placed badge");
                y += placement.height + layout.row_gap;
            }
        }
    }

    // A document always has at least one page
    if doc.page_count() == 0 {
        doc.add_page(page_width, page_height)?;
    }

    let output = layout.output.clone();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CompositeError::Save {
            path: output.clone(),
            reason: e.to_string(),
        })?;
    }
    doc.save(&output).map_err(|e| CompositeError::Save {
        path: output.clone(),
        reason: e.to_string(),
    })?;

    info!(
        badges = pairs.len(),
        pages = doc.page_count(),
        output = %output.display(),
        "print sheet written"
    );
    Ok(output)
}

fn place(
    doc: &mut PdfDocument,
    page: usize,
    side: Side,
    path: &Path,
    x: f64,
    y: f64,
) -> Result<Placement, CompositeError> {
    let placement_err = |reason: String| CompositeError::Placement {
        side,
        path: path.to_path_buf(),
        reason,
    };

    let data = std::fs::read(path).map_err(|e| placement_err(e.to_string()))?;
    let (width, height) = image_size_mm(&data).map_err(|e| placement_err(e.to_string()))?;
    doc.insert_image(
        &data,
        page,
        units::mm_to_pt(x),
        units::mm_to_pt(y),
        units::mm_to_pt(width),
        units::mm_to_pt(height),
    )
    .map_err(|e| placement_err(e.to_string()))?;

    Ok(Placement {
        side,
        path: path.to_path_buf(),
        x,
        y,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paginate_groups_of_three() {
        let keys: Vec<u32> = (1..=7).collect();
        let pages = paginate(&keys);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].to_vec(), vec![1, 2, 3]);
        assert_eq!(pages[2].to_vec(), vec![7]);
        assert!(paginate::<u32>(&[]).is_empty());
    }

    #[test]
    fn test_slot_x() {
        let layout = PdfLayout::default();
        assert_eq!(slot_x(&layout, 0), 5.0);
        assert_eq!(slot_x(&layout, 1), 64.0);
        assert_eq!(slot_x(&layout, 2), 123.0);
    }

    #[test]
    fn test_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PdfLayout {
            output: dir.path().join("out.pdf"),
            ..PdfLayout::default()
        };
        let missing = dir.path().join("nope");
        let err = composite(&missing, "badge_front_", "badge_back_", &layout).unwrap_err();
        assert!(matches!(err, CompositeError::SourceFolderNotFound(_)));
        assert!(!layout.output.exists());
    }

    #[test]
    fn test_collect_pairs_partial() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["badge_front_2.png", "badge_back_2.png", "badge_back_1.png", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("badge_front_dir.png")).unwrap();

        let pairs = collect_pairs(dir.path(), "badge_front_", "badge_back_").unwrap();
        assert_eq!(pairs.keys().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(pairs["1"].front, None);
        assert!(pairs["1"].back.is_some());
        assert!(pairs["2"].front.is_some());
    }

    #[test]
    fn test_broken_image_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let badges = dir.path().join("badges");
        std::fs::create_dir(&badges).unwrap();
        std::fs::write(badges.join("badge_front_1.png"), b"not an image").unwrap();

        let layout = PdfLayout {
            output: dir.path().join("print").join("out.pdf"),
            ..PdfLayout::default()
        };
        let err = composite(&badges, "badge_front_", "badge_back_", &layout).unwrap_err();
        assert!(err.to_string().starts_with("Failed to insert front image '"));
        assert!(!layout.output.exists());
    }
}
