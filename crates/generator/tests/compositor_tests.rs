//! Integration tests for the print sheet compositor

use badge_generator::composite;
use badge_template::{badge_file_name, PdfLayout, Side};
use image::{DynamicImage, ImageBuffer, Rgb};
use lopdf::Document;
use pdf_sheet::set_png_dpi;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::path::Path;

/// 54 x 85.6 mm at 300 dpi
fn badge_png(shade: u8) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(638, 1011, Rgb([shade, shade, shade]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    set_png_dpi(&buffer, 300.0).unwrap()
}

fn write_badge(folder: &Path, side: Side, id: &str, shade: u8) {
    let path = folder.join(badge_file_name(side, &format!("No. {id}")));
    std::fs::write(path, badge_png(shade)).unwrap();
}

/// (x, y) of every image placement on a page, in points
fn placements(doc: &Document, page: u32) -> Vec<(f64, f64)> {
    let page_id = doc.get_pages()[&page];
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
    content
        .lines()
        .filter(|line| line.ends_with(" cm"))
        .map(|line| {
            let parts: Vec<f64> = line
                .split_whitespace()
                .take(6)
                .map(|v| v.parse().unwrap())
                .collect();
            (parts[4], parts[5])
        })
        .collect()
}

fn layout(dir: &Path) -> PdfLayout {
    PdfLayout {
        output: dir.join("print").join("badges.pdf"),
        ..PdfLayout::default()
    }
}

#[test]
fn test_front_above_back_in_one_slot() {
    let dir = tempfile::tempdir().unwrap();
    let badges = dir.path().join("Badge_output");
    std::fs::create_dir(&badges).unwrap();
    write_badge(&badges, Side::Front, "1023", 200);
    write_badge(&badges, Side::Back, "1023", 100);

    let layout = layout(dir.path());
    let output = composite(&badges, "badge_front_", "badge_back_", &layout).unwrap();
    assert_eq!(output, layout.output);

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let placed = placements(&doc, 1);
    assert_eq!(placed.len(), 2);
    let (front, back) = (placed[0], placed[1]);
    assert_eq!(front.0, back.0);
    assert!(front.1 > back.1, "front {front:?} back {back:?}");

    // x = 5 mm; front top at 10 mm; back top at 10 + 85.6 + 5 mm
    let mm = |v: f64| v * 72.0 / 25.4;
    assert!((front.0 - mm(5.0)).abs() < 0.01);
    let page_height = mm(297.0);
    let badge_height = mm(1011.0 / 300.0 * 25.4);
    assert!((front.1 - (page_height - mm(10.0) - badge_height)).abs() < 0.01);
    assert!((back.1 - (page_height - mm(10.0) - badge_height - mm(5.0) - badge_height)).abs() < 0.01);
}

#[test]
fn test_seven_badges_fill_three_pages() {
    let dir = tempfile::tempdir().unwrap();
    let badges = dir.path().join("Badge_output");
    std::fs::create_dir(&badges).unwrap();
    for id in 1..=7 {
        write_badge(&badges, Side::Front, &id.to_string(), 10 * id as u8);
        write_badge(&badges, Side::Back, &id.to_string(), 10 * id as u8 + 5);
    }

    let layout = layout(dir.path());
    composite(&badges, "badge_front_", "badge_back_", &layout).unwrap();

    let doc = Document::load(&layout.output).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    assert_eq!(placements(&doc, 1).len(), 6);
    assert_eq!(placements(&doc, 2).len(), 6);
    assert_eq!(placements(&doc, 3).len(), 2);

    let columns: Vec<f64> = placements(&doc, 1).iter().map(|p| p.0).step_by(2).collect();
    assert_eq!(columns.len(), 3);
    assert!(columns[0] < columns[1] && columns[1] < columns[2]);
}

#[test]
fn test_back_only_starts_at_top() {
    let dir = tempfile::tempdir().unwrap();
    let badges = dir.path().join("Badge_output");
    std::fs::create_dir(&badges).unwrap();
    write_badge(&badges, Side::Back, "9", 50);

    let layout = layout(dir.path());
    composite(&badges, "badge_front_", "badge_back_", &layout).unwrap();

    let doc = Document::load(&layout.output).unwrap();
    let placed = placements(&doc, 1);
    assert_eq!(placed.len(), 1);

    let mm = |v: f64| v * 72.0 / 25.4;
    let badge_height = mm(1011.0 / 300.0 * 25.4);
    assert!((placed[0].1 - (mm(297.0) - mm(10.0) - badge_height)).abs() < 0.01);
}

#[test]
fn test_empty_folder_gives_single_blank_page() {
    let dir = tempfile::tempdir().unwrap();
    let badges = dir.path().join("Badge_output");
    std::fs::create_dir(&badges).unwrap();

    let layout = layout(dir.path());
    composite(&badges, "badge_front_", "badge_back_", &layout).unwrap();
    let doc = Document::load(&layout.output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}
