//! Configuration schema types

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Badge face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Lowercase name used in file names and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Side::Front),
            "back" => Ok(Side::Back),
            other => Err(format!("unknown badge side '{other}'")),
        }
    }
}

/// Text field drawn on a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Name,
    FirstName,
    LastName,
    Id,
    Department,
    Position,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::FirstName => "first_name",
            FieldKey::LastName => "last_name",
            FieldKey::Id => "id",
            FieldKey::Department => "department",
            FieldKey::Position => "position",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel position on a badge image, written as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Pixel size, written as `[width, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(s: Size) -> Self {
        [s.width, s.height]
    }
}

/// RGBA color for text
///
/// Written in configuration as `"#RRGGBB"`, `"#RGB"`, a color name such as
/// `"black"`, or an `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColorDef", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorDef {
    Text(String),
    Rgb([u8; 3]),
}

impl TryFrom<ColorDef> for Color {
    type Error = String;

    fn try_from(def: ColorDef) -> std::result::Result<Self, Self::Error> {
        match def {
            ColorDef::Text(s) => s.parse(),
            ColorDef::Rgb([r, g, b]) => Ok(Color::rgb(r, g, b)),
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    }
}

impl Color {
    /// Opaque color from RGB values (0-255)
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Black color
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// White color
    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Self::black(),
            "white" => Self::white(),
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            "navy" => Self::rgb(0, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "darkgray" | "darkgrey" => Self::rgb(169, 169, 169),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "maroon" => Self::rgb(128, 0, 0),
            _ => return None,
        };
        Some(color)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("invalid color: {s}"));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| format!("invalid color: {s}"))
            };
            return match hex.len() {
                6 => Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
                // #RGB expands each digit: #f80 -> #ff8800
                3 => Ok(Color::rgb(
                    channel(0..1)? * 17,
                    channel(1..2)? * 17,
                    channel(2..3)? * 17,
                )),
                _ => Err(format!("invalid color: {s}")),
            };
        }
        Color::named(&value).ok_or_else(|| format!("unknown color name: {s}"))
    }
}

/// Settings for one text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFieldSpec {
    /// Top-left corner of the text line
    pub position: Point,

    /// Path to a TrueType/OpenType font file
    pub font: PathBuf,

    /// Font size (em size in pixels)
    pub size: f32,

    #[serde(default)]
    pub color: Color,
}

/// Where the photo is pasted on the front side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoSlot {
    pub position: Point,
    pub size: Size,
}

fn default_name_char_limit() -> usize {
    10
}

/// Layout of one badge face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideTemplate {
    /// Background image path
    pub background: PathBuf,

    /// Photo slot (front side only)
    #[serde(default)]
    pub photo: Option<PhotoSlot>,

    /// Names longer than this many characters are split into first/last
    #[serde(default = "default_name_char_limit")]
    pub name_char_limit: usize,

    /// Resolution written into the rendered PNG
    #[serde(default)]
    pub dpi: Option<f64>,

    /// Text field settings
    #[serde(default)]
    pub fields: BTreeMap<FieldKey, TextFieldSpec>,
}

impl SideTemplate {
    /// Get the settings for a text field
    pub fn field(&self, key: FieldKey) -> Option<&TextFieldSpec> {
        self.fields.get(&key)
    }
}

/// Named pair of front/back templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub front: SideTemplate,
    pub back: SideTemplate,
}

impl Preset {
    /// Get the template for a badge face
    pub fn side(&self, side: Side) -> &SideTemplate {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }
}

/// Presets in the order they appear in the configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presets {
    entries: Vec<(String, Preset)>,
}

impl Presets {
    /// Build from (name, preset) pairs, keeping the given order
    pub fn new(entries: Vec<(String, Preset)>) -> Self {
        Self { entries }
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, preset)| preset)
    }

    /// Name of the default preset (the first one)
    pub fn default_name(&self) -> Option<&str> {
        self.entries.first().map(|(name, _)| name.as_str())
    }

    /// Preset names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.entries.iter().map(|(name, preset)| (name.as_str(), preset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Presets {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PresetsVisitor;

        impl<'de> Visitor<'de> for PresetsVisitor {
            type Value = Presets;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of preset names to front/back templates")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Presets, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, Preset)> = Vec::new();
                while let Some((name, preset)) = map.next_entry::<String, Preset>()? {
                    if entries.iter().any(|(n, _)| *n == name) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate preset '{name}'"
                        )));
                    }
                    entries.push((name, preset));
                }
                Ok(Presets { entries })
            }
        }

        deserializer.deserialize_map(PresetsVisitor)
    }
}

impl Serialize for Presets {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, preset) in &self.entries {
            map.serialize_entry(name, preset)?;
        }
        map.end()
    }
}

fn default_error_log() -> PathBuf {
    PathBuf::from("error_logs/generation_errors.txt")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("Badge_output")
}

fn default_workers() -> usize {
    5
}

/// Batch run settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Number of rows rendered in parallel
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_front_prefix() -> String {
    "badge_front_".to_string()
}

fn default_back_prefix() -> String {
    "badge_back_".to_string()
}

fn default_pdf_output() -> PathBuf {
    PathBuf::from("print/badges.pdf")
}

fn default_paper_width() -> f64 {
    210.0
}

fn default_paper_height() -> f64 {
    297.0
}

fn default_start_y() -> f64 {
    10.0
}

fn default_badge_width() -> f64 {
    54.0
}

fn default_gap() -> f64 {
    5.0
}

/// Print sheet layout, all lengths in millimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfLayout {
    /// Folder scanned for rendered badges
    #[serde(default = "default_output_folder")]
    pub badge_folder: PathBuf,

    #[serde(default = "default_front_prefix", alias = "badge_front_prefix")]
    pub front_prefix: String,

    #[serde(default = "default_back_prefix", alias = "badge_back_prefix")]
    pub back_prefix: String,

    /// Output document path
    #[serde(default = "default_pdf_output", alias = "output_pdf")]
    pub output: PathBuf,

    #[serde(default = "default_paper_width")]
    pub paper_width: f64,

    #[serde(default = "default_paper_height")]
    pub paper_height: f64,

    /// Top margin of every badge column
    #[serde(default = "default_start_y", alias = "start_y_position")]
    pub start_y: f64,

    /// Width reserved for one badge column
    #[serde(default = "default_badge_width")]
    pub badge_width: f64,

    /// Horizontal gap between columns, also the left margin
    #[serde(default = "default_gap", alias = "group_spacing_x")]
    pub column_gap: f64,

    /// Vertical gap between a front and its back
    #[serde(default = "default_gap", alias = "group_spacing_y")]
    pub row_gap: f64,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            badge_folder: default_output_folder(),
            front_prefix: default_front_prefix(),
            back_prefix: default_back_prefix(),
            output: default_pdf_output(),
            paper_width: default_paper_width(),
            paper_height: default_paper_height(),
            start_y: default_start_y(),
            badge_width: default_badge_width(),
            column_gap: default_gap(),
            row_gap: default_gap(),
        }
    }
}

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub presets: Presets,

    /// Batch error log path
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,

    /// Folder rendered badges are written to
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub pdf: PdfLayout,
}

impl Config {
    /// Look up a preset, failing with `PresetNotFound`
    pub fn preset(&self, name: &str) -> crate::Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| crate::TemplateError::PresetNotFound(name.to_string()))
    }
}
