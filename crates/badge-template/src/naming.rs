//! Badge file naming
//!
//! Rendered badges are written as `badge_{side}_{id}.png`. The PDF sheet
//! pairs fronts and backs by parsing the same names back into a key.

use crate::{Side, ID_PREFIX};

/// Characters that may not appear in a file name
pub const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// File extension of rendered badges
pub const SUFFIX: &str = ".png";

/// Number of characters stripped from the end of a name to get its key
pub const SUFFIX_LEN: usize = 4;

/// Replace every illegal file name character with `_`
pub fn sanitize_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Identifier used in file names: prefix stripped, then sanitized
pub fn safe_identifier(id: &str) -> String {
    sanitize_filename(id.strip_prefix(ID_PREFIX).unwrap_or(id))
}

/// File name of a rendered badge
pub fn badge_file_name(side: Side, id: &str) -> String {
    format!("badge_{side}_{}{SUFFIX}", safe_identifier(id))
}

/// A badge file name parsed into its side and join key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeFileName {
    pub side: Side,
    pub key: String,
}

impl BadgeFileName {
    /// Parse a file name against the front/back prefixes
    ///
    /// The key is what remains after removing the prefix and the last
    /// [`SUFFIX_LEN`] characters, whatever they are. A name too short to hold
    /// both yields an empty key. Returns `None` when neither prefix matches.
    pub fn parse(file_name: &str, front_prefix: &str, back_prefix: &str) -> Option<Self> {
        let (side, rest) = if let Some(rest) = file_name.strip_prefix(front_prefix) {
            (Side::Front, rest)
        } else if let Some(rest) = file_name.strip_prefix(back_prefix) {
            (Side::Back, rest)
        } else {
            return None;
        };

        let keep = rest.chars().count().saturating_sub(SUFFIX_LEN);
        let key = rest.chars().take(keep).collect();
        Some(Self { side, key })
    }

    /// File name with the default prefixes
    pub fn file_name(&self) -> String {
        format!("badge_{}_{}{SUFFIX}", self.side, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("A/B:C"), "A_B_C");
        assert_eq!(sanitize_filename(r#"<>:"/\|?*"#), "_________");
        assert_eq!(sanitize_filename("plain-id_1"), "plain-id_1");
    }

    #[test]
    fn test_badge_file_name() {
        assert_eq!(badge_file_name(Side::Front, "No. 1023"), "badge_front_1023.png");
        assert_eq!(badge_file_name(Side::Back, "No. HR/7"), "badge_back_HR_7.png");
        assert_eq!(badge_file_name(Side::Back, "X:1"), "badge_back_X_1.png");
    }

    #[test]
    fn test_parse_file_name() {
        let parsed = BadgeFileName::parse("badge_front_1023.png", "badge_front_", "badge_back_");
        assert_eq!(
            parsed,
            Some(BadgeFileName {
                side: Side::Front,
                key: "1023".to_string()
            })
        );
        let parsed = BadgeFileName::parse("badge_back_A_1.png", "badge_front_", "badge_back_").unwrap();
        assert_eq!(parsed.side, Side::Back);
        assert_eq!(parsed.key, "A_1");
        assert_eq!(parsed.file_name(), "badge_back_A_1.png");
    }

    #[test]
    fn test_parse_strips_fixed_suffix_length() {
        let parsed = BadgeFileName::parse("badge_front_1023.jpeg", "badge_front_", "badge_back_").unwrap();
        assert_eq!(parsed.key, "1023.");

        let parsed = BadgeFileName::parse("badge_front_ab", "badge_front_", "badge_back_").unwrap();
        assert_eq!(parsed.key, "");
    }

    #[test]
    fn test_parse_multibyte_key() {
        let parsed = BadgeFileName::parse("badge_back_สมชาย.png", "badge_front_", "badge_back_").unwrap();
        assert_eq!(parsed.key, "สมชาย");
    }

    #[test]
    fn test_parse_unrelated_file() {
        assert_eq!(BadgeFileName::parse("notes.txt", "badge_front_", "badge_back_"), None);
    }
}
