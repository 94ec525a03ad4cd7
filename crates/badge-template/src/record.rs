//! Badge records: user input merged with a side template

use crate::{FieldKey, RenderError, Side, SideTemplate};
use std::path::PathBuf;

/// Literal prefix carried by every employee identifier on a badge
pub const ID_PREFIX: &str = "No. ";

/// Format a raw employee number as a badge identifier (`No. <ID>`)
///
/// The value is trimmed and upper-cased; the prefix is always added.
pub fn format_employee_id(raw: &str) -> String {
    format!("{ID_PREFIX}{}", raw.trim().to_uppercase())
}

/// Field values for one badge face, before merging with a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeInput {
    pub name: String,
    /// Identifier including the `No. ` prefix
    pub id: String,
    pub department: String,
    pub position: String,
    pub photo: Option<PathBuf>,
}

impl BadgeInput {
    /// Build an input from raw values
    ///
    /// Values are trimmed. `id` is used as given; use [`format_employee_id`]
    /// to build it from a raw employee number.
    pub fn new(
        name: impl AsRef<str>,
        id: impl AsRef<str>,
        department: impl AsRef<str>,
        position: impl AsRef<str>,
    ) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            id: id.as_ref().trim().to_string(),
            department: department.as_ref().trim().to_string(),
            position: position.as_ref().trim().to_string(),
            photo: None,
        }
    }

    /// Attach a photo; an empty path means no photo
    pub fn with_photo(mut self, photo: impl Into<PathBuf>) -> Self {
        let photo = photo.into();
        self.photo = if photo.as_os_str().is_empty() {
            None
        } else {
            Some(photo)
        };
        self
    }
}

/// Resolved data for one render
///
/// Borrows its template: rendering never mutates a preset.
#[derive(Debug, Clone)]
pub struct BadgeRecord<'a> {
    pub side: Side,
    pub template: &'a SideTemplate,
    pub name: String,
    pub id: String,
    pub department: String,
    pub position: String,
    pub photo: Option<PathBuf>,
}

impl SideTemplate {
    /// Merge user input onto this template, producing a new record
    pub fn merge(&self, side: Side, input: BadgeInput) -> BadgeRecord<'_> {
        BadgeRecord {
            side,
            template: self,
            name: input.name,
            id: input.id,
            department: input.department,
            position: input.position,
            photo: input.photo,
        }
    }
}

impl BadgeRecord<'_> {
    /// Identifier with the `No. ` prefix removed
    pub fn bare_id(&self) -> &str {
        self.id.strip_prefix(ID_PREFIX).unwrap_or(&self.id)
    }

    /// Text fields to draw, in drawing order
    pub fn text_fields(&self) -> Result<Vec<(FieldKey, &str)>, RenderError> {
        let mut fields = match NameLayout::resolve(&self.name, self.template.name_char_limit)? {
            NameLayout::Single(name) => vec![(FieldKey::Name, name)],
            NameLayout::Split { first, last } => {
                vec![(FieldKey::FirstName, first), (FieldKey::LastName, last)]
            }
        };
        fields.push((FieldKey::Id, self.id.as_str()));
        fields.push((FieldKey::Department, self.department.as_str()));
        fields.push((FieldKey::Position, self.position.as_str()));
        Ok(fields)
    }
}

/// How a name is laid out on the badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLayout<'a> {
    /// Fits on one line
    Single(&'a str),
    /// Split at the first space
    Split { first: &'a str, last: &'a str },
}

impl<'a> NameLayout<'a> {
    /// Decide the layout of `name` for a character limit
    ///
    /// Names longer than `limit` characters are split at the first space.
    /// A long name without a space cannot be laid out.
    pub fn resolve(name: &'a str, limit: usize) -> Result<Self, RenderError> {
        if name.chars().count() <= limit {
            return Ok(NameLayout::Single(name));
        }
        match name.split_once(' ') {
            Some((first, last)) => Ok(NameLayout::Split { first, last }),
            None => Err(RenderError::NameTooLong {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn template() -> SideTemplate {
        SideTemplate {
            background: PathBuf::from("front.png"),
            photo: None,
            name_char_limit: 10,
            dpi: None,
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_format_employee_id() {
        assert_eq!(format_employee_id(" ab12 "), "No. AB12");
        assert_eq!(format_employee_id("1023"), "No. 1023");
        assert_eq!(format_employee_id("no. 1023"), "No. NO. 1023");
    }

    #[test]
    fn test_name_split_over_limit() {
        assert_eq!(
            NameLayout::resolve("Jonathan Smith", 10).unwrap(),
            NameLayout::Split {
                first: "Jonathan",
                last: "Smith"
            }
        );
    }

    #[test]
    fn test_name_split_keeps_rest_after_first_space() {
        assert_eq!(
            NameLayout::resolve("Mary Ann Richardson", 10).unwrap(),
            NameLayout::Split {
                first: "Mary",
                last: "Ann Richardson"
            }
        );
    }

    #[test]
    fn test_name_limit_counts_characters() {
        // 10 characters, more than 10 bytes
        assert_eq!(
            NameLayout::resolve("สมชายใจดีม", 10).unwrap(),
            NameLayout::Single("สมชายใจดีม")
        );
        assert_eq!(NameLayout::resolve("Jane Doe", 10).unwrap(), NameLayout::Single("Jane Doe"));
    }

    #[test]
    fn test_name_too_long() {
        let err = NameLayout::resolve("Jonathansmith", 10).unwrap_err();
        assert!(matches!(err, RenderError::NameTooLong { ref name } if name == "Jonathansmith"));
    }

    #[test]
    fn test_merge_does_not_touch_template() {
        let template = template();
        let input = BadgeInput::new(" Jane ", "No. 7", "Ops", "Lead").with_photo("");
        let record = template.merge(Side::Front, input);
        assert_eq!(record.name, "Jane");
        assert_eq!(record.bare_id(), "7");
        assert!(record.photo.is_none());
        assert_eq!(template, self::template());
    }

    #[test]
    fn test_text_fields_after_split() {
        let template = template();
        let input = BadgeInput::new("Jonathan Smith", "No. 1023", "", "Developer");
        let record = template.merge(Side::Back, input);
        let keys: Vec<FieldKey> = record.text_fields().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                FieldKey::FirstName,
                FieldKey::LastName,
                FieldKey::Id,
                FieldKey::Department,
                FieldKey::Position
            ]
        );
    }
}
