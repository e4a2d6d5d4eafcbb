//! # Position Addresses
//!
//! A composite coordinate locating any element of the transcript tree with a
//! single value. The four fields name an index at each nesting level, largest
//! to smallest: chapter, section, paragraph, phrase.
//!
//! A field below the addressed level is left negative (canonically
//! [`UNSET`]). An address is valid only when the nonnegative fields form a
//! non-empty prefix and the negative fields the complementary suffix — there
//! is no way to address "the first paragraph of an unaddressed section".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical value for a field below the addressed level.
pub const UNSET: i32 = -1;

/// One of the four nesting levels of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Chapter,
    Section,
    Paragraph,
    Phrase,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Chapter => "chapter",
            Level::Section => "section",
            Level::Paragraph => "paragraph",
            Level::Phrase => "phrase",
        };
        f.write_str(name)
    }
}

/// Composite four-level coordinate into a document tree.
///
/// Nonnegative fields are absolute indices; negative fields mark levels the
/// address does not reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionAddress {
    pub chapter: i32,
    pub section: i32,
    pub paragraph: i32,
    pub phrase: i32,
}

impl PositionAddress {
    /// Address with no level set; never valid.
    pub const INVALID: PositionAddress = PositionAddress {
        chapter: UNSET,
        section: UNSET,
        paragraph: UNSET,
        phrase: UNSET,
    };

    pub fn new(chapter: i32, section: i32, paragraph: i32, phrase: i32) -> Self {
        Self {
            chapter,
            section,
            paragraph,
            phrase,
        }
    }

    /// Address of a chapter.
    pub fn chapter(chapter: usize) -> Self {
        Self::new(chapter as i32, UNSET, UNSET, UNSET)
    }

    /// Address of a section within a chapter.
    pub fn section(chapter: usize, section: usize) -> Self {
        Self::new(chapter as i32, section as i32, UNSET, UNSET)
    }

    /// Address of a paragraph within a section.
    pub fn paragraph(chapter: usize, section: usize, paragraph: usize) -> Self {
        Self::new(chapter as i32, section as i32, paragraph as i32, UNSET)
    }

    /// Address of a phrase within a paragraph.
    pub fn phrase(chapter: usize, section: usize, paragraph: usize, phrase: usize) -> Self {
        Self::new(
            chapter as i32,
            section as i32,
            paragraph as i32,
            phrase as i32,
        )
    }

    pub fn to_array(self) -> [i32; 4] {
        [self.chapter, self.section, self.paragraph, self.phrase]
    }

    /// An address is valid when the set fields form a non-empty prefix and
    /// the unset fields the complementary suffix.
    pub fn is_valid(self) -> bool {
        let fields = self.to_array();
        let set = fields.iter().take_while(|v| **v >= 0).count();
        let unset = fields.iter().rev().take_while(|v| **v < 0).count();
        set >= 1 && set + unset == fields.len()
    }

    pub fn is_chapter(self) -> bool {
        self.is_valid() && self.chapter >= 0
    }

    pub fn is_section(self) -> bool {
        self.is_valid() && self.section >= 0
    }

    pub fn is_paragraph(self) -> bool {
        self.is_valid() && self.paragraph >= 0
    }

    pub fn is_phrase(self) -> bool {
        self.is_valid() && self.phrase >= 0
    }

    /// Deepest addressed level, or `None` for an invalid address.
    pub fn level(self) -> Option<Level> {
        if !self.is_valid() {
            return None;
        }
        if self.phrase >= 0 {
            Some(Level::Phrase)
        } else if self.paragraph >= 0 {
            Some(Level::Paragraph)
        } else if self.section >= 0 {
            Some(Level::Section)
        } else {
            Some(Level::Chapter)
        }
    }
}

impl fmt::Display for PositionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "invalid(")?;
        }
        write!(
            f,
            "{};{};{};{}",
            self.chapter, self.section, self.paragraph, self.phrase
        )?;
        if !self.is_valid() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_suffix_validity() {
        assert!(PositionAddress::new(0, -1, -1, -1).is_valid());
        assert!(PositionAddress::new(0, 0, -1, -1).is_valid());
        assert!(!PositionAddress::new(-1, 0, -1, -1).is_valid());
        assert!(!PositionAddress::new(0, -1, 0, -1).is_valid());
        assert!(!PositionAddress::INVALID.is_valid());
        assert!(PositionAddress::new(2, 0, 3, 7).is_valid());
    }

    #[test]
    fn test_level_predicates() {
        let addr = PositionAddress::paragraph(0, 1, 2);
        assert!(addr.is_chapter());
        assert!(addr.is_section());
        assert!(addr.is_paragraph());
        assert!(!addr.is_phrase());
        assert_eq!(addr.level(), Some(Level::Paragraph));

        // A hole in the middle invalidates every predicate.
        let hole = PositionAddress::new(0, -1, 0, -1);
        assert!(!hole.is_chapter());
        assert_eq!(hole.level(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PositionAddress::section(1, 2).to_string(), "1;2;-1;-1");
        assert_eq!(
            PositionAddress::new(0, -1, 0, -1).to_string(),
            "invalid(0;-1;0;-1)"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let addr = PositionAddress::phrase(0, 1, 2, 3);
        let json = serde_json::to_string(&addr).unwrap();
        let back: PositionAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
