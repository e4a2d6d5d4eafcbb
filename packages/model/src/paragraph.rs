//! # Paragraphs
//!
//! A paragraph groups the phrases spoken in one stretch by one speaker. Its
//! begin/end times may be unknown; navigation derives them from child
//! phrases or neighbouring paragraphs (see the `navigation` module) rather
//! than inventing values.
//!
//! The speaker link is non-owning and never absent: an unassigned paragraph
//! reports the process-wide default speaker. Serialized documents store the
//! link as a small per-document serial id which a post-load pass resolves
//! back to pool speakers.

use crate::address::Level;
use crate::attributes::AttributeMap;
use crate::error::{FlagParseError, InvariantError};
use crate::list::{ChildLink, TrackedList};
use crate::phrase::Phrase;
use crate::speaker::{Speaker, SpeakerRef, UNASSIGNED_SPEAKER_ID};
use crate::timecode::Timecode;
use crate::tracker::UpdateTracker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::time::Duration;

/// Closed set of audio-condition flags on a paragraph.
///
/// Renders as pipe-joined labels (`noise|music`) and parses them back
/// case-insensitively; the empty set renders as `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParagraphFlags(u8);

impl ParagraphFlags {
    pub const NONE: ParagraphFlags = ParagraphFlags(0);
    pub const NOISE: ParagraphFlags = ParagraphFlags(1);
    pub const MUSIC: ParagraphFlags = ParagraphFlags(1 << 1);
    pub const NONSPEECH: ParagraphFlags = ParagraphFlags(1 << 2);
    pub const NARROWBAND: ParagraphFlags = ParagraphFlags(1 << 3);

    const LABELS: &'static [(ParagraphFlags, &'static str)] = &[
        (Self::NOISE, "noise"),
        (Self::MUSIC, "music"),
        (Self::NONSPEECH, "nonspeech"),
        (Self::NARROWBAND, "narrowband"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: ParagraphFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: ParagraphFlags) -> ParagraphFlags {
        ParagraphFlags(self.0 | other.0)
    }

    pub fn without(self, other: ParagraphFlags) -> ParagraphFlags {
        ParagraphFlags(self.0 & !other.0)
    }
}

impl BitOr for ParagraphFlags {
    type Output = ParagraphFlags;

    fn bitor(self, rhs: ParagraphFlags) -> ParagraphFlags {
        self.with(rhs)
    }
}

impl BitOrAssign for ParagraphFlags {
    fn bitor_assign(&mut self, rhs: ParagraphFlags) {
        *self = self.with(rhs);
    }
}

impl fmt::Display for ParagraphFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, label) in Self::LABELS {
            if self.contains(*flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(label)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for ParagraphFlags {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, FlagParseError> {
        let mut flags = ParagraphFlags::NONE;
        for label in s.split('|') {
            let label = label.trim();
            if label.is_empty() || label.eq_ignore_ascii_case("none") {
                continue;
            }
            let flag = Self::LABELS
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(label))
                .map(|(flag, _)| *flag)
                .ok_or_else(|| FlagParseError {
                    label: label.to_string(),
                })?;
            flags |= flag;
        }
        Ok(flags)
    }
}

impl TryFrom<String> for ParagraphFlags {
    type Error = FlagParseError;

    fn try_from(value: String) -> Result<Self, FlagParseError> {
        value.parse()
    }
}

impl From<ParagraphFlags> for String {
    fn from(flags: ParagraphFlags) -> String {
        flags.to_string()
    }
}

/// One reversible scalar mutation of a [`Paragraph`].
#[derive(Debug, Clone)]
pub enum ParagraphChange {
    Begin { old: Timecode },
    End { old: Timecode },
    Flags { old: ParagraphFlags },
    Language { old: Option<String> },
    Speaker { old: Option<SpeakerRef> },
    Attributes { old: AttributeMap },
}

#[derive(Debug)]
pub struct Paragraph {
    phrases: TrackedList<Phrase>,
    begin: Timecode,
    end: Timecode,
    flags: ParagraphFlags,
    language: Option<String>,
    speaker: Option<SpeakerRef>,
    serial_speaker_id: i32,
    attributes: AttributeMap,
    parent_index: Option<usize>,
    updates: UpdateTracker<ParagraphChange>,
}

impl Paragraph {
    /// Creates a detached paragraph with unknown times and no speaker.
    pub fn new() -> Self {
        Self {
            phrases: TrackedList::new(Level::Phrase),
            begin: Timecode::UNKNOWN,
            end: Timecode::UNKNOWN,
            flags: ParagraphFlags::NONE,
            language: None,
            speaker: None,
            serial_speaker_id: UNASSIGNED_SPEAKER_ID,
            attributes: AttributeMap::new(),
            parent_index: None,
            updates: UpdateTracker::new(),
        }
    }

    /// Builds a paragraph from phrases, adopting the first phrase's begin
    /// and the last phrase's end.
    pub fn from_phrases(phrases: impl IntoIterator<Item = Phrase>) -> Self {
        let mut paragraph = Self::new();
        for phrase in phrases {
            paragraph.phrases.push(phrase);
        }
        if let (Some(first), Some(last)) = (paragraph.phrases.first(), paragraph.phrases.last()) {
            paragraph.begin = first.begin();
            paragraph.end = last.end();
        }
        paragraph
    }

    /// Deep copy: clones phrases and scalars, shares the speaker reference,
    /// detaches from any parent.
    pub fn duplicate(&self) -> Paragraph {
        let mut copy = Self::new();
        for phrase in self.phrases.iter() {
            copy.phrases.push(phrase.duplicate());
        }
        copy.begin = self.begin;
        copy.end = self.end;
        copy.flags = self.flags;
        copy.language = self.language.clone();
        copy.speaker = self.speaker.clone();
        copy.serial_speaker_id = self.serial_speaker_id;
        copy.attributes = self.attributes.clone();
        copy
    }

    pub fn phrases(&self) -> &TrackedList<Phrase> {
        &self.phrases
    }

    pub fn phrases_mut(&mut self) -> &mut TrackedList<Phrase> {
        &mut self.phrases
    }

    /// Explicitly stored begin; possibly unknown. See
    /// `Document::resolve_begin` for the derived value.
    pub fn begin(&self) -> Timecode {
        self.begin
    }

    pub fn set_begin(&mut self, value: Timecode) {
        let old = mem::replace(&mut self.begin, value);
        self.updates.record(ParagraphChange::Begin { old });
    }

    pub fn end(&self) -> Timecode {
        self.end
    }

    pub fn set_end(&mut self, value: Timecode) {
        let old = mem::replace(&mut self.end, value);
        self.updates.record(ParagraphChange::End { old });
    }

    pub fn flags(&self) -> ParagraphFlags {
        self.flags
    }

    pub fn set_flags(&mut self, value: ParagraphFlags) {
        let old = mem::replace(&mut self.flags, value);
        self.updates.record(ParagraphChange::Flags { old });
    }

    /// Explicit language tag, or the speaker's default language when none
    /// is set. Stored uppercase.
    pub fn language(&self) -> String {
        match &self.language {
            Some(lang) => lang.clone(),
            None => self.speaker().borrow().default_language().to_string(),
        }
    }

    pub fn set_language(&mut self, value: Option<String>) {
        let value = value.map(|v| v.to_uppercase());
        let old = mem::replace(&mut self.language, value);
        self.updates.record(ParagraphChange::Language { old });
    }

    /// The referenced speaker; the default-speaker sentinel when none was
    /// assigned. Never absent.
    pub fn speaker(&self) -> SpeakerRef {
        self.speaker.clone().unwrap_or_else(Speaker::default_speaker)
    }

    pub fn set_speaker(&mut self, speaker: SpeakerRef) {
        let old = self.speaker.replace(speaker);
        self.updates.record(ParagraphChange::Speaker { old });
    }

    /// Serial id linking this paragraph to a pool speaker across the
    /// load/save boundary. With a speaker attached, the speaker's own
    /// serial id wins.
    pub fn serial_speaker_id(&self) -> i32 {
        match &self.speaker {
            Some(speaker) => speaker.borrow().serial_id(),
            None => self.serial_speaker_id,
        }
    }

    /// Stores the serial id read from a document. Only legal while no
    /// speaker is attached.
    pub fn set_serial_speaker_id(&mut self, id: i32) -> Result<(), InvariantError> {
        if self.speaker.is_some() && self.serial_speaker_id != UNASSIGNED_SPEAKER_ID {
            return Err(InvariantError::SerialIdWhileSpeakerAttached);
        }
        self.serial_speaker_id = id;
        Ok(())
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(ParagraphChange::Attributes { old });
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut next = self.attributes.clone();
        next.insert(key, value);
        self.set_attributes(next);
    }

    /// Concatenated text of all phrases.
    pub fn text(&self) -> String {
        self.phrases.iter().map(Phrase::text).collect()
    }

    /// Concatenated phonetic transcription of all phrases.
    pub fn phonetics(&self) -> String {
        self.phrases.iter().map(Phrase::phonetics).collect()
    }

    /// Zero when either stored endpoint is unknown.
    pub fn duration(&self) -> Duration {
        self.begin.span_to(self.end)
    }

    pub fn updates(&self) -> &UpdateTracker<ParagraphChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<ParagraphChange> {
        &mut self.updates
    }

    /// Restores the previous value carried by `change`.
    pub fn revert(&mut self, change: ParagraphChange) {
        match change {
            ParagraphChange::Begin { old } => self.set_begin(old),
            ParagraphChange::End { old } => self.set_end(old),
            ParagraphChange::Flags { old } => self.set_flags(old),
            ParagraphChange::Language { old } => {
                let current = mem::replace(&mut self.language, old);
                self.updates
                    .record(ParagraphChange::Language { old: current });
            }
            ParagraphChange::Speaker { old } => {
                let current = mem::replace(&mut self.speaker, old);
                self.updates
                    .record(ParagraphChange::Speaker { old: current });
            }
            ParagraphChange::Attributes { old } => self.set_attributes(old),
        }
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildLink for Paragraph {
    fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    fn link(&mut self, index: usize) {
        self.parent_index = Some(index);
    }

    fn unlink(&mut self) {
        self.parent_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_render_and_parse() {
        let flags = ParagraphFlags::NOISE | ParagraphFlags::MUSIC;
        assert_eq!(flags.to_string(), "noise|music");
        assert_eq!("noise|music".parse::<ParagraphFlags>().unwrap(), flags);
        assert_eq!("Noise | MUSIC".parse::<ParagraphFlags>().unwrap(), flags);
        assert_eq!(ParagraphFlags::NONE.to_string(), "none");
        assert_eq!(
            "none".parse::<ParagraphFlags>().unwrap(),
            ParagraphFlags::NONE
        );
        assert_eq!("".parse::<ParagraphFlags>().unwrap(), ParagraphFlags::NONE);
    }

    #[test]
    fn test_flags_reject_unknown_label() {
        let err = "noise|applause".parse::<ParagraphFlags>().unwrap_err();
        assert_eq!(err.label, "applause");
    }

    #[test]
    fn test_text_concatenates_phrases() {
        let paragraph = Paragraph::from_phrases([
            Phrase::timed(Timecode::from_millis(0), Timecode::from_millis(100), "a "),
            Phrase::timed(Timecode::from_millis(100), Timecode::from_millis(200), "b"),
        ]);
        assert_eq!(paragraph.text(), "a b");
    }

    #[test]
    fn test_from_phrases_adopts_boundary_times() {
        let paragraph = Paragraph::from_phrases([
            Phrase::timed(Timecode::from_millis(10), Timecode::from_millis(20), "x"),
            Phrase::timed(Timecode::from_millis(20), Timecode::from_millis(40), "y"),
        ]);
        assert_eq!(paragraph.begin(), Timecode::from_millis(10));
        assert_eq!(paragraph.end(), Timecode::from_millis(40));
    }

    #[test]
    fn test_unassigned_speaker_is_the_sentinel() {
        let paragraph = Paragraph::new();
        assert!(Speaker::is_default(&paragraph.speaker()));
    }

    #[test]
    fn test_language_falls_back_to_speaker_default() {
        let mut paragraph = Paragraph::new();
        let speaker = Speaker::named("Jan", "Novak").into_ref();
        speaker.borrow_mut().set_default_language("DE");
        paragraph.set_speaker(speaker);
        assert_eq!(paragraph.language(), "DE");

        paragraph.set_language(Some("en".to_string()));
        assert_eq!(paragraph.language(), "EN");

        paragraph.set_language(None);
        assert_eq!(paragraph.language(), "DE");
    }

    #[test]
    fn test_serial_id_locked_while_speaker_attached() {
        let mut paragraph = Paragraph::new();
        paragraph.set_serial_speaker_id(3).unwrap();
        paragraph.set_speaker(Speaker::new().into_ref());
        assert_eq!(
            paragraph.set_serial_speaker_id(4),
            Err(InvariantError::SerialIdWhileSpeakerAttached)
        );
    }

    #[test]
    fn test_attached_speaker_serial_wins() {
        let mut paragraph = Paragraph::new();
        paragraph.set_serial_speaker_id(7).unwrap();
        assert_eq!(paragraph.serial_speaker_id(), 7);

        let speaker = Speaker::new().into_ref();
        speaker.borrow_mut().set_serial_id(42);
        paragraph.set_speaker(speaker);
        assert_eq!(paragraph.serial_speaker_id(), 42);
    }
}
