//! # Document
//!
//! Root of the transcript tree: an ordered sequence of chapters, the media
//! reference, free-form attributes, and the speaker pool.
//!
//! ## Addressed access
//!
//! Any element can be read, replaced, inserted, or removed through a single
//! [`PositionAddress`]: the document validates the address, then delegates
//! level by level to the indicated child container. Malformed or
//! out-of-range addresses fail with [`AddressError`] naming the offending
//! level.
//!
//! ## Load boundary
//!
//! The persistence layer builds entities bottom-up through the same
//! mutation surface as any caller, bracketed by
//! [`Document::begin_loading`]/[`Document::end_loading`] so population
//! leaves no undo noise, and finishes with one
//! [`Document::assign_speakers_by_serial_id`] pass that resolves the
//! per-document serial ids stored on paragraphs back to pool speakers.

use crate::address::{Level, PositionAddress};
use crate::attributes::AttributeMap;
use crate::chapter::Chapter;
use crate::error::AddressError;
use crate::list::{ChildLink, TrackedList};
use crate::paragraph::Paragraph;
use crate::phrase::Phrase;
use crate::pool::SpeakerPool;
use crate::section::Section;
use crate::speaker::{Speaker, SpeakerRef};
use crate::timecode::Timecode;
use crate::tracker::UpdateTracker;
use chrono::{DateTime, Utc};
use std::mem;
use std::rc::Rc;
use uuid::Uuid;

/// One reversible scalar mutation of a [`Document`].
#[derive(Debug, Clone)]
pub enum DocumentChange {
    MediaUri { old: Option<String> },
    Attributes { old: AttributeMap },
}

/// An owned element of any level, used as the payload of addressed writes.
#[derive(Debug)]
pub enum Element {
    Chapter(Chapter),
    Section(Section),
    Paragraph(Paragraph),
    Phrase(Phrase),
}

impl Element {
    pub fn level(&self) -> Level {
        match self {
            Element::Chapter(_) => Level::Chapter,
            Element::Section(_) => Level::Section,
            Element::Paragraph(_) => Level::Paragraph,
            Element::Phrase(_) => Level::Phrase,
        }
    }
}

/// A borrowed element of any level, as resolved by an addressed read.
#[derive(Debug)]
pub enum ElementRef<'a> {
    Chapter(&'a Chapter),
    Section(&'a Section),
    Paragraph(&'a Paragraph),
    Phrase(&'a Phrase),
}

/// Mutably borrowed element of any level.
#[derive(Debug)]
pub enum ElementMut<'a> {
    Chapter(&'a mut Chapter),
    Section(&'a mut Section),
    Paragraph(&'a mut Paragraph),
    Phrase(&'a mut Phrase),
}

#[derive(Debug)]
pub struct Document {
    document_id: String,
    created: DateTime<Utc>,
    media_uri: Option<String>,
    attributes: AttributeMap,
    chapters: TrackedList<Chapter>,
    speakers: SpeakerPool,
    updates: UpdateTracker<DocumentChange>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            document_id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            media_uri: None,
            attributes: AttributeMap::new(),
            chapters: TrackedList::new(Level::Chapter),
            speakers: SpeakerPool::new(),
            updates: UpdateTracker::new(),
        }
    }

    /// Deep copy: duplicated chapters (sharing speaker references, like the
    /// originals) and a deep-copied speaker pool, under a fresh document id.
    pub fn duplicate(&self) -> Document {
        let mut copy = Document::new();
        copy.created = self.created;
        copy.media_uri = self.media_uri.clone();
        copy.attributes = self.attributes.clone();
        copy.begin_loading();
        for chapter in self.chapters.iter() {
            copy.chapters.push(chapter.duplicate());
        }
        copy.end_loading();
        copy.speakers = self.speakers.deep_copy();
        copy
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn set_document_id(&mut self, id: impl Into<String>) {
        self.document_id = id.into();
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn set_created(&mut self, created: DateTime<Utc>) {
        self.created = created;
    }

    /// Reference to the media this document transcribes.
    pub fn media_uri(&self) -> Option<&str> {
        self.media_uri.as_deref()
    }

    pub fn set_media_uri(&mut self, value: Option<String>) {
        let old = mem::replace(&mut self.media_uri, value);
        self.updates.record(DocumentChange::MediaUri { old });
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(DocumentChange::Attributes { old });
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut next = self.attributes.clone();
        next.insert(key, value);
        self.set_attributes(next);
    }

    pub fn chapters(&self) -> &TrackedList<Chapter> {
        &self.chapters
    }

    pub fn chapters_mut(&mut self) -> &mut TrackedList<Chapter> {
        &mut self.chapters
    }

    pub fn updates(&self) -> &UpdateTracker<DocumentChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<DocumentChange> {
        &mut self.updates
    }

    /// Restores the previous value carried by `change`.
    pub fn revert(&mut self, change: DocumentChange) {
        match change {
            DocumentChange::MediaUri { old } => self.set_media_uri(old),
            DocumentChange::Attributes { old } => self.set_attributes(old),
        }
    }

    // ----- flat traversal ---------------------------------------------------

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.chapters.iter().flat_map(|c| c.sections().iter())
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.sections().flat_map(|s| s.paragraphs().iter())
    }

    pub fn phrases(&self) -> impl Iterator<Item = &Phrase> {
        self.paragraphs().flat_map(|p| p.phrases().iter())
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.chapters
            .iter_mut()
            .flat_map(|chapter| chapter.sections_mut().iter_mut())
            .flat_map(|section| section.paragraphs_mut().iter_mut())
    }

    /// Concatenated text of the whole document, one line per container.
    pub fn inner_text(&self) -> String {
        let mut text = String::new();
        for chapter in self.chapters.iter() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&chapter.inner_text());
        }
        text
    }

    // ----- last-container appends ------------------------------------------

    pub fn append_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Appends to the last chapter.
    pub fn append_section(&mut self, section: Section) -> Result<(), AddressError> {
        match self.chapters.last_mut() {
            Some(chapter) => {
                chapter.sections_mut().push(section);
                Ok(())
            }
            None => Err(empty_level(Level::Chapter)),
        }
    }

    /// Appends to the last section of the last chapter.
    pub fn append_paragraph(&mut self, paragraph: Paragraph) -> Result<(), AddressError> {
        let chapter = self.chapters.last_mut().ok_or(empty_level(Level::Chapter))?;
        match chapter.sections_mut().last_mut() {
            Some(section) => {
                section.paragraphs_mut().push(paragraph);
                Ok(())
            }
            None => Err(empty_level(Level::Section)),
        }
    }

    /// Appends to the last paragraph of the last section of the last chapter.
    pub fn append_phrase(&mut self, phrase: Phrase) -> Result<(), AddressError> {
        let chapter = self.chapters.last_mut().ok_or(empty_level(Level::Chapter))?;
        let section = chapter
            .sections_mut()
            .last_mut()
            .ok_or(empty_level(Level::Section))?;
        match section.paragraphs_mut().last_mut() {
            Some(paragraph) => {
                paragraph.phrases_mut().push(phrase);
                Ok(())
            }
            None => Err(empty_level(Level::Paragraph)),
        }
    }

    // ----- addressed access -------------------------------------------------

    /// Resolves an address to the element at its deepest populated level.
    pub fn element_at(&self, address: PositionAddress) -> Result<ElementRef<'_>, AddressError> {
        let level = address
            .level()
            .ok_or(AddressError::Invalid { address })?;
        let chapter = fetch(&self.chapters, address.chapter)?;
        if level == Level::Chapter {
            return Ok(ElementRef::Chapter(chapter));
        }
        let section = fetch(chapter.sections(), address.section)?;
        if level == Level::Section {
            return Ok(ElementRef::Section(section));
        }
        let paragraph = fetch(section.paragraphs(), address.paragraph)?;
        if level == Level::Paragraph {
            return Ok(ElementRef::Paragraph(paragraph));
        }
        Ok(ElementRef::Phrase(fetch(paragraph.phrases(), address.phrase)?))
    }

    pub fn element_at_mut(
        &mut self,
        address: PositionAddress,
    ) -> Result<ElementMut<'_>, AddressError> {
        let level = address
            .level()
            .ok_or(AddressError::Invalid { address })?;
        let chapter = fetch_mut(&mut self.chapters, address.chapter)?;
        if level == Level::Chapter {
            return Ok(ElementMut::Chapter(chapter));
        }
        let section = fetch_mut(chapter.sections_mut(), address.section)?;
        if level == Level::Section {
            return Ok(ElementMut::Section(section));
        }
        let paragraph = fetch_mut(section.paragraphs_mut(), address.paragraph)?;
        if level == Level::Paragraph {
            return Ok(ElementMut::Paragraph(paragraph));
        }
        Ok(ElementMut::Phrase(fetch_mut(
            paragraph.phrases_mut(),
            address.phrase,
        )?))
    }

    pub fn chapter_at(&self, address: PositionAddress) -> Result<&Chapter, AddressError> {
        if !address.is_chapter() {
            return Err(level_mismatch(address, Level::Chapter));
        }
        fetch(&self.chapters, address.chapter)
    }

    pub fn section_at(&self, address: PositionAddress) -> Result<&Section, AddressError> {
        if !address.is_section() {
            return Err(level_mismatch(address, Level::Section));
        }
        let chapter = fetch(&self.chapters, address.chapter)?;
        fetch(chapter.sections(), address.section)
    }

    pub fn paragraph_at(&self, address: PositionAddress) -> Result<&Paragraph, AddressError> {
        if !address.is_paragraph() {
            return Err(level_mismatch(address, Level::Paragraph));
        }
        let chapter = fetch(&self.chapters, address.chapter)?;
        let section = fetch(chapter.sections(), address.section)?;
        fetch(section.paragraphs(), address.paragraph)
    }

    pub fn phrase_at(&self, address: PositionAddress) -> Result<&Phrase, AddressError> {
        if !address.is_phrase() {
            return Err(level_mismatch(address, Level::Phrase));
        }
        let paragraph = self.paragraph_at(address)?;
        fetch(paragraph.phrases(), address.phrase)
    }

    /// Replaces the element at `address` with `element`; the payload kind
    /// must match the addressed level. Setting one past the end appends.
    pub fn set_element(
        &mut self,
        address: PositionAddress,
        element: Element,
    ) -> Result<(), AddressError> {
        let level = address
            .level()
            .ok_or(AddressError::Invalid { address })?;
        if element.level() != level {
            return Err(level_mismatch(address, element.level()));
        }
        tracing::debug!(%address, level = %level, "replace element");
        match element {
            Element::Chapter(chapter) => self.chapters.set(address.chapter as usize, chapter),
            Element::Section(section) => {
                let chapter = fetch_mut(&mut self.chapters, address.chapter)?;
                chapter.sections_mut().set(address.section as usize, section)
            }
            Element::Paragraph(paragraph) => {
                let section = parent_section_mut(&mut self.chapters, address)?;
                section
                    .paragraphs_mut()
                    .set(address.paragraph as usize, paragraph)
            }
            Element::Phrase(phrase) => {
                let paragraph = parent_paragraph_mut(&mut self.chapters, address)?;
                paragraph.phrases_mut().set(address.phrase as usize, phrase)
            }
        }
    }

    /// Inserts `element` at `address`, shifting trailing siblings; the
    /// payload kind must match the addressed level.
    pub fn insert_element(
        &mut self,
        address: PositionAddress,
        element: Element,
    ) -> Result<(), AddressError> {
        let level = address
            .level()
            .ok_or(AddressError::Invalid { address })?;
        if element.level() != level {
            return Err(level_mismatch(address, element.level()));
        }
        tracing::debug!(%address, level = %level, "insert element");
        match element {
            Element::Chapter(chapter) => self.chapters.insert(address.chapter as usize, chapter),
            Element::Section(section) => {
                let chapter = fetch_mut(&mut self.chapters, address.chapter)?;
                chapter
                    .sections_mut()
                    .insert(address.section as usize, section)
            }
            Element::Paragraph(paragraph) => {
                let section = parent_section_mut(&mut self.chapters, address)?;
                section
                    .paragraphs_mut()
                    .insert(address.paragraph as usize, paragraph)
            }
            Element::Phrase(phrase) => {
                let paragraph = parent_paragraph_mut(&mut self.chapters, address)?;
                paragraph
                    .phrases_mut()
                    .insert(address.phrase as usize, phrase)
            }
        }
    }

    /// Removes the element at the deepest populated level of `address`. The
    /// removed element travels in the `Removed` record on its container's
    /// tracker.
    pub fn remove_element(&mut self, address: PositionAddress) -> Result<(), AddressError> {
        let level = address
            .level()
            .ok_or(AddressError::Invalid { address })?;
        tracing::debug!(%address, level = %level, "remove element");
        match level {
            Level::Chapter => self.chapters.remove_at(address.chapter as usize),
            Level::Section => {
                let chapter = fetch_mut(&mut self.chapters, address.chapter)?;
                chapter.sections_mut().remove_at(address.section as usize)
            }
            Level::Paragraph => {
                let section = parent_section_mut(&mut self.chapters, address)?;
                section.paragraphs_mut().remove_at(address.paragraph as usize)
            }
            Level::Phrase => {
                let paragraph = parent_paragraph_mut(&mut self.chapters, address)?;
                paragraph.phrases_mut().remove_at(address.phrase as usize)
            }
        }
    }

    // ----- time queries -----------------------------------------------------

    /// Paragraphs whose stored interval covers `time`.
    pub fn paragraphs_at(&self, time: Timecode) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs().filter(move |p| {
            match (p.begin().millis(), p.end().millis(), time.millis()) {
                (Some(begin), Some(end), Some(t)) => begin <= t && end > t,
                _ => false,
            }
        })
    }

    /// Last paragraph, in document order, ending before `time`.
    pub fn last_paragraph_before(&self, time: Timecode) -> Option<&Paragraph> {
        let t = time.millis()?;
        self.paragraphs()
            .take_while(|p| p.end().millis().is_some_and(|end| end < t))
            .last()
    }

    /// Last paragraph, in document order, starting before `time`.
    pub fn last_paragraph_starting_before(&self, time: Timecode) -> Option<&Paragraph> {
        let t = time.millis()?;
        self.paragraphs()
            .take_while(|p| p.begin().millis().is_some_and(|begin| begin < t))
            .last()
    }

    // ----- text search ------------------------------------------------------

    /// Scans paragraphs from `from` (inclusive) for a substring match.
    ///
    /// Case-insensitive matching is ASCII-folded so the returned byte
    /// offsets stay valid in the original text. With `search_speakers` the
    /// scan matches speaker full names instead and reports a zero-length
    /// match at the paragraph.
    pub fn find_text(
        &self,
        from: PositionAddress,
        pattern: &str,
        case_sensitive: bool,
        search_speakers: bool,
    ) -> Result<Option<TextMatch>, AddressError> {
        let fold = |s: &str| {
            if case_sensitive {
                s.to_string()
            } else {
                s.to_ascii_lowercase()
            }
        };
        let needle = fold(pattern);

        for (address, paragraph) in self.paragraphs_from(from)? {
            if search_speakers {
                let name = paragraph.speaker().borrow().full_name();
                if name.to_ascii_lowercase().contains(&pattern.to_ascii_lowercase()) {
                    return Ok(Some(TextMatch {
                        address,
                        offset: 0,
                        len: 0,
                    }));
                }
            } else if let Some(offset) = fold(&paragraph.text()).find(&needle) {
                return Ok(Some(TextMatch {
                    address,
                    offset,
                    len: needle.len(),
                }));
            }
        }
        Ok(None)
    }

    // ----- speaker pool -----------------------------------------------------

    pub fn speakers(&self) -> &SpeakerPool {
        &self.speakers
    }

    pub fn speakers_mut(&mut self) -> &mut SpeakerPool {
        &mut self.speakers
    }

    /// Drops a speaker from the pool (unless pinned) and resets every
    /// paragraph referencing it to the default speaker. Returns `false`
    /// when the speaker was not pooled.
    pub fn remove_speaker(&mut self, speaker: &SpeakerRef) -> bool {
        if !self.speakers.contains(speaker) {
            return false;
        }
        if !speaker.borrow().pinned() {
            self.speakers.remove(speaker);
        }
        let mut cleared = 0usize;
        for chapter in self.chapters.iter_mut() {
            for section in chapter.sections_mut().iter_mut() {
                for paragraph in section.paragraphs_mut().iter_mut() {
                    if Rc::ptr_eq(&paragraph.speaker(), speaker) {
                        paragraph.set_speaker(Speaker::default_speaker());
                        cleared += 1;
                    }
                }
            }
        }
        tracing::debug!(cleared, "removed speaker from document");
        true
    }

    /// Swaps `to_replace` for `replacement` in the pool and in every
    /// referencing paragraph. Returns the number of paragraphs rewritten.
    pub fn replace_speaker(&mut self, to_replace: &SpeakerRef, replacement: SpeakerRef) -> usize {
        if self.speakers.contains(to_replace) {
            self.speakers.remove(to_replace);
            if !Speaker::is_default(&replacement) && !self.speakers.contains(&replacement) {
                // Cannot fail: the sentinel was just excluded.
                let _ = self.speakers.add(replacement.clone());
            }
        }
        let mut rewritten = 0usize;
        for chapter in self.chapters.iter_mut() {
            for section in chapter.sections_mut().iter_mut() {
                for paragraph in section.paragraphs_mut().iter_mut() {
                    if Rc::ptr_eq(&paragraph.speaker(), to_replace) {
                        paragraph.set_speaker(replacement.clone());
                        rewritten += 1;
                    }
                }
            }
        }
        tracing::debug!(rewritten, "replaced speaker across document");
        rewritten
    }

    /// Resolves every paragraph's stored serial id against the pool,
    /// attaching the matching speaker or the default one. Run once after
    /// the tree and the pool are fully populated.
    pub fn assign_speakers_by_serial_id(&mut self) {
        let pool = &self.speakers;
        let mut assigned = 0usize;
        let mut defaulted = 0usize;
        for chapter in self.chapters.iter_mut() {
            for section in chapter.sections_mut().iter_mut() {
                for paragraph in section.paragraphs_mut().iter_mut() {
                    match pool.find_by_serial_id(paragraph.serial_speaker_id()) {
                        Some(speaker) => {
                            paragraph.set_speaker(speaker);
                            assigned += 1;
                        }
                        None => {
                            paragraph.set_speaker(Speaker::default_speaker());
                            defaulted += 1;
                        }
                    }
                }
            }
        }
        tracing::debug!(assigned, defaulted, "reattached speakers by serial id");
    }

    /// Stamps distinct referenced speakers with serial ids `0..n` ahead of
    /// serialization. Returns `n`.
    pub fn reindex_serial_ids(&mut self) -> usize {
        let mut referenced: Vec<SpeakerRef> = Vec::new();
        for paragraph in self.paragraphs() {
            let speaker = paragraph.speaker();
            if Speaker::is_default(&speaker) {
                continue;
            }
            if !referenced.iter().any(|s| Rc::ptr_eq(s, &speaker)) {
                referenced.push(speaker);
            }
        }
        for (index, speaker) in referenced.iter().enumerate() {
            speaker.borrow_mut().set_serial_id(index as i32);
        }
        referenced.len()
    }

    // ----- load boundary ----------------------------------------------------

    /// Opens logging-disabled transactions on the document's trackers so
    /// bulk population dispatches nothing and leaves no undo record.
    pub fn begin_loading(&mut self) {
        tracing::debug!("bulk load started");
        self.updates.begin_transaction(false);
        self.chapters.updates_mut().begin_transaction(false);
    }

    pub fn end_loading(&mut self) {
        self.chapters.updates_mut().end_transaction();
        self.updates.end_transaction();
        tracing::debug!(
            chapters = self.chapters.len(),
            speakers = self.speakers.len(),
            "bulk load finished"
        );
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A text-search hit: the paragraph's address plus byte offset and length
/// within its concatenated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub address: PositionAddress,
    pub offset: usize,
    pub len: usize,
}

fn empty_level(level: Level) -> AddressError {
    AddressError::OutOfRange {
        level,
        index: 0,
        len: 0,
    }
}

fn level_mismatch(address: PositionAddress, expected: Level) -> AddressError {
    AddressError::LevelMismatch { address, expected }
}

fn fetch<T: ChildLink>(list: &TrackedList<T>, index: i32) -> Result<&T, AddressError> {
    let index = index as usize;
    list.get(index).ok_or(AddressError::OutOfRange {
        level: list.level(),
        index,
        len: list.len(),
    })
}

fn fetch_mut<T: ChildLink>(list: &mut TrackedList<T>, index: i32) -> Result<&mut T, AddressError> {
    let len = list.len();
    let level = list.level();
    let index = index as usize;
    list.get_mut(index)
        .ok_or(AddressError::OutOfRange { level, index, len })
}

fn parent_section_mut(
    chapters: &mut TrackedList<Chapter>,
    address: PositionAddress,
) -> Result<&mut Section, AddressError> {
    let chapter = fetch_mut(chapters, address.chapter)?;
    fetch_mut(chapter.sections_mut(), address.section)
}

fn parent_paragraph_mut(
    chapters: &mut TrackedList<Chapter>,
    address: PositionAddress,
) -> Result<&mut Paragraph, AddressError> {
    let section = parent_section_mut(chapters, address)?;
    fetch_mut(section.paragraphs_mut(), address.paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.append_chapter(Chapter::new("ch0"));
        doc.append_section(Section::new("se0")).unwrap();
        doc.append_paragraph(Paragraph::new()).unwrap();
        doc.append_phrase(Phrase::timed(
            Timecode::from_millis(0),
            Timecode::from_millis(1000),
            "hello ",
        ))
        .unwrap();
        doc.append_phrase(Phrase::timed(
            Timecode::from_millis(1000),
            Timecode::from_millis(2000),
            "world",
        ))
        .unwrap();
        doc
    }

    #[test]
    fn test_element_at_resolves_each_level() {
        let doc = sample();
        match doc.element_at(PositionAddress::chapter(0)).unwrap() {
            ElementRef::Chapter(c) => assert_eq!(c.name(), "ch0"),
            other => panic!("expected chapter, got {:?}", other),
        }
        match doc.element_at(PositionAddress::phrase(0, 0, 0, 1)).unwrap() {
            ElementRef::Phrase(p) => assert_eq!(p.text(), "world"),
            other => panic!("expected phrase, got {:?}", other),
        }
    }

    #[test]
    fn test_element_at_rejects_invalid_and_out_of_range() {
        let doc = sample();
        let err = doc
            .element_at(PositionAddress::new(0, -1, 0, -1))
            .unwrap_err();
        assert_eq!(
            err,
            AddressError::Invalid {
                address: PositionAddress::new(0, -1, 0, -1)
            }
        );
        let err = doc.element_at(PositionAddress::section(0, 3)).unwrap_err();
        assert_eq!(
            err,
            AddressError::OutOfRange {
                level: Level::Section,
                index: 3,
                len: 1
            }
        );
    }

    #[test]
    fn test_insert_set_remove_by_address() {
        let mut doc = sample();
        doc.insert_element(
            PositionAddress::phrase(0, 0, 0, 1),
            Element::Phrase(Phrase::timed(
                Timecode::from_millis(900),
                Timecode::from_millis(1000),
                "there ",
            )),
        )
        .unwrap();
        assert_eq!(doc.paragraph_at(PositionAddress::paragraph(0, 0, 0)).unwrap().text(),
            "hello there world");

        doc.set_element(
            PositionAddress::phrase(0, 0, 0, 1),
            Element::Phrase(Phrase::timed(
                Timecode::from_millis(900),
                Timecode::from_millis(1000),
                "big ",
            )),
        )
        .unwrap();
        doc.remove_element(PositionAddress::phrase(0, 0, 0, 2)).unwrap();
        assert_eq!(
            doc.paragraph_at(PositionAddress::paragraph(0, 0, 0)).unwrap().text(),
            "hello big "
        );
    }

    #[test]
    fn test_payload_kind_must_match_address_level() {
        let mut doc = sample();
        let err = doc
            .insert_element(
                PositionAddress::section(0, 0),
                Element::Phrase(Phrase::new()),
            )
            .unwrap_err();
        assert_eq!(
            err,
            AddressError::LevelMismatch {
                address: PositionAddress::section(0, 0),
                expected: Level::Phrase
            }
        );
    }

    #[test]
    fn test_append_cascade_requires_ancestors() {
        let mut doc = Document::new();
        assert!(doc.append_paragraph(Paragraph::new()).is_err());
        doc.append_chapter(Chapter::new("c"));
        assert!(doc.append_phrase(Phrase::new()).is_err());
    }

    #[test]
    fn test_time_queries() {
        let mut doc = sample();
        {
            let paragraph = match doc
                .element_at_mut(PositionAddress::paragraph(0, 0, 0))
                .unwrap()
            {
                ElementMut::Paragraph(p) => p,
                _ => unreachable!(),
            };
            paragraph.set_begin(Timecode::from_millis(0));
            paragraph.set_end(Timecode::from_millis(2000));
        }
        doc.append_paragraph(Paragraph::new()).unwrap();
        {
            let paragraph = match doc
                .element_at_mut(PositionAddress::paragraph(0, 0, 1))
                .unwrap()
            {
                ElementMut::Paragraph(p) => p,
                _ => unreachable!(),
            };
            paragraph.set_begin(Timecode::from_millis(2000));
            paragraph.set_end(Timecode::from_millis(3000));
        }

        assert_eq!(doc.paragraphs_at(Timecode::from_millis(2500)).count(), 1);
        let last = doc.last_paragraph_before(Timecode::from_millis(2500)).unwrap();
        assert_eq!(last.end(), Timecode::from_millis(2000));
        assert!(doc.last_paragraph_before(Timecode::UNKNOWN).is_none());
    }

    #[test]
    fn test_find_text() {
        let doc = sample();
        let hit = doc
            .find_text(PositionAddress::paragraph(0, 0, 0), "WORLD", false, false)
            .unwrap()
            .unwrap();
        assert_eq!(hit.address, PositionAddress::paragraph(0, 0, 0));
        assert_eq!(hit.offset, 6);
        assert_eq!(hit.len, 5);

        assert!(doc
            .find_text(PositionAddress::paragraph(0, 0, 0), "WORLD", true, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_inner_text() {
        let doc = sample();
        assert_eq!(doc.inner_text(), "ch0\nse0\nhello world");
    }

    #[test]
    fn test_revert_restores_media_uri() {
        use std::cell::RefCell;

        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);

        let mut doc = Document::new();
        doc.set_media_uri(Some("meeting.wav".to_string()));
        doc.updates_mut()
            .set_listener(move |mut batch| sink.borrow_mut().append(&mut batch));
        doc.set_media_uri(Some("meeting-v2.wav".to_string()));

        let change = records.borrow_mut().pop().unwrap();
        doc.revert(change);
        assert_eq!(doc.media_uri(), Some("meeting.wav"));
    }

    #[test]
    fn test_duplicate_preserves_structure() {
        let doc = sample();
        let copy = doc.duplicate();
        assert_eq!(copy.chapters().len(), 1);
        assert_eq!(copy.inner_text(), doc.inner_text());
        assert_ne!(copy.document_id(), doc.document_id());
    }
}
