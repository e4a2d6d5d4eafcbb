//! # Navigation
//!
//! Lineal traversal across the whole document, ignoring container
//! boundaries. At every level, the successor of an element is its next
//! sibling when one exists, otherwise the first child of the nearest
//! following container with at least one child — empty containers are
//! skipped in both directions. The walks are lazy, finite, and restartable
//! from any address.
//!
//! The same walks power derived paragraph times: a paragraph with no
//! explicit begin/end borrows one from its first/last phrase or, failing
//! that, from the nearest neighbouring paragraph with an explicit boundary.

use crate::address::PositionAddress;
use crate::chapter::Chapter;
use crate::document::Document;
use crate::error::AddressError;
use crate::paragraph::Paragraph;
use crate::phrase::Phrase;
use crate::section::Section;
use crate::timecode::Timecode;

// ----- chapter walks --------------------------------------------------------

pub struct ChaptersForward<'a> {
    doc: &'a Document,
    chapter: usize,
}

impl<'a> Iterator for ChaptersForward<'a> {
    type Item = (PositionAddress, &'a Chapter);

    fn next(&mut self) -> Option<Self::Item> {
        let chapter = self.doc.chapters().get(self.chapter)?;
        let address = PositionAddress::chapter(self.chapter);
        self.chapter += 1;
        Some((address, chapter))
    }
}

pub struct ChaptersBackward<'a> {
    doc: &'a Document,
    chapter: isize,
}

impl<'a> Iterator for ChaptersBackward<'a> {
    type Item = (PositionAddress, &'a Chapter);

    fn next(&mut self) -> Option<Self::Item> {
        if self.chapter < 0 {
            return None;
        }
        let index = self.chapter as usize;
        let chapter = self.doc.chapters().get(index)?;
        self.chapter -= 1;
        Some((PositionAddress::chapter(index), chapter))
    }
}

// ----- section walks --------------------------------------------------------

pub struct SectionsForward<'a> {
    doc: &'a Document,
    chapter: usize,
    section: usize,
}

impl<'a> Iterator for SectionsForward<'a> {
    type Item = (PositionAddress, &'a Section);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chapter = self.doc.chapters().get(self.chapter)?;
            if let Some(section) = chapter.sections().get(self.section) {
                let address = PositionAddress::section(self.chapter, self.section);
                self.section += 1;
                return Some((address, section));
            }
            self.chapter += 1;
            self.section = 0;
        }
    }
}

pub struct SectionsBackward<'a> {
    doc: &'a Document,
    chapter: isize,
    section: isize,
}

impl<'a> Iterator for SectionsBackward<'a> {
    type Item = (PositionAddress, &'a Section);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.chapter < 0 {
                return None;
            }
            let chapter = self.doc.chapters().get(self.chapter as usize)?;
            if self.section >= 0 {
                let address =
                    PositionAddress::section(self.chapter as usize, self.section as usize);
                let section = chapter.sections().get(self.section as usize)?;
                self.section -= 1;
                return Some((address, section));
            }
            self.chapter -= 1;
            if self.chapter >= 0 {
                let prev = self.doc.chapters().get(self.chapter as usize)?;
                self.section = prev.sections().len() as isize - 1;
            }
        }
    }
}

// ----- paragraph walks ------------------------------------------------------

pub struct ParagraphsForward<'a> {
    doc: &'a Document,
    chapter: usize,
    section: usize,
    paragraph: usize,
}

impl<'a> Iterator for ParagraphsForward<'a> {
    type Item = (PositionAddress, &'a Paragraph);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chapter = self.doc.chapters().get(self.chapter)?;
            let Some(section) = chapter.sections().get(self.section) else {
                self.chapter += 1;
                self.section = 0;
                self.paragraph = 0;
                continue;
            };
            if let Some(paragraph) = section.paragraphs().get(self.paragraph) {
                let address =
                    PositionAddress::paragraph(self.chapter, self.section, self.paragraph);
                self.paragraph += 1;
                return Some((address, paragraph));
            }
            self.section += 1;
            self.paragraph = 0;
        }
    }
}

pub struct ParagraphsBackward<'a> {
    doc: &'a Document,
    chapter: isize,
    section: isize,
    paragraph: isize,
}

impl<'a> Iterator for ParagraphsBackward<'a> {
    type Item = (PositionAddress, &'a Paragraph);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.chapter < 0 {
                return None;
            }
            let chapter = self.doc.chapters().get(self.chapter as usize)?;
            if self.section >= 0 {
                let section = chapter.sections().get(self.section as usize)?;
                if self.paragraph >= 0 {
                    let address = PositionAddress::paragraph(
                        self.chapter as usize,
                        self.section as usize,
                        self.paragraph as usize,
                    );
                    let paragraph = section.paragraphs().get(self.paragraph as usize)?;
                    self.paragraph -= 1;
                    return Some((address, paragraph));
                }
                self.section -= 1;
                if self.section >= 0 {
                    if let Some(prev) = chapter.sections().get(self.section as usize) {
                        self.paragraph = prev.paragraphs().len() as isize - 1;
                    }
                }
                continue;
            }
            self.chapter -= 1;
            if self.chapter >= 0 {
                if let Some(prev) = self.doc.chapters().get(self.chapter as usize) {
                    self.section = prev.sections().len() as isize - 1;
                    if self.section >= 0 {
                        if let Some(last) = prev.sections().get(self.section as usize) {
                            self.paragraph = last.paragraphs().len() as isize - 1;
                        }
                    }
                }
            }
        }
    }
}

// ----- phrase walks ---------------------------------------------------------

pub struct PhrasesForward<'a> {
    doc: &'a Document,
    chapter: usize,
    section: usize,
    paragraph: usize,
    phrase: usize,
}

impl<'a> Iterator for PhrasesForward<'a> {
    type Item = (PositionAddress, &'a Phrase);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chapter = self.doc.chapters().get(self.chapter)?;
            let Some(section) = chapter.sections().get(self.section) else {
                self.chapter += 1;
                self.section = 0;
                self.paragraph = 0;
                self.phrase = 0;
                continue;
            };
            let Some(paragraph) = section.paragraphs().get(self.paragraph) else {
                self.section += 1;
                self.paragraph = 0;
                self.phrase = 0;
                continue;
            };
            if let Some(phrase) = paragraph.phrases().get(self.phrase) {
                let address = PositionAddress::phrase(
                    self.chapter,
                    self.section,
                    self.paragraph,
                    self.phrase,
                );
                self.phrase += 1;
                return Some((address, phrase));
            }
            self.paragraph += 1;
            self.phrase = 0;
        }
    }
}

pub struct PhrasesBackward<'a> {
    doc: &'a Document,
    chapter: isize,
    section: isize,
    paragraph: isize,
    phrase: isize,
}

impl<'a> Iterator for PhrasesBackward<'a> {
    type Item = (PositionAddress, &'a Phrase);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.chapter < 0 {
                return None;
            }
            let chapter = self.doc.chapters().get(self.chapter as usize)?;
            if self.section >= 0 {
                let section = chapter.sections().get(self.section as usize)?;
                if self.paragraph >= 0 {
                    let paragraph = section.paragraphs().get(self.paragraph as usize)?;
                    if self.phrase >= 0 {
                        let address = PositionAddress::phrase(
                            self.chapter as usize,
                            self.section as usize,
                            self.paragraph as usize,
                            self.phrase as usize,
                        );
                        let phrase = paragraph.phrases().get(self.phrase as usize)?;
                        self.phrase -= 1;
                        return Some((address, phrase));
                    }
                    self.paragraph -= 1;
                    if self.paragraph >= 0 {
                        if let Some(prev) = section.paragraphs().get(self.paragraph as usize) {
                            self.phrase = prev.phrases().len() as isize - 1;
                        }
                    }
                    continue;
                }
                self.section -= 1;
                if self.section >= 0 {
                    if let Some(prev) = chapter.sections().get(self.section as usize) {
                        self.paragraph = prev.paragraphs().len() as isize - 1;
                        if self.paragraph >= 0 {
                            if let Some(last) = prev.paragraphs().get(self.paragraph as usize) {
                                self.phrase = last.phrases().len() as isize - 1;
                            }
                        }
                    }
                }
                continue;
            }
            self.chapter -= 1;
            if self.chapter >= 0 {
                if let Some(prev) = self.doc.chapters().get(self.chapter as usize) {
                    self.section = prev.sections().len() as isize - 1;
                    if self.section >= 0 {
                        if let Some(last) = prev.sections().get(self.section as usize) {
                            self.paragraph = last.paragraphs().len() as isize - 1;
                            if self.paragraph >= 0 {
                                if let Some(lastp) =
                                    last.paragraphs().get(self.paragraph as usize)
                                {
                                    self.phrase = lastp.phrases().len() as isize - 1;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ----- entry points ---------------------------------------------------------

impl Document {
    /// Chapters strictly after the addressed one, in document order.
    pub fn chapters_after(
        &self,
        address: PositionAddress,
    ) -> Result<ChaptersForward<'_>, AddressError> {
        self.chapter_at(address)?;
        Ok(ChaptersForward {
            doc: self,
            chapter: address.chapter as usize + 1,
        })
    }

    /// Chapters strictly before the addressed one, nearest first.
    pub fn chapters_before(
        &self,
        address: PositionAddress,
    ) -> Result<ChaptersBackward<'_>, AddressError> {
        self.chapter_at(address)?;
        Ok(ChaptersBackward {
            doc: self,
            chapter: address.chapter as isize - 1,
        })
    }

    /// Sections strictly after the addressed one, crossing chapter
    /// boundaries.
    pub fn sections_after(
        &self,
        address: PositionAddress,
    ) -> Result<SectionsForward<'_>, AddressError> {
        self.section_at(address)?;
        Ok(SectionsForward {
            doc: self,
            chapter: address.chapter as usize,
            section: address.section as usize + 1,
        })
    }

    /// Sections strictly before the addressed one, nearest first.
    pub fn sections_before(
        &self,
        address: PositionAddress,
    ) -> Result<SectionsBackward<'_>, AddressError> {
        self.section_at(address)?;
        Ok(SectionsBackward {
            doc: self,
            chapter: address.chapter as isize,
            section: address.section as isize - 1,
        })
    }

    /// Paragraphs from the addressed one (inclusive) to the end of the
    /// document.
    pub fn paragraphs_from(
        &self,
        address: PositionAddress,
    ) -> Result<ParagraphsForward<'_>, AddressError> {
        self.paragraph_at(address)?;
        Ok(ParagraphsForward {
            doc: self,
            chapter: address.chapter as usize,
            section: address.section as usize,
            paragraph: address.paragraph as usize,
        })
    }

    /// Paragraphs strictly after the addressed one, crossing section and
    /// chapter boundaries.
    pub fn paragraphs_after(
        &self,
        address: PositionAddress,
    ) -> Result<ParagraphsForward<'_>, AddressError> {
        self.paragraph_at(address)?;
        Ok(ParagraphsForward {
            doc: self,
            chapter: address.chapter as usize,
            section: address.section as usize,
            paragraph: address.paragraph as usize + 1,
        })
    }

    /// Paragraphs strictly before the addressed one, nearest first.
    pub fn paragraphs_before(
        &self,
        address: PositionAddress,
    ) -> Result<ParagraphsBackward<'_>, AddressError> {
        self.paragraph_at(address)?;
        Ok(ParagraphsBackward {
            doc: self,
            chapter: address.chapter as isize,
            section: address.section as isize,
            paragraph: address.paragraph as isize - 1,
        })
    }

    /// Phrases strictly after the addressed one, crossing all container
    /// boundaries.
    pub fn phrases_after(
        &self,
        address: PositionAddress,
    ) -> Result<PhrasesForward<'_>, AddressError> {
        self.phrase_at(address)?;
        Ok(PhrasesForward {
            doc: self,
            chapter: address.chapter as usize,
            section: address.section as usize,
            paragraph: address.paragraph as usize,
            phrase: address.phrase as usize + 1,
        })
    }

    /// Phrases strictly before the addressed one, nearest first.
    pub fn phrases_before(
        &self,
        address: PositionAddress,
    ) -> Result<PhrasesBackward<'_>, AddressError> {
        self.phrase_at(address)?;
        Ok(PhrasesBackward {
            doc: self,
            chapter: address.chapter as isize,
            section: address.section as isize,
            paragraph: address.paragraph as isize,
            phrase: address.phrase as isize - 1,
        })
    }

    pub fn next_chapter(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.chapters_after(address)?.next().map(|(a, _)| a))
    }

    pub fn previous_chapter(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.chapters_before(address)?.next().map(|(a, _)| a))
    }

    pub fn next_section(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.sections_after(address)?.next().map(|(a, _)| a))
    }

    pub fn previous_section(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.sections_before(address)?.next().map(|(a, _)| a))
    }

    pub fn next_paragraph(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.paragraphs_after(address)?.next().map(|(a, _)| a))
    }

    pub fn previous_paragraph(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.paragraphs_before(address)?.next().map(|(a, _)| a))
    }

    pub fn next_phrase(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.phrases_after(address)?.next().map(|(a, _)| a))
    }

    pub fn previous_phrase(
        &self,
        address: PositionAddress,
    ) -> Result<Option<PositionAddress>, AddressError> {
        Ok(self.phrases_before(address)?.next().map(|(a, _)| a))
    }

    // ----- derived paragraph times ------------------------------------------

    /// Begin time of the addressed paragraph, derived when not explicit:
    /// the first phrase's explicit begin wins, then the nearest preceding
    /// paragraph with an explicit boundary — its end preferred over its
    /// begin. Unknown when nothing in the document can answer.
    pub fn resolve_begin(&self, address: PositionAddress) -> Result<Timecode, AddressError> {
        let paragraph = self.paragraph_at(address)?;
        if paragraph.begin().is_known() {
            return Ok(paragraph.begin());
        }
        if let Some(first) = paragraph.phrases().first() {
            if first.begin().is_known() {
                return Ok(first.begin());
            }
        }
        for (_, neighbour) in self.paragraphs_before(address)? {
            if neighbour.end().is_known() {
                return Ok(neighbour.end());
            }
            if neighbour.begin().is_known() {
                return Ok(neighbour.begin());
            }
        }
        Ok(Timecode::UNKNOWN)
    }

    /// End time of the addressed paragraph, derived when not explicit: the
    /// last phrase's explicit end wins, then the nearest following
    /// paragraph with an explicit boundary — its begin preferred over its
    /// end.
    pub fn resolve_end(&self, address: PositionAddress) -> Result<Timecode, AddressError> {
        let paragraph = self.paragraph_at(address)?;
        if paragraph.end().is_known() {
            return Ok(paragraph.end());
        }
        if let Some(last) = paragraph.phrases().last() {
            if last.end().is_known() {
                return Ok(last.end());
            }
        }
        for (_, neighbour) in self.paragraphs_after(address)? {
            if neighbour.begin().is_known() {
                return Ok(neighbour.begin());
            }
            if neighbour.end().is_known() {
                return Ok(neighbour.end());
            }
        }
        Ok(Timecode::UNKNOWN)
    }
}
