use transcript_model::{Chapter, Document, Paragraph, Phrase, Section, SpeakerRef};

/// Visitor pattern for traversing a transcript document immutably
///
/// This trait provides default implementations that walk the entire tree in
/// document order, then the speaker pool. Override specific visit_* methods
/// to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_chapter(&mut self, chapter: &Chapter) {
        walk_chapter(self, chapter);
    }

    fn visit_section(&mut self, section: &Section) {
        walk_section(self, section);
    }

    fn visit_paragraph(&mut self, paragraph: &Paragraph) {
        walk_paragraph(self, paragraph);
    }

    fn visit_phrase(&mut self, _phrase: &Phrase) {
        // Leaf node, no children to walk
    }

    fn visit_speaker(&mut self, _speaker: &SpeakerRef) {
        // Pool entry, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for chapter in doc.chapters().iter() {
        visitor.visit_chapter(chapter);
    }
    for speaker in doc.speakers().iter() {
        visitor.visit_speaker(speaker);
    }
}

pub fn walk_chapter<V: Visitor>(visitor: &mut V, chapter: &Chapter) {
    for section in chapter.sections().iter() {
        visitor.visit_section(section);
    }
}

pub fn walk_section<V: Visitor>(visitor: &mut V, section: &Section) {
    for paragraph in section.paragraphs().iter() {
        visitor.visit_paragraph(paragraph);
    }
}

pub fn walk_paragraph<V: Visitor>(visitor: &mut V, paragraph: &Paragraph) {
    for phrase in paragraph.phrases().iter() {
        visitor.visit_phrase(phrase);
    }
}
