//! The smallest part of a transcript that carries its own time tags.

use crate::attributes::AttributeMap;
use crate::list::ChildLink;
use crate::timecode::Timecode;
use crate::tracker::UpdateTracker;
use std::mem;
use std::time::Duration;

/// One reversible scalar mutation of a [`Phrase`].
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseChange {
    Begin { old: Timecode },
    End { old: Timecode },
    Text { old: String },
    Phonetics { old: String },
    Attributes { old: AttributeMap },
}

/// Leaf element: a timed stretch of spoken text.
#[derive(Debug)]
pub struct Phrase {
    begin: Timecode,
    end: Timecode,
    text: String,
    phonetics: String,
    attributes: AttributeMap,
    parent_index: Option<usize>,
    updates: UpdateTracker<PhraseChange>,
}

impl Phrase {
    /// Creates a detached phrase with unknown times and empty text.
    pub fn new() -> Self {
        Self {
            begin: Timecode::UNKNOWN,
            end: Timecode::UNKNOWN,
            text: String::new(),
            phonetics: String::new(),
            attributes: AttributeMap::new(),
            parent_index: None,
            updates: UpdateTracker::new(),
        }
    }

    /// Creates a detached phrase spanning `begin..end` with the given text.
    pub fn timed(begin: Timecode, end: Timecode, text: impl Into<String>) -> Self {
        let mut phrase = Self::new();
        phrase.begin = begin;
        phrase.end = end;
        phrase.text = text.into();
        phrase
    }

    /// Field-for-field copy with a fresh tracker and no parent.
    pub fn duplicate(&self) -> Phrase {
        let mut copy = Self::new();
        copy.begin = self.begin;
        copy.end = self.end;
        copy.text = self.text.clone();
        copy.phonetics = self.phonetics.clone();
        copy.attributes = self.attributes.clone();
        copy
    }

    pub fn begin(&self) -> Timecode {
        self.begin
    }

    pub fn set_begin(&mut self, value: Timecode) {
        let old = mem::replace(&mut self.begin, value);
        self.updates.record(PhraseChange::Begin { old });
    }

    pub fn end(&self) -> Timecode {
        self.end
    }

    pub fn set_end(&mut self, value: Timecode) {
        let old = mem::replace(&mut self.end, value);
        self.updates.record(PhraseChange::End { old });
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.text, value.into());
        self.updates.record(PhraseChange::Text { old });
    }

    pub fn phonetics(&self) -> &str {
        &self.phonetics
    }

    pub fn set_phonetics(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.phonetics, value.into());
        self.updates.record(PhraseChange::Phonetics { old });
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(PhraseChange::Attributes { old });
    }

    /// Replaces one attribute entry, recording the whole previous map.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut next = self.attributes.clone();
        next.insert(key, value);
        self.set_attributes(next);
    }

    /// Zero when either endpoint is unknown.
    pub fn duration(&self) -> Duration {
        self.begin.span_to(self.end)
    }

    pub fn updates(&self) -> &UpdateTracker<PhraseChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<PhraseChange> {
        &mut self.updates
    }

    /// Restores the previous value carried by `change`, recording the
    /// inverse as it goes.
    pub fn revert(&mut self, change: PhraseChange) {
        match change {
            PhraseChange::Begin { old } => self.set_begin(old),
            PhraseChange::End { old } => self.set_end(old),
            PhraseChange::Text { old } => self.set_text(old),
            PhraseChange::Phonetics { old } => self.set_phonetics(old),
            PhraseChange::Attributes { old } => self.set_attributes(old),
        }
    }
}

impl Default for Phrase {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildLink for Phrase {
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
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_setters_record_old_values() {
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);

        let mut phrase = Phrase::timed(Timecode::from_millis(0), Timecode::from_millis(500), "so");
        phrase
            .updates_mut()
            .set_listener(move |mut batch| sink.borrow_mut().append(&mut batch));

        phrase.set_text("so,");
        phrase.set_begin(Timecode::from_millis(10));

        let recorded = records.borrow();
        assert_eq!(
            recorded[0],
            PhraseChange::Text {
                old: "so".to_string()
            }
        );
        assert_eq!(
            recorded[1],
            PhraseChange::Begin {
                old: Timecode::from_millis(0)
            }
        );
    }

    #[test]
    fn test_revert_restores_field() {
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);

        let mut phrase = Phrase::new();
        phrase
            .updates_mut()
            .set_listener(move |mut batch| sink.borrow_mut().append(&mut batch));
        phrase.set_text("hello");

        let change = records.borrow_mut().pop().unwrap();
        phrase.revert(change);
        assert_eq!(phrase.text(), "");
    }

    #[test]
    fn test_duplicate_is_detached() {
        let mut phrase = Phrase::timed(Timecode::from_millis(1), Timecode::from_millis(2), "x");
        phrase.link(3);
        let copy = phrase.duplicate();
        assert_eq!(copy.text(), "x");
        assert_eq!(copy.parent_index(), None);
    }
}
