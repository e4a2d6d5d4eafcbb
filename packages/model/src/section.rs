//! Sections: named groups of paragraphs within a chapter.

use crate::address::Level;
use crate::attributes::AttributeMap;
use crate::list::{ChildLink, TrackedList};
use crate::paragraph::Paragraph;
use crate::tracker::UpdateTracker;
use std::mem;

/// One reversible scalar mutation of a [`Section`].
#[derive(Debug, Clone)]
pub enum SectionChange {
    Name { old: String },
    Attributes { old: AttributeMap },
}

#[derive(Debug)]
pub struct Section {
    name: String,
    attributes: AttributeMap,
    paragraphs: TrackedList<Paragraph>,
    parent_index: Option<usize>,
    updates: UpdateTracker<SectionChange>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeMap::new(),
            paragraphs: TrackedList::new(Level::Paragraph),
            parent_index: None,
            updates: UpdateTracker::new(),
        }
    }

    /// Deep copy, detached from any parent.
    pub fn duplicate(&self) -> Section {
        let mut copy = Self::new(self.name.clone());
        copy.attributes = self.attributes.clone();
        for paragraph in self.paragraphs.iter() {
            copy.paragraphs.push(paragraph.duplicate());
        }
        copy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.name, value.into());
        self.updates.record(SectionChange::Name { old });
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(SectionChange::Attributes { old });
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut next = self.attributes.clone();
        next.insert(key, value);
        self.set_attributes(next);
    }

    pub fn paragraphs(&self) -> &TrackedList<Paragraph> {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut TrackedList<Paragraph> {
        &mut self.paragraphs
    }

    /// Section name followed by each paragraph's text.
    pub fn inner_text(&self) -> String {
        let mut text = self.name.clone();
        for paragraph in self.paragraphs.iter() {
            text.push('\n');
            text.push_str(&paragraph.text());
        }
        text
    }

    pub fn updates(&self) -> &UpdateTracker<SectionChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<SectionChange> {
        &mut self.updates
    }

    pub fn revert(&mut self, change: SectionChange) {
        match change {
            SectionChange::Name { old } => self.set_name(old),
            SectionChange::Attributes { old } => self.set_attributes(old),
        }
    }
}

impl ChildLink for Section {
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
