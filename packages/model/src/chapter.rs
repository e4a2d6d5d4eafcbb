//! Chapters: the top-level grouping of sections in a document.

use crate::address::Level;
use crate::attributes::AttributeMap;
use crate::list::{ChildLink, TrackedList};
use crate::section::Section;
use crate::tracker::UpdateTracker;
use std::mem;

/// One reversible scalar mutation of a [`Chapter`].
#[derive(Debug, Clone)]
pub enum ChapterChange {
    Name { old: String },
    Attributes { old: AttributeMap },
}

#[derive(Debug)]
pub struct Chapter {
    name: String,
    attributes: AttributeMap,
    sections: TrackedList<Section>,
    parent_index: Option<usize>,
    updates: UpdateTracker<ChapterChange>,
}

impl Chapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeMap::new(),
            sections: TrackedList::new(Level::Section),
            parent_index: None,
            updates: UpdateTracker::new(),
        }
    }

    /// Deep copy, detached from any parent.
    pub fn duplicate(&self) -> Chapter {
        let mut copy = Self::new(self.name.clone());
        copy.attributes = self.attributes.clone();
        for section in self.sections.iter() {
            copy.sections.push(section.duplicate());
        }
        copy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.name, value.into());
        self.updates.record(ChapterChange::Name { old });
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(ChapterChange::Attributes { old });
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut next = self.attributes.clone();
        next.insert(key, value);
        self.set_attributes(next);
    }

    pub fn sections(&self) -> &TrackedList<Section> {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut TrackedList<Section> {
        &mut self.sections
    }

    /// Chapter name followed by each section's inner text.
    pub fn inner_text(&self) -> String {
        let mut text = self.name.clone();
        for section in self.sections.iter() {
            text.push('\n');
            text.push_str(&section.inner_text());
        }
        text
    }

    pub fn updates(&self) -> &UpdateTracker<ChapterChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<ChapterChange> {
        &mut self.updates
    }

    pub fn revert(&mut self, change: ChapterChange) {
        match change {
            ChapterChange::Name { old } => self.set_name(old),
            ChapterChange::Attributes { old } => self.set_attributes(old),
        }
    }
}

impl ChildLink for Chapter {
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
