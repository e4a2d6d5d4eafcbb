//! # Speaker Pool
//!
//! The per-document collection of speaker handles. Membership is
//! independent of paragraph references: a pinned speaker stays pooled even
//! when no paragraph points at it, and the pool is synchronized manually —
//! it may hold speakers the tree no longer uses.
//!
//! Deduplication is by reference identity, never by value.

use crate::error::InvariantError;
use crate::speaker::{Speaker, SpeakerRef};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct SpeakerPool {
    speakers: Vec<SpeakerRef>,
}

impl SpeakerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SpeakerRef> {
        self.speakers.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeakerRef> {
        self.speakers.iter()
    }

    pub fn contains(&self, speaker: &SpeakerRef) -> bool {
        self.speakers.iter().any(|s| Rc::ptr_eq(s, speaker))
    }

    /// Adds a speaker unless already pooled. The default-speaker sentinel is
    /// rejected — absence of a speaker is expressed on paragraphs, not in
    /// the pool.
    pub fn add(&mut self, speaker: SpeakerRef) -> Result<bool, InvariantError> {
        if Speaker::is_default(&speaker) {
            return Err(InvariantError::SentinelInPool);
        }
        if self.contains(&speaker) {
            return Ok(false);
        }
        self.speakers.push(speaker);
        Ok(true)
    }

    /// Removes by identity; `true` when the speaker was pooled.
    pub fn remove(&mut self, speaker: &SpeakerRef) -> bool {
        let before = self.speakers.len();
        self.speakers.retain(|s| !Rc::ptr_eq(s, speaker));
        self.speakers.len() != before
    }

    pub fn clear(&mut self) {
        self.speakers.clear();
    }

    /// Finds a speaker by external id, searching primary identities first
    /// and merge alternates second. Compares stored ids only; never
    /// triggers lazy generation.
    pub fn find_by_external_id(&self, id: &str) -> Option<SpeakerRef> {
        self.speakers
            .iter()
            .find(|s| {
                let speaker = s.borrow();
                speaker.identity().id() == Some(id)
                    || speaker.merges().iter().any(|m| m.id() == Some(id))
            })
            .cloned()
    }

    pub fn find_by_full_name(&self, full_name: &str) -> Option<SpeakerRef> {
        self.speakers
            .iter()
            .find(|s| s.borrow().full_name() == full_name)
            .cloned()
    }

    /// Finds a speaker by the per-document serial id used across the
    /// load/save boundary.
    pub fn find_by_serial_id(&self, serial_id: i32) -> Option<SpeakerRef> {
        self.speakers
            .iter()
            .find(|s| s.borrow().serial_id() == serial_id)
            .cloned()
    }

    /// Duplicates every pooled speaker (fresh identities; see
    /// [`Speaker::duplicate`]).
    pub fn deep_copy(&self) -> SpeakerPool {
        let speakers = self
            .speakers
            .iter()
            .map(|s| s.borrow_mut().duplicate().into_ref())
            .collect();
        SpeakerPool { speakers }
    }
}
