//! # Speakers
//!
//! Participant identities referenced by paragraphs and pooled independently
//! of them. A speaker is never owned by the tree: paragraphs hold shared
//! handles, equality is reference identity, and a process-wide sentinel
//! stands in wherever no real speaker was assigned.
//!
//! External identity is scoped: file-local speakers have no id at all,
//! user- and api-scoped speakers get one generated lazily on first read.
//! Merging folds one speaker's data into another, accumulating the losing
//! identity as an alternate so old references keep resolving.

use crate::attributes::AttributeMap;
use crate::error::IdentityError;
use crate::tracker::UpdateTracker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use uuid::Uuid;

/// Shared handle to a speaker. Two handles denote the same speaker exactly
/// when they point at the same allocation.
pub type SpeakerRef = Rc<RefCell<Speaker>>;

/// Serial id of a paragraph that was never linked to a pool speaker.
pub const UNASSIGNED_SPEAKER_ID: i32 = i32::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Unspecified,
    Male,
    Female,
}

/// Scope in which an external speaker id is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityScope {
    /// Defined only within one document; carries no id.
    #[default]
    File,
    /// Assigned by a user; locked once set.
    User,
    /// Assigned and persisted by a backend API.
    Api,
}

/// External identity: a scope plus an opaque id. File-scoped identities
/// never carry an id; other scopes receive one lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerIdentity {
    pub scope: IdentityScope,
    id: Option<String>,
}

impl SpeakerIdentity {
    pub fn new(scope: IdentityScope, id: Option<String>) -> Self {
        Self { scope, id }
    }

    pub fn file_local() -> Self {
        Self::new(IdentityScope::File, None)
    }

    /// The id as stored; never triggers generation.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Ensures a non-file identity has an id, generating one if needed.
    pub(crate) fn materialize(&mut self) -> Option<&str> {
        if self.scope != IdentityScope::File && self.id.is_none() {
            self.id = Some(Uuid::new_v4().to_string());
        }
        self.id.as_deref()
    }
}

impl Default for SpeakerIdentity {
    fn default() -> Self {
        Self::file_local()
    }
}

/// Typed free-text attribute, kept separate from the free-form element map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerAttribute {
    pub name: String,
    pub value: String,
    pub stamped: Option<DateTime<Utc>>,
}

impl SpeakerAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            stamped: None,
        }
    }

    pub fn stamped_at(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamped = Some(stamp);
        self
    }

    /// Exact (name, value) match; the dedup rule for merges.
    pub fn same_entry(&self, other: &SpeakerAttribute) -> bool {
        self.name == other.name && self.value == other.value
    }
}

/// One reversible scalar mutation of a [`Speaker`].
#[derive(Debug, Clone)]
pub enum SpeakerChange {
    FirstName { old: String },
    MiddleName { old: Option<String> },
    Surname { old: String },
    DegreeBefore { old: Option<String> },
    DegreeAfter { old: Option<String> },
    Sex { old: Sex },
    DefaultLanguage { old: String },
    Portrait { old: Option<String> },
    Pinned { old: bool },
    Identity { old: SpeakerIdentity },
    Merges { old: Vec<SpeakerIdentity> },
    Attributes { old: Vec<SpeakerAttribute> },
    Elements { old: AttributeMap },
    Synchronized { old: Option<DateTime<Utc>> },
}

#[derive(Debug)]
pub struct Speaker {
    first_name: String,
    middle_name: Option<String>,
    surname: String,
    degree_before: Option<String>,
    degree_after: Option<String>,
    sex: Sex,
    default_language: String,
    portrait_base64: Option<String>,
    identity: SpeakerIdentity,
    merges: Vec<SpeakerIdentity>,
    attributes: Vec<SpeakerAttribute>,
    elements: AttributeMap,
    pinned: bool,
    synchronized: Option<DateTime<Utc>>,
    serial_id: i32,
    updates: UpdateTracker<SpeakerChange>,
}

thread_local! {
    static DEFAULT_SPEAKER: SpeakerRef = Rc::new(RefCell::new(Speaker::new()));
}

impl Speaker {
    /// Creates a detached, file-local speaker.
    pub fn new() -> Self {
        Self {
            first_name: String::new(),
            middle_name: None,
            surname: String::new(),
            degree_before: None,
            degree_after: None,
            sex: Sex::Unspecified,
            default_language: crate::languages::DEFAULT.to_string(),
            portrait_base64: None,
            identity: SpeakerIdentity::file_local(),
            merges: Vec::new(),
            attributes: Vec::new(),
            elements: AttributeMap::new(),
            pinned: false,
            synchronized: None,
            serial_id: UNASSIGNED_SPEAKER_ID,
            updates: UpdateTracker::new(),
        }
    }

    pub fn named(first_name: impl Into<String>, surname: impl Into<String>) -> Self {
        let mut speaker = Self::new();
        speaker.first_name = first_name.into();
        speaker.surname = surname.into();
        speaker
    }

    pub fn into_ref(self) -> SpeakerRef {
        Rc::new(RefCell::new(self))
    }

    /// The process-wide sentinel standing in for "no speaker assigned".
    /// Compared by identity; it never joins a pool.
    pub fn default_speaker() -> SpeakerRef {
        DEFAULT_SPEAKER.with(Rc::clone)
    }

    pub fn is_default(speaker: &SpeakerRef) -> bool {
        DEFAULT_SPEAKER.with(|default| Rc::ptr_eq(default, speaker))
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.first_name, value.into());
        self.updates.record(SpeakerChange::FirstName { old });
    }

    pub fn middle_name(&self) -> Option<&str> {
        self.middle_name.as_deref()
    }

    pub fn set_middle_name(&mut self, value: Option<String>) {
        let old = mem::replace(&mut self.middle_name, value);
        self.updates.record(SpeakerChange::MiddleName { old });
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn set_surname(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.surname, value.into());
        self.updates.record(SpeakerChange::Surname { old });
    }

    pub fn degree_before(&self) -> Option<&str> {
        self.degree_before.as_deref()
    }

    pub fn set_degree_before(&mut self, value: Option<String>) {
        let old = mem::replace(&mut self.degree_before, value);
        self.updates.record(SpeakerChange::DegreeBefore { old });
    }

    pub fn degree_after(&self) -> Option<&str> {
        self.degree_after.as_deref()
    }

    pub fn set_degree_after(&mut self, value: Option<String>) {
        let old = mem::replace(&mut self.degree_after, value);
        self.updates.record(SpeakerChange::DegreeAfter { old });
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn set_sex(&mut self, value: Sex) {
        let old = mem::replace(&mut self.sex, value);
        self.updates.record(SpeakerChange::Sex { old });
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn set_default_language(&mut self, value: impl Into<String>) {
        let old = mem::replace(&mut self.default_language, value.into());
        self.updates.record(SpeakerChange::DefaultLanguage { old });
    }

    pub fn portrait_base64(&self) -> Option<&str> {
        self.portrait_base64.as_deref()
    }

    pub fn set_portrait_base64(&mut self, value: Option<String>) {
        let old = mem::replace(&mut self.portrait_base64, value);
        self.updates.record(SpeakerChange::Portrait { old });
    }

    /// Pinned speakers stay in the document pool even when no paragraph
    /// references them.
    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn set_pinned(&mut self, value: bool) {
        let old = mem::replace(&mut self.pinned, value);
        self.updates.record(SpeakerChange::Pinned { old });
    }

    pub fn synchronized(&self) -> Option<DateTime<Utc>> {
        self.synchronized
    }

    pub fn set_synchronized(&mut self, value: Option<DateTime<Utc>>) {
        let old = mem::replace(&mut self.synchronized, value);
        self.updates.record(SpeakerChange::Synchronized { old });
    }

    pub fn identity(&self) -> &SpeakerIdentity {
        &self.identity
    }

    /// External id under the current scope. File-local speakers have none;
    /// other scopes generate one on first read and keep it.
    pub fn external_id(&mut self) -> Option<&str> {
        self.identity.materialize()
    }

    /// Assigns an external id. Fails once a user-scoped speaker already has
    /// one — user-assigned identities are immutable.
    pub fn set_external_id(&mut self, id: impl Into<String>) -> Result<(), IdentityError> {
        if self.identity.scope == IdentityScope::User && self.identity.id().is_some() {
            return Err(IdentityError::UserScopeLocked);
        }
        let old = self.identity.clone();
        self.identity = SpeakerIdentity::new(old.scope, Some(id.into()));
        self.updates.record(SpeakerChange::Identity { old });
        Ok(())
    }

    pub fn set_identity_scope(&mut self, scope: IdentityScope) {
        let old = self.identity.clone();
        self.identity = SpeakerIdentity::new(scope, old.id().map(str::to_string));
        self.updates.record(SpeakerChange::Identity { old });
    }

    /// Alternate identities accumulated from merges.
    pub fn merges(&self) -> &[SpeakerIdentity] {
        &self.merges
    }

    pub fn set_merges(&mut self, value: Vec<SpeakerIdentity>) {
        let old = mem::replace(&mut self.merges, value);
        self.updates.record(SpeakerChange::Merges { old });
    }

    pub fn attributes(&self) -> &[SpeakerAttribute] {
        &self.attributes
    }

    pub fn set_attributes(&mut self, value: Vec<SpeakerAttribute>) {
        let old = mem::replace(&mut self.attributes, value);
        self.updates.record(SpeakerChange::Attributes { old });
    }

    pub fn add_attribute(&mut self, attribute: SpeakerAttribute) {
        let mut next = self.attributes.clone();
        next.push(attribute);
        self.set_attributes(next);
    }

    pub fn elements(&self) -> &AttributeMap {
        &self.elements
    }

    pub fn set_elements(&mut self, value: AttributeMap) {
        let old = mem::replace(&mut self.elements, value);
        self.updates.record(SpeakerChange::Elements { old });
    }

    /// Per-document serial id used only across the load/save boundary.
    /// Transient: not part of the undo record.
    pub fn serial_id(&self) -> i32 {
        self.serial_id
    }

    pub fn set_serial_id(&mut self, id: i32) {
        self.serial_id = id;
    }

    /// Name parts joined for display and lookup; `---` when empty.
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        for part in [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.surname.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(part);
        }
        if name.is_empty() {
            name.push_str("---");
        }
        name
    }

    /// Folds `source` into this speaker: every scalar field is copied except
    /// identity; alternate identities and attributes are unioned. A non-file
    /// source identity that differs from ours joins the alternates, so
    /// references to the merged-away speaker keep resolving.
    ///
    /// Reading a non-file identity materializes its id, hence the mutable
    /// source.
    pub fn merge_from(&mut self, source: &mut Speaker) {
        self.set_first_name(source.first_name.clone());
        self.set_middle_name(source.middle_name.clone());
        self.set_surname(source.surname.clone());
        self.set_degree_before(source.degree_before.clone());
        self.set_degree_after(source.degree_after.clone());
        self.set_sex(source.sex);
        self.set_default_language(source.default_language.clone());
        self.set_portrait_base64(source.portrait_base64.clone());

        let mut merges = source.merges.clone();
        for alt in &self.merges {
            if !merges.contains(alt) {
                merges.push(alt.clone());
            }
        }
        if source.identity.scope != IdentityScope::File {
            let source_id = source.identity.materialize().map(str::to_string);
            let own_id = self.identity.materialize().map(str::to_string);
            if source_id != own_id {
                let alternate = SpeakerIdentity::new(source.identity.scope, source_id);
                if !merges.contains(&alternate) {
                    merges.push(alternate);
                }
            }
        }
        self.set_merges(merges);

        // Union keeps every distinct (name, value) pair; two values under
        // one name both survive.
        let mut attributes = self.attributes.clone();
        for attr in &source.attributes {
            if !attributes.iter().any(|a| a.same_entry(attr)) {
                attributes.push(attr.clone());
            }
        }
        self.set_attributes(attributes);
    }

    /// Deep copy carrying everything but identity; the copy starts
    /// file-local and detached. May materialize this speaker's id (see
    /// [`Speaker::merge_from`]).
    pub fn duplicate(&mut self) -> Speaker {
        let mut copy = Speaker::new();
        copy.merge_from(self);
        copy
    }

    pub fn updates(&self) -> &UpdateTracker<SpeakerChange> {
        &self.updates
    }

    pub fn updates_mut(&mut self) -> &mut UpdateTracker<SpeakerChange> {
        &mut self.updates
    }

    /// Restores the previous value carried by `change`.
    pub fn revert(&mut self, change: SpeakerChange) {
        match change {
            SpeakerChange::FirstName { old } => self.set_first_name(old),
            SpeakerChange::MiddleName { old } => self.set_middle_name(old),
            SpeakerChange::Surname { old } => self.set_surname(old),
            SpeakerChange::DegreeBefore { old } => self.set_degree_before(old),
            SpeakerChange::DegreeAfter { old } => self.set_degree_after(old),
            SpeakerChange::Sex { old } => self.set_sex(old),
            SpeakerChange::DefaultLanguage { old } => self.set_default_language(old),
            SpeakerChange::Portrait { old } => self.set_portrait_base64(old),
            SpeakerChange::Pinned { old } => self.set_pinned(old),
            SpeakerChange::Identity { old } => {
                let current = mem::replace(&mut self.identity, old);
                self.updates
                    .record(SpeakerChange::Identity { old: current });
            }
            SpeakerChange::Merges { old } => self.set_merges(old),
            SpeakerChange::Attributes { old } => self.set_attributes(old),
            SpeakerChange::Elements { old } => self.set_elements(old),
            SpeakerChange::Synchronized { old } => self.set_synchronized(old),
        }
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_joins_and_falls_back() {
        let mut speaker = Speaker::named("Jan", "Novak");
        assert_eq!(speaker.full_name(), "Jan Novak");
        speaker.set_middle_name(Some("K.".to_string()));
        assert_eq!(speaker.full_name(), "Jan K. Novak");
        assert_eq!(Speaker::new().full_name(), "---");
    }

    #[test]
    fn test_file_scope_has_no_external_id() {
        let mut speaker = Speaker::new();
        assert_eq!(speaker.external_id(), None);
    }

    #[test]
    fn test_lazy_id_generated_once_for_api_scope() {
        let mut speaker = Speaker::new();
        speaker.set_identity_scope(IdentityScope::Api);
        let first = speaker.external_id().unwrap().to_string();
        assert!(!first.is_empty());
        assert_eq!(speaker.external_id(), Some(first.as_str()));
    }

    #[test]
    fn test_user_scope_locks_id_once_set() {
        let mut speaker = Speaker::new();
        speaker.set_identity_scope(IdentityScope::User);
        speaker.set_external_id("u-1").unwrap();
        assert_eq!(
            speaker.set_external_id("u-2"),
            Err(IdentityError::UserScopeLocked)
        );
        assert_eq!(speaker.identity().id(), Some("u-1"));
    }

    #[test]
    fn test_merge_appends_foreign_identity_as_alternate() {
        let mut into = Speaker::named("A", "A");
        let mut from = Speaker::named("B", "B");
        from.set_identity_scope(IdentityScope::Api);
        from.set_external_id("X").unwrap();

        into.merge_from(&mut from);

        assert_eq!(into.first_name(), "B");
        assert_eq!(into.identity().scope, IdentityScope::File);
        assert!(into
            .merges()
            .iter()
            .any(|m| m.scope == IdentityScope::Api && m.id() == Some("X")));
    }

    #[test]
    fn test_merge_ignores_file_scoped_source_identity() {
        let mut into = Speaker::named("A", "A");
        let mut from = Speaker::named("B", "B");
        into.merge_from(&mut from);
        assert!(into.merges().is_empty());
    }

    #[test]
    fn test_merge_attribute_dedup_is_exact_pairs() {
        let mut into = Speaker::new();
        into.add_attribute(SpeakerAttribute::new("comment", "x"));
        into.add_attribute(SpeakerAttribute::new("role", "host"));

        let mut from = Speaker::new();
        from.add_attribute(SpeakerAttribute::new("comment", "x"));
        from.add_attribute(SpeakerAttribute::new("comment", "y"));

        into.merge_from(&mut from);

        let comments: Vec<_> = into
            .attributes()
            .iter()
            .filter(|a| a.name == "comment")
            .map(|a| a.value.as_str())
            .collect();
        assert_eq!(comments, vec!["x", "y"]);
    }

    #[test]
    fn test_duplicate_gets_fresh_identity() {
        let mut original = Speaker::named("Jan", "Novak");
        original.set_identity_scope(IdentityScope::Api);
        let original_id = original.external_id().unwrap().to_string();

        let mut copy = original.duplicate();
        assert_eq!(copy.full_name(), "Jan Novak");
        assert_eq!(copy.identity().scope, IdentityScope::File);
        assert_eq!(copy.external_id(), None);
        assert!(copy
            .merges()
            .iter()
            .any(|m| m.id() == Some(original_id.as_str())));
    }

    #[test]
    fn test_default_speaker_is_identity_compared() {
        let a = Speaker::default_speaker();
        let b = Speaker::default_speaker();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(Speaker::is_default(&a));
        assert!(!Speaker::is_default(&Speaker::new().into_ref()));
    }

    #[test]
    fn test_revert_restores_scalar() {
        let records = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&records);

        let mut speaker = Speaker::named("Jan", "Novak");
        speaker
            .updates_mut()
            .set_listener(move |mut batch| sink.borrow_mut().append(&mut batch));
        speaker.set_surname("Svoboda");

        let change = records.borrow_mut().pop().unwrap();
        speaker.revert(change);
        assert_eq!(speaker.surname(), "Novak");
    }
}
