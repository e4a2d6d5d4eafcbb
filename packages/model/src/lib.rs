//! # Transcript Model
//!
//! In-memory model of a hierarchical, time-aligned transcript document, as
//! edited by speech-transcription tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Document                                    │
//! │  ├── Chapter*                               │
//! │  │    └── Section*                          │
//! │  │         └── Paragraph*  ──▶ Speaker      │
//! │  │              └── Phrase*     (pooled,    │
//! │  └── SpeakerPool  ◀─────────    non-owned)  │
//! └─────────────────────────────────────────────┘
//!          every container: TrackedList
//!          every owner:     UpdateTracker
//! ```
//!
//! ## Core Principles
//!
//! 1. **Single ownership**: every non-root element has exactly one owner;
//!    parent indices are stamped on attach and cleared on detach.
//! 2. **Everything reversible**: each mutation records the previous value;
//!    `revert` is a true inverse, and transactions coalesce records into
//!    one dispatch at the outermost boundary.
//! 3. **One coordinate reaches anything**: a [`PositionAddress`] locates
//!    and mutates any element from the document root.
//! 4. **Derived, never invented**: unknown paragraph times resolve through
//!    child phrases and neighbouring paragraphs.
//! 5. **Single-threaded, single-writer**: reads are reentrant-safe; edits
//!    are serialized by the embedding application.
//!
//! Wire formats, file I/O, and the GUI live outside this crate; the
//! persistence layer rebuilds documents bottom-up through the same mutation
//! surface as any other caller.

pub mod address;
pub mod attributes;
pub mod chapter;
pub mod document;
pub mod error;
pub mod languages;
pub mod list;
pub mod navigation;
pub mod paragraph;
pub mod phrase;
pub mod pool;
pub mod section;
pub mod speaker;
pub mod timecode;
pub mod tracker;

pub use address::{Level, PositionAddress, UNSET};
pub use attributes::AttributeMap;
pub use chapter::{Chapter, ChapterChange};
pub use document::{Document, DocumentChange, Element, ElementMut, ElementRef, TextMatch};
pub use error::{AddressError, FlagParseError, IdentityError, InvariantError};
pub use list::{ChildLink, ListChange, TrackedList};
pub use paragraph::{Paragraph, ParagraphChange, ParagraphFlags};
pub use phrase::{Phrase, PhraseChange};
pub use pool::SpeakerPool;
pub use section::{Section, SectionChange};
pub use speaker::{
    IdentityScope, Sex, Speaker, SpeakerAttribute, SpeakerChange, SpeakerIdentity, SpeakerRef,
    UNASSIGNED_SPEAKER_ID,
};
pub use timecode::Timecode;
pub use tracker::UpdateTracker;
