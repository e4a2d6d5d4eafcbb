//! Error types for the document model

use crate::address::{Level, PositionAddress};
use thiserror::Error;

/// Malformed or out-of-range addressing, surfaced immediately and never
/// recovered locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address {address}")]
    Invalid { address: PositionAddress },

    #[error("{level} index {index} out of range (len {len})")]
    OutOfRange {
        level: Level,
        index: usize,
        len: usize,
    },

    #[error("address {address} does not reach the {expected} level")]
    LevelMismatch {
        address: PositionAddress,
        expected: Level,
    },
}

/// Illegal mutation of a speaker's external identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("external id of a user-scoped speaker cannot be changed once set")]
    UserScopeLocked,
}

/// Contract violations that remain representable at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("cannot set a serial speaker id while a speaker is attached")]
    SerialIdWhileSpeakerAttached,

    #[error("the default speaker sentinel cannot join a speaker pool")]
    SentinelInPool,
}

/// Unknown label encountered while parsing a paragraph flag set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown paragraph flag `{label}`")]
pub struct FlagParseError {
    pub label: String,
}
