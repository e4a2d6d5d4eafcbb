//! # Timecodes
//!
//! Media-relative timestamps with an explicit unknown state. Unset times on
//! paragraphs are *derived* from neighbours during navigation, never
//! invented, so "unknown" has to be representable rather than smuggled in as
//! a negative sentinel.
//!
//! Serializes as integer milliseconds (or `null` when unknown), matching what
//! the persistence boundary expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A point on the media timeline, possibly unknown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timecode(Option<u64>);

impl Timecode {
    pub const UNKNOWN: Timecode = Timecode(None);
    pub const ZERO: Timecode = Timecode(Some(0));

    pub fn from_millis(millis: u64) -> Self {
        Timecode(Some(millis))
    }

    pub fn from_duration(duration: Duration) -> Self {
        Timecode(Some(duration.as_millis() as u64))
    }

    pub fn is_known(self) -> bool {
        self.0.is_some()
    }

    pub fn millis(self) -> Option<u64> {
        self.0
    }

    pub fn duration(self) -> Option<Duration> {
        self.0.map(Duration::from_millis)
    }

    /// Span from `self` to `end`; zero when either endpoint is unknown or
    /// the interval is negative.
    pub fn span_to(self, end: Timecode) -> Duration {
        match (self.0, end.0) {
            (Some(begin), Some(end)) if end >= begin => Duration::from_millis(end - begin),
            _ => Duration::ZERO,
        }
    }
}

impl From<Duration> for Timecode {
    fn from(duration: Duration) -> Self {
        Timecode::from_duration(duration)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ms) => write!(f, "{}ms", ms),
            None => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_distinct_from_zero() {
        assert_ne!(Timecode::UNKNOWN, Timecode::ZERO);
        assert!(!Timecode::UNKNOWN.is_known());
        assert!(Timecode::ZERO.is_known());
    }

    #[test]
    fn test_span() {
        let begin = Timecode::from_millis(1_000);
        let end = Timecode::from_millis(2_500);
        assert_eq!(begin.span_to(end), Duration::from_millis(1_500));
        assert_eq!(end.span_to(begin), Duration::ZERO);
        assert_eq!(begin.span_to(Timecode::UNKNOWN), Duration::ZERO);
        assert_eq!(Timecode::UNKNOWN.span_to(end), Duration::ZERO);
    }

    #[test]
    fn test_serde_millis() {
        assert_eq!(
            serde_json::to_string(&Timecode::from_millis(1234)).unwrap(),
            "1234"
        );
        assert_eq!(serde_json::to_string(&Timecode::UNKNOWN).unwrap(), "null");
        let back: Timecode = serde_json::from_str("1234").unwrap();
        assert_eq!(back, Timecode::from_millis(1234));
    }
}
