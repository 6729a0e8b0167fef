//! Timestamps tagged as actual or planned.

use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// A date that remembers whether it was derived from an actual date.
///
/// Ordering is by value first. When two values coincide, planned sorts
/// before actual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotatedDateTime {
    pub value: NaiveDateTime,
    pub actual: bool,
}

impl AnnotatedDateTime {
    pub fn planned(value: NaiveDateTime) -> Self {
        Self {
            value,
            actual: false,
        }
    }

    pub fn actual(value: NaiveDateTime) -> Self {
        Self {
            value,
            actual: true,
        }
    }

    pub fn is_before(&self, other: &AnnotatedDateTime) -> bool {
        self.value < other.value
    }

    pub fn is_after(&self, other: &AnnotatedDateTime) -> bool {
        self.value > other.value
    }

    pub fn is_before_date(&self, date: NaiveDateTime) -> bool {
        self.value < date
    }

    /// The earlier of two optional dates. `candidate` only replaces `current`
    /// when strictly earlier.
    pub fn earliest(current: Option<Self>, candidate: Option<Self>) -> Option<Self> {
        match (current, candidate) {
            (None, c) => c,
            (c, None) => c,
            (Some(c), Some(n)) => Some(if n.is_before(&c) { n } else { c }),
        }
    }

    /// The later of two optional dates. `candidate` only replaces `current`
    /// when strictly later.
    pub fn latest(current: Option<Self>, candidate: Option<Self>) -> Option<Self> {
        match (current, candidate) {
            (None, c) => c,
            (c, None) => c,
            (Some(c), Some(n)) => Some(if n.is_after(&c) { n } else { c }),
        }
    }
}

impl PartialOrd for AnnotatedDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnnotatedDateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.actual.cmp(&other.actual))
    }
}
