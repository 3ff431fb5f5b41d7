//! Identifier types.
//!
//! Applicants and slots live in contiguous arenas inside a [`Market`];
//! an id is the entity's index in its arena. All cross-references
//! between the two sides are expressed through these ids.
//!
//! [`Market`]: super::Market

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an applicant in the market arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub usize);

/// Index of a slot in the market arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub usize);

/// A time period a slot is pinned to between the two matching phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePeriod(pub u32);

impl ApplicantId {
    /// Arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl SlotId {
    /// Arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Builds the inverse of a ranking: `inverse[id] = position`.
///
/// Entries for ids outside the ranking stay `usize::MAX`. Callers validate
/// that the ranking is a permutation before relying on the result.
pub(crate) fn inverse_ranking<I>(ranking: I, universe: usize) -> Vec<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut inverse = vec![usize::MAX; universe];
    for (position, id) in ranking.into_iter().enumerate() {
        if let Some(slot) = inverse.get_mut(id) {
            *slot = position;
        }
    }
    inverse
}
