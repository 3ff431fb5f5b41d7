//! Matching outcome (solution) model.
//!
//! A detached, serializable snapshot of who holds what: one enrollment
//! per applicant and one roster per slot.

use serde::{Deserialize, Serialize};

use super::{ApplicantId, SlotId, TimePeriod};

/// Holdings of every applicant and slot at the time of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// One entry per applicant, in id order.
    pub enrollments: Vec<Enrollment>,
    /// One entry per slot, in id order.
    pub rosters: Vec<Roster>,
}

/// Slots held by an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub applicant: ApplicantId,
    /// Ascending slot ids.
    pub slots: Vec<SlotId>,
    /// Preference-weighted utility of `slots`.
    pub utility: u64,
    pub credit_limit: usize,
}

/// Applicants held by a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub slot: SlotId,
    /// Ascending applicant ids.
    pub applicants: Vec<ApplicantId>,
    pub capacity: usize,
    /// `None` until periods are assigned.
    pub time_period: Option<TimePeriod>,
}

impl Enrollment {
    /// Whether every unit of credit is used.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.credit_limit
    }
}

impl Roster {
    /// Occupied fraction of capacity (0.0 for zero-capacity slots).
    pub fn fill_rate(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.applicants.len() as f64 / self.capacity as f64
        }
    }
}

impl MatchOutcome {
    /// Enrollment of a specific applicant.
    pub fn enrollment(&self, applicant: ApplicantId) -> Option<&Enrollment> {
        self.enrollments.get(applicant.index())
    }

    /// Roster of a specific slot.
    pub fn roster(&self, slot: SlotId) -> Option<&Roster> {
        self.rosters.get(slot.index())
    }

    /// Number of applicant-slot pairs.
    pub fn assignment_count(&self) -> usize {
        self.enrollments.iter().map(|e| e.slots.len()).sum()
    }

    /// Sum of all applicant utilities.
    pub fn total_utility(&self) -> u64 {
        self.enrollments.iter().map(|e| e.utility).sum()
    }

    /// Applicants holding two slots in the same period.
    ///
    /// Empty when the outcome is conflict-free or periods are unassigned.
    pub fn conflicted_applicants(&self) -> Vec<ApplicantId> {
        self.enrollments
            .iter()
            .filter(|e| {
                let mut seen = std::collections::BTreeSet::new();
                e.slots
                    .iter()
                    .filter_map(|s| self.roster(*s).and_then(|r| r.time_period))
                    .any(|period| !seen.insert(period))
            })
            .map(|e| e.applicant)
            .collect()
    }
}
