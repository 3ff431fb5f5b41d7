//! Error type for market construction and matching runs.
//!
//! Only `InvalidRanking` and `MissingTimePeriod` are caused by input.
//! The remaining variants signal a broken protocol invariant and abort
//! the run with the diagnostic state attached.

use thiserror::Error;

use crate::matching::Phase;
use crate::models::{ApplicantId, SlotId};

/// Crate result alias.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors raised by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A preference or priority list is not a permutation of the opposite side.
    #[error("invalid ranking for {owner}: {reason}")]
    InvalidRanking { owner: String, reason: String },

    /// A slot holds more applicants than its capacity allows.
    #[error("slot {slot} holds {holders} applicants with capacity {capacity} (round {round})")]
    CapacityViolation {
        slot: SlotId,
        holders: usize,
        capacity: usize,
        round: usize,
    },

    /// An applicant holds more slots than its credit limit.
    #[error("applicant {applicant} holds {held} slots with credit limit {credit_limit} (round {round})")]
    CreditViolation {
        applicant: ApplicantId,
        held: usize,
        credit_limit: usize,
        round: usize,
    },

    /// The round guard was exceeded before the phase converged.
    #[error("{phase} phase did not converge within {rounds} rounds")]
    NonConvergence { phase: Phase, rounds: usize },

    /// Applicant and slot disagree about a holding.
    #[error("applicant {applicant} and slot {slot} disagree on membership (round {round})")]
    InconsistentMembership {
        applicant: ApplicantId,
        slot: SlotId,
        round: usize,
    },

    /// The time-period map does not cover a slot.
    #[error("no time period assigned to slot {slot}")]
    MissingTimePeriod { slot: SlotId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MatchError::CapacityViolation {
            slot: SlotId(3),
            holders: 5,
            capacity: 4,
            round: 2,
        };
        assert_eq!(
            err.to_string(),
            "slot s3 holds 5 applicants with capacity 4 (round 2)"
        );

        let err = MatchError::NonConvergence {
            phase: Phase::Resolving,
            rounds: 10,
        };
        assert_eq!(
            err.to_string(),
            "resolving phase did not converge within 10 rounds"
        );
    }
}
