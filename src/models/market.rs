//! Market arena.
//!
//! Owns both populations in contiguous storage indexed by id. Entities
//! refer to each other only through [`ApplicantId`] and [`SlotId`], so the
//! engine can borrow the two sides independently.

use std::collections::BTreeMap;

use super::{Applicant, ApplicantId, Enrollment, MatchOutcome, Roster, Slot, SlotId, TimePeriod};
use crate::error::{MatchError, Result};
use crate::validation::validate_market;

/// Total assignment of slots to time periods.
pub type TimePeriodMap = BTreeMap<SlotId, TimePeriod>;

/// Both sides of a matching market.
#[derive(Debug, Clone)]
pub struct Market {
    applicants: Vec<Applicant>,
    slots: Vec<Slot>,
}

impl Market {
    /// Builds a market after validating ids and rankings.
    ///
    /// # Errors
    /// [`MatchError::InvalidRanking`] for the first structural problem found.
    pub fn new(applicants: Vec<Applicant>, slots: Vec<Slot>) -> Result<Self> {
        if let Err(errors) = validate_market(&applicants, &slots) {
            if let Some(first) = errors.into_iter().next() {
                return Err(MatchError::InvalidRanking {
                    owner: first.entity_id,
                    reason: first.message,
                });
            }
        }
        Ok(Self { applicants, slots })
    }

    pub fn applicants(&self) -> &[Applicant] {
        &self.applicants
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn applicant(&self, id: ApplicantId) -> Option<&Applicant> {
        self.applicants.get(id.index())
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    /// Mutable slot access, for capacity updates before matching.
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index())
    }

    /// Number of slots every applicant ranks.
    pub fn catalog_size(&self) -> usize {
        self.slots.len()
    }

    pub fn max_credit_limit(&self) -> usize {
        self.applicants
            .iter()
            .map(Applicant::credit_limit)
            .max()
            .unwrap_or(0)
    }

    /// Total ranking entries across applicants; each proposal consumes one.
    pub fn proposal_volume(&self) -> usize {
        self.applicants
            .iter()
            .map(|a| a.preference_ranking().len())
            .sum()
    }

    /// Disjoint mutable views of both sides.
    pub(crate) fn split_mut(&mut self) -> (&mut [Applicant], &mut [Slot]) {
        (self.applicants.as_mut_slice(), self.slots.as_mut_slice())
    }

    /// Pins every slot to its period.
    ///
    /// # Errors
    /// [`MatchError::MissingTimePeriod`] if the map does not cover a slot.
    /// No slot is modified in that case.
    pub fn assign_time_periods(&mut self, periods: &TimePeriodMap) -> Result<()> {
        if let Some(slot) = self.slots.iter().find(|s| !periods.contains_key(&s.id())) {
            return Err(MatchError::MissingTimePeriod { slot: slot.id() });
        }
        for slot in &mut self.slots {
            if let Some(&period) = periods.get(&slot.id()) {
                slot.set_time_period(period);
            }
        }
        Ok(())
    }

    /// Checks credit, capacity and two-sided membership.
    ///
    /// `round` is only used to label the error.
    pub fn verify_invariants(&self, round: usize) -> Result<()> {
        for slot in &self.slots {
            if slot.enrolled_count() > slot.capacity() {
                return Err(MatchError::CapacityViolation {
                    slot: slot.id(),
                    holders: slot.enrolled_count(),
                    capacity: slot.capacity(),
                    round,
                });
            }
            for applicant in slot.all_holders() {
                let held = self
                    .applicant(applicant)
                    .is_some_and(|a| a.holds(slot.id()));
                if !held {
                    return Err(MatchError::InconsistentMembership {
                        applicant,
                        slot: slot.id(),
                        round,
                    });
                }
            }
        }

        for applicant in &self.applicants {
            if applicant.held().len() > applicant.credit_limit() {
                return Err(MatchError::CreditViolation {
                    applicant: applicant.id(),
                    held: applicant.held().len(),
                    credit_limit: applicant.credit_limit(),
                    round,
                });
            }
            for &slot in applicant.held() {
                let listed = self.slot(slot).is_some_and(|s| s.holds(applicant.id()));
                if !listed {
                    return Err(MatchError::InconsistentMembership {
                        applicant: applicant.id(),
                        slot,
                        round,
                    });
                }
            }
        }

        Ok(())
    }

    /// Snapshot of current holdings.
    pub fn outcome(&self) -> MatchOutcome {
        let enrollments = self
            .applicants
            .iter()
            .map(|a| Enrollment {
                applicant: a.id(),
                slots: a.held().iter().copied().collect(),
                utility: a.utility(),
                credit_limit: a.credit_limit(),
            })
            .collect();

        let rosters = self
            .slots
            .iter()
            .map(|s| {
                let mut applicants: Vec<ApplicantId> = s.all_holders().collect();
                applicants.sort();
                Roster {
                    slot: s.id(),
                    applicants,
                    capacity: s.capacity(),
                    time_period: s.time_period(),
                }
            })
            .collect();

        MatchOutcome {
            enrollments,
            rosters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_market() -> Market {
        let applicants = vec![
            Applicant::new(ApplicantId(0), 1, vec![SlotId(0), SlotId(1)]),
            Applicant::new(ApplicantId(1), 1, vec![SlotId(1), SlotId(0)]),
        ];
        let slots = vec![
            Slot::new(SlotId(0), 1, vec![ApplicantId(0), ApplicantId(1)]),
            Slot::new(SlotId(1), 1, vec![ApplicantId(1), ApplicantId(0)]),
        ];
        Market::new(applicants, slots).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_ranking() {
        let applicants = vec![Applicant::new(
            ApplicantId(0),
            1,
            vec![SlotId(0), SlotId(0)],
        )];
        let slots = vec![
            Slot::new(SlotId(0), 1, vec![ApplicantId(0)]),
            Slot::new(SlotId(1), 1, vec![ApplicantId(0)]),
        ];
        let err = Market::new(applicants, slots).unwrap_err();
        assert!(matches!(err, MatchError::InvalidRanking { ref owner, .. } if owner == "a0"));
    }

    #[test]
    fn test_assign_time_periods_requires_total_map() {
        let mut market = sample_market();
        let partial = TimePeriodMap::from([(SlotId(0), TimePeriod(0))]);
        assert_eq!(
            market.assign_time_periods(&partial),
            Err(MatchError::MissingTimePeriod { slot: SlotId(1) })
        );
        assert_eq!(market.slots()[0].time_period(), None);

        let total = TimePeriodMap::from([(SlotId(0), TimePeriod(0)), (SlotId(1), TimePeriod(3))]);
        market.assign_time_periods(&total).unwrap();
        assert_eq!(market.slots()[1].time_period(), Some(TimePeriod(3)));
    }

    #[test]
    fn test_verify_detects_one_sided_membership() {
        let mut market = sample_market();
        assert!(market.verify_invariants(0).is_ok());

        let (applicants, _) = market.split_mut();
        applicants[0].confirm(SlotId(1));
        assert_eq!(
            market.verify_invariants(4),
            Err(MatchError::InconsistentMembership {
                applicant: ApplicantId(0),
                slot: SlotId(1),
                round: 4,
            })
        );
    }

    #[test]
    fn test_outcome_empty_market() {
        let market = Market::new(Vec::new(), Vec::new()).unwrap();
        let outcome = market.outcome();
        assert!(outcome.enrollments.is_empty());
        assert!(outcome.rosters.is_empty());
        assert_eq!(market.max_credit_limit(), 0);
        assert_eq!(market.proposal_volume(), 0);
    }

    #[test]
    fn test_proposal_volume_counts_rankings() {
        assert_eq!(sample_market().proposal_volume(), 4);
    }
}
