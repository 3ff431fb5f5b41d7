//! Slot model.
//!
//! The accepting side of the market. A slot ranks every applicant by
//! priority and keeps one tentative holder set per matching phase.
//! Holders accepted in the initial phase are locked once it converges;
//! the resolving phase only fills what capacity they leave over.

use super::ids::inverse_ranking;
use super::{ApplicantId, SlotId, TimePeriod};
use crate::matching::Phase;

/// A capacity-limited slot with a strict priority ranking over applicants.
#[derive(Debug, Clone)]
pub struct Slot {
    id: SlotId,
    capacity: usize,
    /// Most-preferred first.
    priority_ranking: Vec<ApplicantId>,
    /// `priority_index[applicant] = position in priority_ranking`.
    priority_index: Vec<usize>,
    time_period: Option<TimePeriod>,
    initial_holders: Vec<ApplicantId>,
    resolving_holders: Vec<ApplicantId>,
}

/// Outcome of one [`Slot::evaluate_proposals`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Newcomers kept by the slot, in proposal order.
    pub accepted: Vec<ApplicantId>,
    /// Newcomers turned away plus previous holders bumped, in priority order.
    pub rejected: Vec<ApplicantId>,
}

impl Slot {
    /// Creates a slot.
    ///
    /// The ranking must be a permutation of every applicant id in the
    /// market; this is checked when the slot is placed into a [`Market`].
    ///
    /// [`Market`]: super::Market
    pub fn new(id: SlotId, capacity: usize, priority_ranking: Vec<ApplicantId>) -> Self {
        let priority_index = inverse_ranking(
            priority_ranking.iter().map(|a| a.index()),
            priority_ranking.len(),
        );
        Self {
            id,
            capacity,
            priority_ranking,
            priority_index,
            time_period: None,
            initial_holders: Vec::new(),
            resolving_holders: Vec::new(),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Updates the capacity. Only meaningful before any phase runs.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn priority_ranking(&self) -> &[ApplicantId] {
        &self.priority_ranking
    }

    /// Position of `applicant` in the priority ranking (0 = most preferred).
    #[inline]
    pub fn priority_of(&self, applicant: ApplicantId) -> Option<usize> {
        self.priority_index
            .get(applicant.index())
            .copied()
            .filter(|&rank| rank != usize::MAX)
    }

    pub fn time_period(&self) -> Option<TimePeriod> {
        self.time_period
    }

    pub(crate) fn set_time_period(&mut self, period: TimePeriod) {
        self.time_period = Some(period);
    }

    /// Holders for a phase.
    pub fn holders(&self, phase: Phase) -> &[ApplicantId] {
        match phase {
            Phase::Initial => &self.initial_holders,
            Phase::Resolving => &self.resolving_holders,
        }
    }

    /// All current holders across both phases.
    pub fn all_holders(&self) -> impl Iterator<Item = ApplicantId> + '_ {
        self.initial_holders
            .iter()
            .chain(self.resolving_holders.iter())
            .copied()
    }

    pub fn holds(&self, applicant: ApplicantId) -> bool {
        self.initial_holders.contains(&applicant) || self.resolving_holders.contains(&applicant)
    }

    /// Number of holders across both phases.
    pub fn enrolled_count(&self) -> usize {
        self.initial_holders.len() + self.resolving_holders.len()
    }

    /// Places available to a phase.
    ///
    /// The resolving phase sees only what the locked initial holders leave.
    pub fn residual_capacity(&self, phase: Phase) -> usize {
        match phase {
            Phase::Initial => self.capacity,
            Phase::Resolving => self.capacity.saturating_sub(self.initial_holders.len()),
        }
    }

    /// Tentatively accepts the highest-priority applicants among the current
    /// phase holders and `proposals`.
    ///
    /// When everyone fits, all proposals are accepted. Otherwise the
    /// combined set is ordered by priority and cut at the residual
    /// capacity; a previous holder below the cut is bumped.
    pub fn evaluate_proposals(&mut self, proposals: &[ApplicantId], phase: Phase) -> Evaluation {
        let limit = self.residual_capacity(phase);
        let holders = match phase {
            Phase::Initial => &mut self.initial_holders,
            Phase::Resolving => &mut self.resolving_holders,
        };

        if holders.len() + proposals.len() <= limit {
            holders.extend_from_slice(proposals);
            return Evaluation {
                accepted: proposals.to_vec(),
                rejected: Vec::new(),
            };
        }

        let priority_index = &self.priority_index;
        let mut combined: Vec<ApplicantId> =
            holders.drain(..).chain(proposals.iter().copied()).collect();
        combined.sort_by_key(|a| priority_index.get(a.index()).copied().unwrap_or(usize::MAX));

        let rejected = combined.split_off(limit.min(combined.len()));
        *holders = combined;

        let accepted = proposals
            .iter()
            .copied()
            .filter(|p| holders.contains(p))
            .collect();

        Evaluation { accepted, rejected }
    }

    /// Removes an applicant from every holder set. No-op when absent.
    pub fn drop_applicant(&mut self, applicant: ApplicantId) {
        self.initial_holders.retain(|&a| a != applicant);
        self.resolving_holders.retain(|&a| a != applicant);
    }

    /// Merges resolving-phase holders into the final roster.
    pub(crate) fn finalize(&mut self) {
        let resolved = std::mem::take(&mut self.resolving_holders);
        self.initial_holders.extend(resolved);
    }
}
