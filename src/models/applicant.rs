//! Applicant model.
//!
//! The proposing side of the market. An applicant ranks every slot,
//! proposes to them in order through a monotone cursor, and holds at
//! most `credit_limit` slots at any observable point.

use std::collections::BTreeSet;

use super::ids::inverse_ranking;
use super::{ApplicantId, SlotId, TimePeriod};

/// An applicant with a strict preference ranking over all slots.
#[derive(Debug, Clone)]
pub struct Applicant {
    id: ApplicantId,
    credit_limit: usize,
    /// Most-preferred first.
    preference_ranking: Vec<SlotId>,
    /// `rank_index[slot] = position in preference_ranking`.
    rank_index: Vec<usize>,
    proposal_cursor: usize,
    eligible: bool,
    held: BTreeSet<SlotId>,
    unavailable_time_periods: BTreeSet<TimePeriod>,
}

impl Applicant {
    /// Creates an applicant.
    ///
    /// The ranking must be a permutation of every slot id in the market;
    /// this is checked when the applicant is placed into a [`Market`].
    ///
    /// [`Market`]: super::Market
    pub fn new(id: ApplicantId, credit_limit: usize, preference_ranking: Vec<SlotId>) -> Self {
        let rank_index = inverse_ranking(
            preference_ranking.iter().map(|s| s.index()),
            preference_ranking.len(),
        );
        Self {
            id,
            credit_limit,
            eligible: !preference_ranking.is_empty(),
            preference_ranking,
            rank_index,
            proposal_cursor: 0,
            held: BTreeSet::new(),
            unavailable_time_periods: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ApplicantId {
        self.id
    }

    pub fn credit_limit(&self) -> usize {
        self.credit_limit
    }

    pub fn preference_ranking(&self) -> &[SlotId] {
        &self.preference_ranking
    }

    /// Number of slots the applicant ranks.
    pub fn catalog_size(&self) -> usize {
        self.preference_ranking.len()
    }

    pub fn proposal_cursor(&self) -> usize {
        self.proposal_cursor
    }

    /// Whether unexamined slots remain in the ranking.
    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Slots currently retained.
    pub fn held(&self) -> &BTreeSet<SlotId> {
        &self.held
    }

    /// Periods locked by the last conflict-resolution pass.
    pub fn unavailable_time_periods(&self) -> &BTreeSet<TimePeriod> {
        &self.unavailable_time_periods
    }

    pub fn holds(&self, slot: SlotId) -> bool {
        self.held.contains(&slot)
    }

    /// Remaining credit.
    pub fn spare_credit(&self) -> usize {
        self.credit_limit.saturating_sub(self.held.len())
    }

    /// Position of `slot` in the preference ranking (0 = most preferred).
    #[inline]
    pub fn rank_of(&self, slot: SlotId) -> Option<usize> {
        self.rank_index
            .get(slot.index())
            .copied()
            .filter(|&rank| rank != usize::MAX)
    }

    /// Proposes to the next `credit_limit - |held|` slots in the ranking.
    ///
    /// Returns an empty batch when the applicant is full or has exhausted
    /// its ranking.
    pub fn propose_batch(&mut self) -> Vec<SlotId> {
        self.propose_where(|_| Verdict::Propose)
    }

    /// Like [`propose_batch`](Self::propose_batch), but skips candidates
    /// whose period is already occupied.
    ///
    /// A period is occupied when it was locked by conflict resolution or is
    /// used by a currently held slot; such candidates consume the cursor.
    /// A candidate sharing its period with an earlier proposal of the same
    /// batch ends the batch without consuming the cursor, so it is examined
    /// again once that proposal has been answered.
    pub fn propose_batch_constrained<P>(&mut self, period_of: P) -> Vec<SlotId>
    where
        P: Fn(SlotId) -> Option<TimePeriod>,
    {
        let mut occupied = self.unavailable_time_periods.clone();
        occupied.extend(self.held.iter().filter_map(|&s| period_of(s)));
        let mut pending = BTreeSet::new();

        self.propose_where(|candidate| match period_of(candidate) {
            Some(period) if occupied.contains(&period) => Verdict::Skip,
            Some(period) if !pending.insert(period) => Verdict::Defer,
            _ => Verdict::Propose,
        })
    }

    /// Batch builder shared by both phases.
    ///
    /// The cursor advances once per proposed or skipped candidate. A
    /// deferred candidate stops the batch in place.
    fn propose_where<F>(&mut self, mut judge: F) -> Vec<SlotId>
    where
        F: FnMut(SlotId) -> Verdict,
    {
        let mut batch = Vec::new();
        while self.eligible && self.held.len() + batch.len() < self.credit_limit {
            let Some(&candidate) = self.preference_ranking.get(self.proposal_cursor) else {
                self.eligible = false;
                break;
            };
            let verdict = judge(candidate);
            if verdict == Verdict::Defer {
                break;
            }
            self.proposal_cursor += 1;
            if self.proposal_cursor >= self.preference_ranking.len() {
                self.eligible = false;
            }
            if verdict == Verdict::Propose {
                batch.push(candidate);
            }
        }
        batch
    }

    /// Records an accepted slot. No-op when already held.
    pub fn confirm(&mut self, slot: SlotId) {
        self.held.insert(slot);
    }

    /// Releases a slot. No-op when not held.
    pub fn evict(&mut self, slot: SlotId) {
        self.held.remove(&slot);
    }

    /// Sum of `catalog_size - rank` over held slots.
    pub fn utility(&self) -> u64 {
        self.utility_of(self.held.iter().copied())
    }

    /// Utility of an arbitrary set of slots. Unranked slots contribute 0.
    pub fn utility_of<I>(&self, slots: I) -> u64
    where
        I: IntoIterator<Item = SlotId>,
    {
        let catalog = self.catalog_size();
        slots
            .into_iter()
            .filter_map(|s| self.rank_of(s))
            .map(|rank| (catalog - rank) as u64)
            .sum()
    }

    /// Re-enters the applicant for the time-exclusive phase.
    ///
    /// Replaces the held set, locks the given periods, and rewinds the
    /// cursor to the top of the ranking.
    pub(crate) fn restart(
        &mut self,
        retained: BTreeSet<SlotId>,
        unavailable: BTreeSet<TimePeriod>,
    ) {
        self.held = retained;
        self.unavailable_time_periods = unavailable;
        self.proposal_cursor = 0;
        self.eligible = !self.preference_ranking.is_empty();
    }
}

/// Decision on the candidate under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Propose,
    Skip,
    /// Leave the cursor here and close the batch.
    Defer,
}
