//! Round-based deferred-acceptance driver.
//!
//! # Algorithm
//!
//! 1. Every applicant with spare credit and unexamined slots proposes a
//!    batch (time-filtered in the resolving phase).
//! 2. All proposals of the round are collected per slot before any slot
//!    decides.
//! 3. Each slot keeps the highest-priority applicants among its holders
//!    and newcomers, up to its residual capacity.
//! 4. Accepted applicants confirm, rejected and bumped ones evict.
//! 5. A round without proposals ends the phase.
//!
//! # Termination
//! Every proposal moves its applicant's cursor forward and cursors never
//! move back, so the rounds that carry proposals are bounded by the total
//! ranking length of the market. The default guard is that total, but no
//! less than `max_credit_limit * catalog_size`, plus the final silent round.
//! A phase that outlives it aborts with [`MatchError::NonConvergence`].
//!
//! # Reference
//! Gale & Shapley (1962), "College Admissions and the Stability of Marriage"

use std::collections::BTreeMap;

use super::{MatchConfig, MatchObserver, Phase, PhaseReport, RoundStats};
use crate::error::{MatchError, Result};
use crate::models::{Applicant, ApplicantId, Market, Slot, SlotId};

/// Deferred-acceptance engine shared by both phases.
///
/// # Example
///
/// ```
/// use u_match::matching::{DeferredAcceptance, NoopObserver, Phase};
/// use u_match::models::{Applicant, ApplicantId, Market, Slot, SlotId};
///
/// let applicants = vec![
///     Applicant::new(ApplicantId(0), 1, vec![SlotId(0)]),
///     Applicant::new(ApplicantId(1), 1, vec![SlotId(0)]),
/// ];
/// let slots = vec![Slot::new(SlotId(0), 1, vec![ApplicantId(1), ApplicantId(0)])];
/// let mut market = Market::new(applicants, slots).unwrap();
///
/// let engine = DeferredAcceptance::default();
/// engine.run(&mut market, Phase::Initial, &mut NoopObserver).unwrap();
/// assert!(market.slots()[0].holds(ApplicantId(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeferredAcceptance {
    config: MatchConfig,
}

impl DeferredAcceptance {
    /// Creates an engine.
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Maximum rounds a phase may take on `market`.
    pub fn round_guard(&self, market: &Market) -> usize {
        self.config.max_rounds.unwrap_or_else(|| {
            let per_applicant = market
                .max_credit_limit()
                .max(1)
                .saturating_mul(market.catalog_size());
            per_applicant
                .max(market.proposal_volume())
                .saturating_add(1)
        })
    }

    /// Runs one phase to convergence.
    ///
    /// A converged resolving phase also merges each slot's resolving
    /// holders into its final roster.
    ///
    /// # Errors
    /// - [`MatchError::NonConvergence`] when the round guard is exceeded.
    /// - [`MatchError::CapacityViolation`], [`MatchError::CreditViolation`]
    ///   or [`MatchError::InconsistentMembership`] on a broken invariant.
    pub fn run(
        &self,
        market: &mut Market,
        phase: Phase,
        observer: &mut dyn MatchObserver,
    ) -> Result<PhaseReport> {
        let guard = self.round_guard(market);
        let mut report = PhaseReport::new(phase);

        for round in 1..=guard {
            let stats = Self::round(market, phase, round)?;
            report.absorb(&stats);
            observer.on_round(&stats);

            if self.config.verify_invariants {
                market.verify_invariants(round)?;
            }

            if stats.proposals == 0 {
                if phase == Phase::Resolving {
                    let (_, slots) = market.split_mut();
                    slots.iter_mut().for_each(Slot::finalize);
                }
                observer.on_converged(&report);
                return Ok(report);
            }
        }

        Err(MatchError::NonConvergence {
            phase,
            rounds: guard,
        })
    }

    /// One propose/evaluate round.
    fn round(market: &mut Market, phase: Phase, round: usize) -> Result<RoundStats> {
        let (applicants, slots) = market.split_mut();

        // Barrier: every proposal of the round is collected before any slot decides.
        let mut proposals: BTreeMap<SlotId, Vec<ApplicantId>> = BTreeMap::new();
        let mut active_applicants = 0;
        let mut proposal_count = 0;
        for applicant in applicants.iter_mut() {
            let batch = Self::propose(applicant, phase, slots);
            if batch.is_empty() {
                continue;
            }
            active_applicants += 1;
            proposal_count += batch.len();
            for slot in batch {
                proposals.entry(slot).or_default().push(applicant.id());
            }
        }

        let mut rejections = 0;
        for (slot_id, proposers) in proposals {
            let Some(slot) = slots.get_mut(slot_id.index()) else {
                continue;
            };
            let evaluation = slot.evaluate_proposals(&proposers, phase);
            if slot.enrolled_count() > slot.capacity() {
                return Err(MatchError::CapacityViolation {
                    slot: slot_id,
                    holders: slot.enrolled_count(),
                    capacity: slot.capacity(),
                    round,
                });
            }

            for id in evaluation.accepted {
                if let Some(applicant) = applicants.get_mut(id.index()) {
                    applicant.confirm(slot_id);
                }
            }
            for id in evaluation.rejected {
                if let Some(applicant) = applicants.get_mut(id.index()) {
                    applicant.evict(slot_id);
                }
                rejections += 1;
            }
        }

        Ok(RoundStats {
            phase,
            round,
            active_applicants,
            proposals: proposal_count,
            rejections,
        })
    }

    /// Candidate filter of each phase.
    fn propose(applicant: &mut Applicant, phase: Phase, slots: &[Slot]) -> Vec<SlotId> {
        match phase {
            Phase::Initial => applicant.propose_batch(),
            Phase::Resolving => applicant.propose_batch_constrained(|s| {
                slots.get(s.index()).and_then(Slot::time_period)
            }),
        }
    }
}
