//! Two-phase matching pipeline.
//!
//! Sequences the initial phase, time-period assignment, conflict
//! resolution and the resolving phase over one market.

use serde::{Deserialize, Serialize};

use super::{DeferredAcceptance, MatchConfig, MatchObserver, Phase, PhaseReport};
use crate::conflict::{ConflictResolver, ResolutionSummary};
use crate::error::Result;
use crate::models::{Market, MatchOutcome, TimePeriodMap};

/// Supplies the slot → period map once the initial phase has converged.
///
/// Implemented for closures, so a partitioning step can inspect the
/// initial holdings before choosing periods, and for a [`TimePeriodMap`]
/// decided up front.
pub trait TimePeriodSource {
    fn assign(&mut self, market: &Market) -> TimePeriodMap;
}

impl<F> TimePeriodSource for F
where
    F: FnMut(&Market) -> TimePeriodMap,
{
    fn assign(&mut self, market: &Market) -> TimePeriodMap {
        self(market)
    }
}

impl TimePeriodSource for TimePeriodMap {
    fn assign(&mut self, _market: &Market) -> TimePeriodMap {
        self.clone()
    }
}

/// Totals of a two-phase run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoPhaseReport {
    /// `None` for baseline runs, which skip the initial phase.
    pub initial: Option<PhaseReport>,
    pub resolution: ResolutionSummary,
    pub resolving: PhaseReport,
    /// Final holdings.
    pub outcome: MatchOutcome,
}

/// Runs initial matching, conflict resolution and resolving matching.
///
/// # Example
///
/// ```
/// use u_match::matching::{MatchConfig, TracingObserver, TwoPhaseMatcher};
/// use u_match::models::{Applicant, ApplicantId, Market, Slot, SlotId, TimePeriod, TimePeriodMap};
///
/// let applicants = vec![Applicant::new(ApplicantId(0), 2, vec![SlotId(0), SlotId(1), SlotId(2)])];
/// let slots = (0..3)
///     .map(|i| Slot::new(SlotId(i), 1, vec![ApplicantId(0)]))
///     .collect();
/// let mut market = Market::new(applicants, slots).unwrap();
///
/// // s0 and s1 collide; s2 is free.
/// let mut periods = TimePeriodMap::from([
///     (SlotId(0), TimePeriod(0)),
///     (SlotId(1), TimePeriod(0)),
///     (SlotId(2), TimePeriod(1)),
/// ]);
///
/// let report = TwoPhaseMatcher::new(MatchConfig::default())
///     .run(&mut market, &mut periods, &mut TracingObserver)
///     .unwrap();
/// assert_eq!(report.outcome.enrollments[0].slots, vec![SlotId(0), SlotId(2)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TwoPhaseMatcher {
    engine: DeferredAcceptance,
    resolver: ConflictResolver,
}

impl TwoPhaseMatcher {
    /// Creates a pipeline.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            engine: DeferredAcceptance::new(config),
            resolver: ConflictResolver::new(),
        }
    }

    pub fn engine(&self) -> &DeferredAcceptance {
        &self.engine
    }

    /// Full run on a fresh market.
    ///
    /// # Errors
    /// Any [`MatchError`](crate::MatchError) from the phases or from an
    /// incomplete period map.
    pub fn run<S>(
        &self,
        market: &mut Market,
        periods: &mut S,
        observer: &mut dyn MatchObserver,
    ) -> Result<TwoPhaseReport>
    where
        S: TimePeriodSource + ?Sized,
    {
        let initial = self.engine.run(market, Phase::Initial, observer)?;
        let map = periods.assign(market);
        let resolution = self.resolver.resolve(market, &map, observer)?;
        let resolving = self.engine.run(market, Phase::Resolving, observer)?;

        Ok(TwoPhaseReport {
            initial: Some(initial),
            resolution,
            resolving,
            outcome: market.outcome(),
        })
    }

    /// Time-exclusive matching from empty holdings on periods fixed up front.
    ///
    /// This is the reference point the full run is compared against.
    pub fn run_baseline(
        &self,
        market: &mut Market,
        periods: &TimePeriodMap,
        observer: &mut dyn MatchObserver,
    ) -> Result<TwoPhaseReport> {
        let resolution = self.resolver.resolve(market, periods, observer)?;
        let resolving = self.engine.run(market, Phase::Resolving, observer)?;

        Ok(TwoPhaseReport {
            initial: None,
            resolution,
            resolving,
            outcome: market.outcome(),
        })
    }
}
