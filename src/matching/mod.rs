//! Deferred-acceptance matching.
//!
//! Provides the round driver shared by both phases, its configuration,
//! the observability sink, and the two-phase pipeline that runs
//! unconstrained matching, conflict resolution and time-exclusive
//! matching in sequence.
//!
//! # Phases
//!
//! | Phase | Candidate filter | Capacity seen by a slot |
//! |-------|------------------|-------------------------|
//! | `Initial` | none | `capacity` |
//! | `Resolving` | skip slots in occupied periods | `capacity - locked initial holders` |
//!
//! # References
//!
//! - Gale & Shapley (1962), "College Admissions and the Stability of Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching", Ch. 5 (many-to-one)

mod config;
mod engine;
mod observer;
mod pipeline;

pub use config::MatchConfig;
pub use engine::DeferredAcceptance;
pub use observer::{
    MatchObserver, NoopObserver, PhaseReport, RecordingObserver, RoundStats, TracingObserver,
};
pub use pipeline::{TimePeriodSource, TwoPhaseMatcher, TwoPhaseReport};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Matching phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Unconstrained deferred acceptance.
    Initial,
    /// Time-exclusive deferred acceptance after conflict resolution.
    Resolving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initial => f.write_str("initial"),
            Phase::Resolving => f.write_str("resolving"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GeneratorConfig, MarketGenerator, RandomPeriods};
    use crate::kpi::MatchingKpi;
    use crate::models::Market;

    fn generated(seed: u64) -> Market {
        let config = GeneratorConfig::default()
            .with_size(120, 12)
            .with_departments(4)
            .with_credit_limit(3)
            .with_capacity(20)
            .with_time_periods(4)
            .with_seed(seed);
        MarketGenerator::new(config).generate().unwrap().market
    }

    /// No applicant-slot pair would both rather be matched to each other.
    fn assert_stable(market: &Market) {
        for a in market.applicants() {
            let worst_held = a.held().iter().filter_map(|&s| a.rank_of(s)).max();
            for s in market.slots() {
                if a.holds(s.id()) {
                    continue;
                }
                let Some(priority) = s.priority_of(a.id()) else {
                    continue;
                };
                let slot_would_take = s.enrolled_count() < s.capacity()
                    || s.all_holders()
                        .any(|h| s.priority_of(h).is_some_and(|p| p > priority));
                let rank = a.rank_of(s.id()).unwrap_or(usize::MAX);
                let applicant_wants =
                    a.spare_credit() > 0 || worst_held.is_some_and(|worst| rank < worst);
                assert!(
                    !(slot_would_take && applicant_wants),
                    "blocking pair ({}, {})",
                    a.id(),
                    s.id()
                );
            }
        }
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Initial.to_string(), "initial");
        assert_eq!(serde_json::to_string(&Phase::Resolving).unwrap(), "\"resolving\"");
    }

    #[test]
    fn test_initial_phase_is_stable() {
        for seed in 0..5 {
            let mut market = generated(seed);
            let engine = DeferredAcceptance::default();
            let bound = market.max_credit_limit() * market.catalog_size();
            let report = engine
                .run(&mut market, Phase::Initial, &mut NoopObserver)
                .unwrap();

            assert!(report.rounds <= bound);
            assert!(market.verify_invariants(report.rounds).is_ok());
            assert_stable(&market);
        }
    }

    #[test]
    fn test_two_phase_run_is_conflict_free() {
        for seed in 0..5 {
            let mut market = generated(seed);
            let mut periods = RandomPeriods::new(4, seed + 100);
            let mut recorder = RecordingObserver::new();
            let report = TwoPhaseMatcher::default()
                .run(&mut market, &mut periods, &mut recorder)
                .unwrap();

            assert!(report.outcome.conflicted_applicants().is_empty());
            assert!(market.verify_invariants(0).is_ok());
            for roster in &report.outcome.rosters {
                assert!(roster.applicants.len() <= roster.capacity);
            }
            for enrollment in &report.outcome.enrollments {
                assert!(enrollment.slots.len() <= enrollment.credit_limit);
            }

            let bound = market.max_credit_limit() * market.catalog_size();
            assert_eq!(recorder.reports.len(), 2);
            assert!(recorder.reports.iter().all(|r| r.rounds <= bound));
            assert_eq!(recorder.resolutions.len(), market.applicants().len());
        }
    }

    #[test]
    fn test_resolving_phase_never_lowers_retained_utility() {
        let mut market = generated(9);
        let mut periods = RandomPeriods::new(3, 1);
        let report = TwoPhaseMatcher::default()
            .run(&mut market, &mut periods, &mut NoopObserver)
            .unwrap();

        let kpi = MatchingKpi::calculate(&report.outcome);
        assert!(kpi.total_utility >= report.resolution.retained_utility);
    }

    #[test]
    fn test_baseline_runs_on_shared_periods() {
        let mut periods = RandomPeriods::new(4, 5);
        let map = periods.draw(12);

        let mut full = generated(3);
        let matched = TwoPhaseMatcher::default()
            .run(&mut full, &mut map.clone(), &mut NoopObserver)
            .unwrap();

        let mut fresh = generated(3);
        let baseline = TwoPhaseMatcher::default()
            .run_baseline(&mut fresh, &map, &mut NoopObserver)
            .unwrap();

        assert!(baseline.outcome.conflicted_applicants().is_empty());
        assert!(fresh.verify_invariants(0).is_ok());
        let gain = MatchingKpi::calculate(&matched.outcome)
            .welfare_gain(&MatchingKpi::calculate(&baseline.outcome));
        assert!(gain.is_finite());
    }
}
