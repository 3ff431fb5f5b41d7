//! Observability sinks for matching runs.
//!
//! The engine reports progress only through a [`MatchObserver`]; it never
//! writes output on its own. [`TracingObserver`] forwards to `tracing`,
//! [`RecordingObserver`] keeps everything in memory.

use serde::{Deserialize, Serialize};

use super::Phase;
use crate::conflict::Resolution;

/// Counters for one propose/evaluate round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub phase: Phase,
    /// 1-based round number within the phase.
    pub round: usize,
    /// Applicants that proposed at least once.
    pub active_applicants: usize,
    pub proposals: usize,
    /// Rejected newcomers plus bumped holders.
    pub rejections: usize,
}

/// Totals for a converged phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Rounds run, including the final silent round.
    pub rounds: usize,
    pub proposals: usize,
    pub rejections: usize,
}

impl PhaseReport {
    pub(crate) fn new(phase: Phase) -> Self {
        Self {
            phase,
            rounds: 0,
            proposals: 0,
            rejections: 0,
        }
    }

    pub(crate) fn absorb(&mut self, stats: &RoundStats) {
        self.rounds = stats.round;
        self.proposals += stats.proposals;
        self.rejections += stats.rejections;
    }
}

/// Receives progress events from the engine and the conflict resolver.
///
/// All hooks default to no-ops.
pub trait MatchObserver {
    /// Called after every round, including the final silent one.
    fn on_round(&mut self, _stats: &RoundStats) {}

    /// Called once a phase converges.
    fn on_converged(&mut self, _report: &PhaseReport) {}

    /// Called for every applicant after conflict resolution.
    fn on_resolution(&mut self, _resolution: &Resolution) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_round(&mut self, stats: &RoundStats) {
        tracing::debug!(
            phase = %stats.phase,
            round = stats.round,
            active = stats.active_applicants,
            proposals = stats.proposals,
            rejections = stats.rejections,
            "matching round"
        );
    }

    fn on_converged(&mut self, report: &PhaseReport) {
        tracing::info!(
            phase = %report.phase,
            rounds = report.rounds,
            proposals = report.proposals,
            rejections = report.rejections,
            "phase converged"
        );
    }

    fn on_resolution(&mut self, resolution: &Resolution) {
        if !resolution.evicted.is_empty() {
            tracing::trace!(
                applicant = %resolution.applicant,
                retained = resolution.retained.len(),
                evicted = resolution.evicted.len(),
                utility = resolution.utility,
                "conflicts resolved"
            );
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub rounds: Vec<RoundStats>,
    pub reports: Vec<PhaseReport>,
    pub resolutions: Vec<Resolution>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round stats of one phase.
    pub fn rounds_of(&self, phase: Phase) -> impl Iterator<Item = &RoundStats> {
        self.rounds.iter().filter(move |r| r.phase == phase)
    }
}

impl MatchObserver for RecordingObserver {
    fn on_round(&mut self, stats: &RoundStats) {
        self.rounds.push(*stats);
    }

    fn on_converged(&mut self, report: &PhaseReport) {
        self.reports.push(*report);
    }

    fn on_resolution(&mut self, resolution: &Resolution) {
        self.resolutions.push(resolution.clone());
    }
}
