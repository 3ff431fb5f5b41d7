//! Matching quality metrics (KPIs).
//!
//! Computes welfare and enrollment indicators from a matching outcome.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total utility | Sum of applicant utilities |
//! | Average utility | Total utility / applicants |
//! | Full-load rate | Fraction of applicants using all credit |
//! | Unmatched | Applicants holding nothing |
//! | Fill rate | Occupied seats / total capacity |
//! | Enrollment sizes | Roster length per slot |

use serde::{Deserialize, Serialize};

use crate::models::MatchOutcome;

/// Outcome quality indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingKpi {
    pub total_utility: u64,
    pub avg_utility: f64,
    /// Per-applicant utility, in id order.
    pub utilities: Vec<u64>,
    /// Fraction of applicants holding `credit_limit` slots (0.0..1.0).
    pub full_load_rate: f64,
    pub unmatched_applicants: usize,
    /// Occupied seats over total capacity (0.0..1.0).
    pub fill_rate: f64,
    /// Roster length per slot, in id order.
    pub enrollment_sizes: Vec<usize>,
}

impl MatchingKpi {
    /// Computes KPIs from an outcome.
    pub fn calculate(outcome: &MatchOutcome) -> Self {
        let utilities: Vec<u64> = outcome.enrollments.iter().map(|e| e.utility).collect();
        let total_utility: u64 = utilities.iter().sum();
        let applicants = outcome.enrollments.len();

        let avg_utility = if applicants == 0 {
            0.0
        } else {
            total_utility as f64 / applicants as f64
        };

        let full_load_rate = if applicants == 0 {
            1.0
        } else {
            outcome.enrollments.iter().filter(|e| e.is_full()).count() as f64 / applicants as f64
        };

        let unmatched_applicants = outcome
            .enrollments
            .iter()
            .filter(|e| e.slots.is_empty())
            .count();

        let enrollment_sizes: Vec<usize> =
            outcome.rosters.iter().map(|r| r.applicants.len()).collect();
        let seats: usize = outcome.rosters.iter().map(|r| r.capacity).sum();
        let fill_rate = if seats == 0 {
            0.0
        } else {
            enrollment_sizes.iter().sum::<usize>() as f64 / seats as f64
        };

        Self {
            total_utility,
            avg_utility,
            utilities,
            full_load_rate,
            unmatched_applicants,
            fill_rate,
            enrollment_sizes,
        }
    }

    /// Average utility gained per applicant over `baseline`.
    pub fn welfare_gain(&self, baseline: &MatchingKpi) -> f64 {
        self.avg_utility - baseline.avg_utility
    }
}
