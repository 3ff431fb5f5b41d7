//! Capacity-constrained many-to-one matching for the U-Engine ecosystem.
//!
//! Assigns applicants to slots with applicant-proposing deferred
//! acceptance, then repairs time-period conflicts once every slot is
//! pinned to a period and refills the freed capacity with a second,
//! time-exclusive matching pass.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Applicant`, `Slot`, `Market`, `MatchOutcome`
//! - **`validation`**: Input integrity checks (arena ids, permutation rankings)
//! - **`matching`**: Round driver, configuration, observers, two-phase pipeline
//! - **`conflict`**: Utility-maximizing conflict resolution between phases
//! - **`generator`**: Seeded random markets and period maps
//! - **`kpi`**: Welfare and enrollment metrics
//!
//! # Guarantees
//!
//! - Slot capacity and applicant credit are never exceeded.
//! - Applicant and slot always agree on who holds what.
//! - The initial phase yields a stable matching.
//! - After the resolving phase no applicant holds two slots in one period.
//!
//! # References
//!
//! - Gale & Shapley (1962), "College Admissions and the Stability of Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching"
//! - Budish & Cantillon (2012), "The Multi-unit Assignment Problem"

pub mod conflict;
mod error;
pub mod generator;
pub mod kpi;
pub mod matching;
pub mod models;
pub mod validation;

pub use error::{MatchError, Result};
