//! Matching market models.
//!
//! Provides the two sides of a many-to-one market, the arena that owns
//! them, and the detached outcome snapshot.
//!
//! # Domain Mappings
//!
//! | u-match | Course allocation | School choice | Residency |
//! |---------|-------------------|---------------|-----------|
//! | Applicant | Student | Pupil | Resident |
//! | Slot | Course | School | Hospital program |
//! | Credit limit | Course load | 1 | 1 |
//! | Time period | Lecture block | - | - |

mod applicant;
mod ids;
mod market;
mod outcome;
mod slot;

pub use applicant::Applicant;
pub use ids::{ApplicantId, SlotId, TimePeriod};
pub use market::{Market, TimePeriodMap};
pub use outcome::{Enrollment, MatchOutcome, Roster};
pub use slot::{Evaluation, Slot};
