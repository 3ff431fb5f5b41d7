//! Schedule-conflict resolution between matching phases.
//!
//! Once every slot is pinned to a time period, an applicant may hold
//! several slots in the same period. The resolver keeps the
//! utility-maximizing conflict-free subset and releases the rest, so the
//! resolving phase can refill the vacated capacity.

mod resolver;

pub use resolver::{ConflictResolver, Resolution, ResolutionSummary};
