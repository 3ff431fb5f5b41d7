//! Utility-maximizing conflict resolution.
//!
//! # Algorithm
//!
//! For each applicant:
//! 1. Group held slots by time period. Singleton groups are safe.
//! 2. Enumerate one representative per conflict group (Cartesian product).
//! 3. Keep the combination with the highest total utility together with
//!    the safe slots; evict everything else on both sides.
//! 4. Lock the periods of the retained slots and rewind the applicant's
//!    cursor for the resolving phase.
//!
//! # Tie-break
//! Groups are visited by ascending period, members by ascending slot id,
//! and the last group varies fastest. The first combination reaching the
//! maximum wins. This is an arbitrary but reproducible rule.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::matching::MatchObserver;
use crate::models::{Applicant, ApplicantId, Market, SlotId, TimePeriod, TimePeriodMap};

/// What one applicant keeps and gives up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub applicant: ApplicantId,
    /// Ascending slot ids.
    pub retained: Vec<SlotId>,
    /// Ascending slot ids.
    pub evicted: Vec<SlotId>,
    /// Utility of `retained`.
    pub utility: u64,
    /// Periods occupied by `retained`.
    pub locked_periods: Vec<TimePeriod>,
}

/// Totals over all applicants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    /// Applicants with at least one conflict group.
    pub conflicted_applicants: usize,
    pub evictions: usize,
    pub retained_utility: u64,
}

/// Resolves time-period conflicts between the two matching phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Pins slots to `periods` and resolves every applicant.
    ///
    /// # Errors
    /// [`MatchError::MissingTimePeriod`] if `periods` does not cover every
    /// slot. The market is left untouched in that case.
    pub fn resolve(
        &self,
        market: &mut Market,
        periods: &TimePeriodMap,
        observer: &mut dyn MatchObserver,
    ) -> Result<ResolutionSummary> {
        market.assign_time_periods(periods)?;

        let mut summary = ResolutionSummary::default();
        let (applicants, slots) = market.split_mut();
        for applicant in applicants.iter_mut() {
            let (resolution, had_conflict) = Self::plan(applicant, |s| {
                slots.get(s.index()).and_then(|slot| slot.time_period())
            })?;

            for slot in &resolution.evicted {
                if let Some(slot) = slots.get_mut(slot.index()) {
                    slot.drop_applicant(applicant.id());
                }
            }
            applicant.restart(
                resolution.retained.iter().copied().collect(),
                resolution.locked_periods.iter().copied().collect(),
            );

            if had_conflict {
                summary.conflicted_applicants += 1;
            }
            summary.evictions += resolution.evicted.len();
            summary.retained_utility += resolution.utility;
            observer.on_resolution(&resolution);
        }

        tracing::debug!(
            conflicted = summary.conflicted_applicants,
            evictions = summary.evictions,
            "conflict resolution finished"
        );
        Ok(summary)
    }

    /// Chooses the retained subset for one applicant without mutating it.
    ///
    /// Returns the resolution and whether any conflict group existed.
    pub fn plan<P>(applicant: &Applicant, period_of: P) -> Result<(Resolution, bool)>
    where
        P: Fn(SlotId) -> Option<TimePeriod>,
    {
        let mut by_period: BTreeMap<TimePeriod, Vec<SlotId>> = BTreeMap::new();
        for &slot in applicant.held() {
            let period = period_of(slot).ok_or(MatchError::MissingTimePeriod { slot })?;
            by_period.entry(period).or_default().push(slot);
        }

        let (safe, conflicts): (Vec<_>, Vec<_>) =
            by_period.into_values().partition(|group| group.len() == 1);
        let safe: Vec<SlotId> = safe.into_iter().flatten().collect();
        let had_conflict = !conflicts.is_empty();

        let safe_utility = applicant.utility_of(safe.iter().copied());
        let picks = Self::best_combination(applicant, &conflicts, safe_utility);

        let retained: BTreeSet<SlotId> = safe.into_iter().chain(picks).collect();
        let evicted = applicant
            .held()
            .iter()
            .copied()
            .filter(|s| !retained.contains(s))
            .collect();
        let locked_periods: BTreeSet<TimePeriod> =
            retained.iter().filter_map(|&s| period_of(s)).collect();

        Ok((
            Resolution {
                applicant: applicant.id(),
                utility: applicant.utility_of(retained.iter().copied()),
                retained: retained.into_iter().collect(),
                evicted,
                locked_periods: locked_periods.into_iter().collect(),
            },
            had_conflict,
        ))
    }

    /// Odometer over one pick per group; first maximum wins.
    fn best_combination(
        applicant: &Applicant,
        groups: &[Vec<SlotId>],
        safe_utility: u64,
    ) -> Vec<SlotId> {
        let pick = |choice: &[usize]| -> Vec<SlotId> {
            groups.iter().zip(choice).map(|(g, &i)| g[i]).collect()
        };

        let total_of = |choice: &[usize]| safe_utility + applicant.utility_of(pick(choice));

        let mut choice = vec![0usize; groups.len()];
        let mut best_choice = choice.clone();
        let mut best_utility = total_of(&choice);

        'enumerate: loop {
            let total = total_of(&choice);
            if total > best_utility {
                best_utility = total;
                best_choice.clone_from(&choice);
            }

            let mut position = groups.len();
            loop {
                if position == 0 {
                    break 'enumerate;
                }
                position -= 1;
                choice[position] += 1;
                if choice[position] < groups[position].len() {
                    break;
                }
                choice[position] = 0;
            }
        }

        pick(&best_choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{DeferredAcceptance, NoopObserver, Phase, RecordingObserver};
    use crate::models::Slot;

    fn s(ids: &[usize]) -> Vec<SlotId> {
        ids.iter().map(|&i| SlotId(i)).collect()
    }

    fn holding(ranking: &[usize], held: &[usize]) -> Applicant {
        let mut a = Applicant::new(ApplicantId(0), held.len(), s(ranking));
        for &slot in held {
            a.confirm(SlotId(slot));
        }
        a
    }

    fn period_table(table: &'static [u32]) -> impl Fn(SlotId) -> Option<TimePeriod> {
        move |slot| table.get(slot.index()).map(|&t| TimePeriod(t))
    }

    #[test]
    fn test_keeps_higher_utility_conflicting_slot() {
        // Ranking s0 > s2 > s1 over a catalog of 3: utilities s0=3, s2=2, s1=1.
        // s0 and s1 share t0, s2 alone in t1.
        let a = holding(&[0, 2, 1], &[0, 1, 2]);
        let (resolution, had_conflict) =
            ConflictResolver::plan(&a, period_table(&[0, 0, 1])).unwrap();

        assert!(had_conflict);
        assert_eq!(resolution.retained, s(&[0, 2]));
        assert_eq!(resolution.evicted, s(&[1]));
        assert_eq!(resolution.utility, 5);
        assert_eq!(resolution.locked_periods, vec![TimePeriod(0), TimePeriod(1)]);
    }

    #[test]
    fn test_no_conflicts_keeps_everything() {
        let a = holding(&[0, 1, 2], &[0, 2]);
        let (resolution, had_conflict) =
            ConflictResolver::plan(&a, period_table(&[0, 1, 2])).unwrap();
        assert!(!had_conflict);
        assert_eq!(resolution.retained, s(&[0, 2]));
        assert!(resolution.evicted.is_empty());
    }

    #[test]
    fn test_independent_groups_pick_each_maximum() {
        // Catalog 6, ranking s5 > s4 > ... > s0.
        // t0: {s0, s3}, t1: {s1, s4}, t2: {s5}.
        let a = holding(&[5, 4, 3, 2, 1, 0], &[0, 1, 3, 4, 5]);
        let (resolution, _) =
            ConflictResolver::plan(&a, period_table(&[0, 1, 9, 0, 1, 2])).unwrap();
        assert_eq!(resolution.retained, s(&[3, 4, 5]));
        assert_eq!(resolution.evicted, s(&[0, 1]));
        // s5 = 6, s4 = 5, s3 = 4
        assert_eq!(resolution.utility, 15);
    }

    #[test]
    fn test_every_alternative_is_no_better() {
        let a = holding(&[2, 0, 3, 1], &[0, 1, 2, 3]);
        let periods = period_table(&[0, 0, 0, 1]);
        let (resolution, _) = ConflictResolver::plan(&a, &periods).unwrap();

        for alternative in [0, 1, 2] {
            let utility = a.utility_of([SlotId(alternative), SlotId(3)]);
            assert!(resolution.utility >= utility);
        }
        // s2 is most preferred in the t0 group.
        assert_eq!(resolution.retained, s(&[2, 3]));
    }

    #[test]
    fn test_missing_period_is_an_error() {
        let a = holding(&[0, 1], &[0, 1]);
        let err = ConflictResolver::plan(&a, period_table(&[0])).unwrap_err();
        assert_eq!(err, MatchError::MissingTimePeriod { slot: SlotId(1) });
    }

    #[test]
    fn test_resolve_updates_both_sides() {
        let applicants = vec![Applicant::new(ApplicantId(0), 3, s(&[0, 2, 1]))];
        let slots = (0..3)
            .map(|i| Slot::new(SlotId(i), 1, vec![ApplicantId(0)]))
            .collect();
        let mut market = Market::new(applicants, slots).unwrap();
        DeferredAcceptance::default()
            .run(&mut market, Phase::Initial, &mut NoopObserver)
            .unwrap();
        assert_eq!(market.applicants()[0].held().len(), 3);

        let periods = TimePeriodMap::from([
            (SlotId(0), TimePeriod(0)),
            (SlotId(1), TimePeriod(0)),
            (SlotId(2), TimePeriod(1)),
        ]);
        let mut recorder = RecordingObserver::new();
        let summary = ConflictResolver::new()
            .resolve(&mut market, &periods, &mut recorder)
            .unwrap();

        assert_eq!(summary.conflicted_applicants, 1);
        assert_eq!(summary.evictions, 1);
        assert_eq!(summary.retained_utility, 5);

        let applicant = &market.applicants()[0];
        assert_eq!(applicant.utility(), 5);
        assert!(applicant.is_eligible());
        assert_eq!(applicant.proposal_cursor(), 0);
        assert_eq!(
            applicant.unavailable_time_periods(),
            &BTreeSet::from([TimePeriod(0), TimePeriod(1)])
        );
        assert!(!market.slots()[1].holds(ApplicantId(0)));
        assert!(market.verify_invariants(0).is_ok());
        assert_eq!(recorder.resolutions[0].evicted, s(&[1]));
    }
}
