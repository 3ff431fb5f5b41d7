//! Random market generation.
//!
//! Builds course-allocation style markets for simulation and testing:
//! applicants belong to a department and a cohort and rank every slot
//! uniformly at random; each slot belongs to a department and ranks
//! applicants in priority groups.
//!
//! # Slot priority
//!
//! 1. Applicants of the slot's own department, then everyone else.
//! 2. Within each group, senior cohorts (higher number) first.
//! 3. Within each (group, cohort) cell, a random shuffle.
//!
//! All randomness comes from one seeded [`StdRng`], so a configuration
//! always reproduces the same market.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matching::TimePeriodSource;
use crate::models::{
    Applicant, ApplicantId, Market, Slot, SlotId, TimePeriod, TimePeriodMap,
};

/// Market generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub applicants: usize,
    pub slots: usize,
    pub departments: u32,
    /// Number of seniority cohorts (class years).
    pub cohorts: u32,
    /// Credit limit given to every applicant.
    pub credit_limit: usize,
    /// Capacity given to every slot.
    pub capacity: usize,
    /// Periods drawn from by [`RandomPeriods`].
    pub time_periods: u32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            applicants: 5000,
            slots: 100,
            departments: 15,
            cohorts: 4,
            credit_limit: 4,
            capacity: 80,
            time_periods: 12,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Sets population sizes.
    pub fn with_size(mut self, applicants: usize, slots: usize) -> Self {
        self.applicants = applicants;
        self.slots = slots;
        self
    }

    pub fn with_departments(mut self, departments: u32) -> Self {
        self.departments = departments;
        self
    }

    pub fn with_cohorts(mut self, cohorts: u32) -> Self {
        self.cohorts = cohorts;
        self
    }

    pub fn with_credit_limit(mut self, credit_limit: usize) -> Self {
        self.credit_limit = credit_limit;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_time_periods(mut self, time_periods: u32) -> Self {
        self.time_periods = time_periods;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Department and cohort of a generated applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub department: u32,
    pub cohort: u32,
}

/// A generated market with the attributes its rankings were built from.
#[derive(Debug, Clone)]
pub struct GeneratedMarket {
    pub market: Market,
    /// Indexed by applicant id.
    pub applicant_profiles: Vec<Profile>,
    /// Indexed by slot id.
    pub slot_departments: Vec<u32>,
}

/// Seeded market generator.
///
/// # Example
///
/// ```
/// use u_match::generator::{GeneratorConfig, MarketGenerator};
///
/// let config = GeneratorConfig::default().with_size(50, 8).with_capacity(10);
/// let generated = MarketGenerator::new(config).generate().unwrap();
/// assert_eq!(generated.market.applicants().len(), 50);
/// assert_eq!(generated.market.catalog_size(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct MarketGenerator {
    config: GeneratorConfig,
}

impl MarketGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a market.
    ///
    /// # Errors
    /// Only if the generated rankings fail validation, which indicates a
    /// generator bug.
    pub fn generate(&self) -> Result<GeneratedMarket> {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let departments = config.departments.max(1);
        let cohorts = config.cohorts.max(1);

        let mut profiles = Vec::with_capacity(config.applicants);
        let mut applicants = Vec::with_capacity(config.applicants);
        for i in 0..config.applicants {
            let profile = Profile {
                department: rng.random_range(0..departments),
                cohort: rng.random_range(0..cohorts),
            };
            let mut ranking: Vec<SlotId> = (0..config.slots).map(SlotId).collect();
            ranking.shuffle(&mut rng);
            applicants.push(Applicant::new(ApplicantId(i), config.credit_limit, ranking));
            profiles.push(profile);
        }

        let mut slot_departments = Vec::with_capacity(config.slots);
        let mut slots = Vec::with_capacity(config.slots);
        for j in 0..config.slots {
            let department = rng.random_range(0..departments);
            let ranking = priority_ranking(&profiles, department, cohorts, &mut rng);
            slots.push(Slot::new(SlotId(j), config.capacity, ranking));
            slot_departments.push(department);
        }

        tracing::debug!(
            applicants = config.applicants,
            slots = config.slots,
            seed = config.seed,
            "generated market"
        );

        Ok(GeneratedMarket {
            market: Market::new(applicants, slots)?,
            applicant_profiles: profiles,
            slot_departments,
        })
    }

    /// Period source drawing from the configured number of periods,
    /// seeded independently of the market.
    pub fn random_periods(&self, seed: u64) -> RandomPeriods {
        RandomPeriods::new(self.config.time_periods, seed)
    }
}

/// Home department first, then others; senior cohorts first; shuffled cells.
fn priority_ranking<R: Rng>(
    profiles: &[Profile],
    department: u32,
    cohorts: u32,
    rng: &mut R,
) -> Vec<ApplicantId> {
    let mut ranking = Vec::with_capacity(profiles.len());
    for home in [true, false] {
        for cohort in (0..cohorts).rev() {
            let mut cell: Vec<ApplicantId> = profiles
                .iter()
                .enumerate()
                .filter(|(_, p)| (p.department == department) == home && p.cohort == cohort)
                .map(|(i, _)| ApplicantId(i))
                .collect();
            cell.shuffle(rng);
            ranking.extend(cell);
        }
    }
    ranking
}

/// Assigns every slot a uniformly random period.
#[derive(Debug, Clone)]
pub struct RandomPeriods {
    periods: u32,
    rng: StdRng,
}

impl RandomPeriods {
    /// Draws from `0..periods` (at least one period).
    pub fn new(periods: u32, seed: u64) -> Self {
        Self {
            periods: periods.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a map for `slots` slots.
    pub fn draw(&mut self, slots: usize) -> TimePeriodMap {
        (0..slots)
            .map(|j| (SlotId(j), TimePeriod(self.rng.random_range(0..self.periods))))
            .collect()
    }
}

impl TimePeriodSource for RandomPeriods {
    fn assign(&mut self, market: &Market) -> TimePeriodMap {
        self.draw(market.catalog_size())
    }
}
