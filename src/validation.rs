//! Input validation for matching markets.
//!
//! Checks structural integrity of both populations before any matching
//! runs. Detects:
//! - Ids that do not match their arena position
//! - Rankings that repeat an id
//! - Rankings that name an id outside the opposite population
//! - Rankings that leave out part of the opposite population
//!
//! Every ranking must be a strict total order over the whole opposite
//! side, so all four checks reduce to "is this a permutation".

use crate::models::{Applicant, Slot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending applicant or slot (display form, e.g. `a3`).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An entity's id differs from its position in the arena.
    MisplacedId,
    /// A ranking lists the same id twice.
    DuplicateEntry,
    /// A ranking lists an id that does not exist.
    UnknownEntry,
    /// A ranking omits ids of the opposite population.
    MissingEntry,
}

impl ValidationError {
    fn new(
        kind: ValidationErrorKind,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

/// Validates the populations of a matching market.
///
/// Checks:
/// 1. `applicants[i].id() == i` and `slots[j].id() == j`
/// 2. Every preference ranking is a permutation of all slot ids
/// 3. Every priority ranking is a permutation of all applicant ids
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_market(applicants: &[Applicant], slots: &[Slot]) -> ValidationResult {
    let mut errors = Vec::new();

    for (position, a) in applicants.iter().enumerate() {
        if a.id().index() != position {
            errors.push(ValidationError::new(
                ValidationErrorKind::MisplacedId,
                a.id().to_string(),
                format!("Applicant {} stored at position {position}", a.id()),
            ));
        }
    }

    for (position, s) in slots.iter().enumerate() {
        if s.id().index() != position {
            errors.push(ValidationError::new(
                ValidationErrorKind::MisplacedId,
                s.id().to_string(),
                format!("Slot {} stored at position {position}", s.id()),
            ));
        }
    }

    for a in applicants {
        check_permutation(
            &a.id().to_string(),
            a.preference_ranking().iter().map(|s| s.index()),
            slots.len(),
            "slot",
            &mut errors,
        );
    }

    for s in slots {
        check_permutation(
            &s.id().to_string(),
            s.priority_ranking().iter().map(|a| a.index()),
            applicants.len(),
            "applicant",
            &mut errors,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that `ranking` is a permutation of `0..universe`.
fn check_permutation<I>(
    owner: &str,
    ranking: I,
    universe: usize,
    side: &str,
    errors: &mut Vec<ValidationError>,
) where
    I: IntoIterator<Item = usize>,
{
    let mut seen = vec![false; universe];
    let mut distinct = 0usize;

    for id in ranking {
        match seen.get_mut(id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEntry,
                owner,
                format!("Ranking of {owner} references unknown {side} {id}"),
            )),
            Some(true) => errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateEntry,
                owner,
                format!("Ranking of {owner} lists {side} {id} more than once"),
            )),
            Some(flag) => {
                *flag = true;
                distinct += 1;
            }
        }
    }

    if distinct < universe {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingEntry,
            owner,
            format!("Ranking of {owner} covers {distinct} of {universe} {side}s"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicantId, SlotId};

    fn slots_ranking(ids: &[usize]) -> Vec<SlotId> {
        ids.iter().map(|&i| SlotId(i)).collect()
    }

    fn applicants_ranking(ids: &[usize]) -> Vec<ApplicantId> {
        ids.iter().map(|&i| ApplicantId(i)).collect()
    }

    fn sample_applicants() -> Vec<Applicant> {
        vec![
            Applicant::new(ApplicantId(0), 1, slots_ranking(&[0, 1])),
            Applicant::new(ApplicantId(1), 2, slots_ranking(&[1, 0])),
        ]
    }

    fn sample_slots() -> Vec<Slot> {
        vec![
            Slot::new(SlotId(0), 1, applicants_ranking(&[1, 0])),
            Slot::new(SlotId(1), 1, applicants_ranking(&[0, 1])),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_market(&sample_applicants(), &sample_slots()).is_ok());
    }

    #[test]
    fn test_empty_market_is_valid() {
        assert!(validate_market(&[], &[]).is_ok());
    }

    #[test]
    fn test_misplaced_id() {
        let applicants = vec![
            Applicant::new(ApplicantId(1), 1, slots_ranking(&[0, 1])),
            Applicant::new(ApplicantId(0), 1, slots_ranking(&[1, 0])),
        ];

        let errors = validate_market(&applicants, &sample_slots()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MisplacedId));
    }

    #[test]
    fn test_duplicate_entry() {
        let mut applicants = sample_applicants();
        applicants[1] = Applicant::new(ApplicantId(1), 1, slots_ranking(&[1, 1]));

        let errors = validate_market(&applicants, &sample_slots()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateEntry && e.entity_id == "a1"));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingEntry));
    }

    #[test]
    fn test_unknown_entry() {
        let mut slots = sample_slots();
        slots[0] = Slot::new(SlotId(0), 1, applicants_ranking(&[1, 0, 5]));

        let errors = validate_market(&sample_applicants(), &slots).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownEntry && e.entity_id == "s0"));
    }

    #[test]
    fn test_missing_entry() {
        let mut slots = sample_slots();
        slots[1] = Slot::new(SlotId(1), 1, applicants_ranking(&[0]));

        let errors = validate_market(&sample_applicants(), &slots).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingEntry);
        assert!(errors[0].message.contains("1 of 2"));
    }

    #[test]
    fn test_multiple_errors() {
        let applicants = vec![Applicant::new(ApplicantId(3), 1, slots_ranking(&[]))];
        let slots = vec![Slot::new(SlotId(0), 1, applicants_ranking(&[0, 0]))];

        let errors = validate_market(&applicants, &slots).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
