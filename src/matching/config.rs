//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for a deferred-acceptance run.
///
/// Deserializes from partial documents; missing fields take defaults.
///
/// ```
/// use u_match::matching::MatchConfig;
///
/// let config: MatchConfig = serde_json::from_str(r#"{"max_rounds": 50}"#).unwrap();
/// assert_eq!(config.max_rounds, Some(50));
/// assert!(config.verify_invariants);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Round guard override. `None` derives it from the market, see
    /// [`DeferredAcceptance::round_guard`](super::DeferredAcceptance::round_guard).
    pub max_rounds: Option<usize>,
    /// Check credit, capacity and two-sided membership after every round.
    pub verify_invariants: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: None,
            verify_invariants: true,
        }
    }
}

impl MatchConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit round guard.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Enables or disables per-round invariant checks.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = MatchConfig::new()
            .with_max_rounds(7)
            .with_invariant_checks(false);
        assert_eq!(config.max_rounds, Some(7));
        assert!(!config.verify_invariants);
    }

    #[test]
    fn test_deserialize_empty_document() {
        let config: MatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MatchConfig::default());
    }
}
