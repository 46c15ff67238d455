//! Ledger configuration.

use std::str::FromStr;

use thiserror::Error;

/// Who may move items along their lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any identity may sell, return or recycle any item.
    #[default]
    Open,

    /// Only the manufacturer owning an item's product may move it.
    OwnerOnly,
}

impl TransitionPolicy {
    /// Returns true if transitions must be issued by the product owner.
    pub fn requires_owner(&self) -> bool {
        matches!(self, TransitionPolicy::OwnerOnly)
    }

    /// Returns the policy name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPolicy::Open => "open",
            TransitionPolicy::OwnerOnly => "owner-only",
        }
    }
}

impl std::fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an unrecognized transition policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown transition policy: {0:?} (expected \"open\" or \"owner-only\")")]
pub struct UnknownTransitionPolicy(pub String);

impl FromStr for TransitionPolicy {
    type Err = UnknownTransitionPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TransitionPolicy::Open),
            "owner-only" | "owner_only" => Ok(TransitionPolicy::OwnerOnly),
            _ => Err(UnknownTransitionPolicy(s.to_string())),
        }
    }
}

/// Tunables for the ledger service.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub transition_policy: TransitionPolicy,

    /// Events between snapshots; 0 disables snapshotting.
    pub snapshot_interval: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Open,
            snapshot_interval: 100,
        }
    }
}

impl LedgerConfig {
    /// Returns a config with the given transition policy.
    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    /// Returns a config with the given snapshot interval.
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("open".parse(), Ok(TransitionPolicy::Open));
        assert_eq!("Owner-Only".parse(), Ok(TransitionPolicy::OwnerOnly));
        assert_eq!("owner_only".parse(), Ok(TransitionPolicy::OwnerOnly));
        assert!("closed".parse::<TransitionPolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.transition_policy, TransitionPolicy::Open);
        assert_eq!(config.snapshot_interval, 100);
        assert!(!config.transition_policy.requires_owner());
    }

    #[test]
    fn test_policy_display_parses_back() {
        for policy in [TransitionPolicy::Open, TransitionPolicy::OwnerOnly] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
