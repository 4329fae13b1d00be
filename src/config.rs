use serde::{Deserialize, Serialize};

/// What the link phase does when two tasks share a lookup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Fail with `DuplicateTaskKey`.
    #[default]
    Reject,
    /// Keep the first task (depth first) and log a warning.
    FirstMatch,
}

/// Settings for linking and resolving a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Verify every task once the link phase has propagated.
    #[serde(default)]
    pub verify_after_link: bool,
}

impl ResolverConfig {
    pub fn strict() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::Reject,
            verify_after_link: true,
        }
    }
}
