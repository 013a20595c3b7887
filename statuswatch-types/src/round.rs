//! The notification published after every completed round.

use std::collections::BTreeMap;

use crate::{CanonicalStatus, ChangeSet};

/// Result of one complete polling round.
///
/// `statuses` is the full cache after the round was applied, keyed by server
/// id; `changes` holds the change-set of every server polled in the round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RoundUpdate {
    /// Monotonic round counter, starting at 1.
    pub round: u64,

    /// Unix timestamp in milliseconds at which the round finished.
    pub completed_at_ms: u64,

    pub statuses: BTreeMap<String, CanonicalStatus>,

    pub changes: BTreeMap<String, ChangeSet>,
}

impl RoundUpdate {
    /// Change-set for one server, empty when it did not change or was not polled.
    pub fn changes_for(&self, id: &str) -> ChangeSet {
        self.changes.get(id).cloned().unwrap_or_default()
    }

    /// Number of servers with at least one changed field.
    pub fn changed_servers(&self) -> usize {
        self.changes.values().filter(|set| !set.is_empty()).count()
    }

    /// Number of servers whose latest outcome is an error.
    pub fn failed_servers(&self) -> usize {
        self.statuses.values().filter(|s| s.is_error()).count()
    }
}
