//! Latest-status cache and change detection.

use std::collections::BTreeMap;

use statuswatch_types::{CanonicalStatus, ChangeSet};

/// Most recent record per server id.
///
/// The previous record of a server lives only until the next round has been
/// diffed against it; no further history is kept.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: BTreeMap<String, CanonicalStatus>,
    rounds: u64,
    last_round_ms: Option<u64>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a complete round and return the change-set of every server in it.
    ///
    /// Servers absent from `round` are no longer configured and are evicted
    /// before comparison. A server seen for the first time has every field
    /// marked as changed.
    pub fn apply(
        &mut self,
        round: BTreeMap<String, CanonicalStatus>,
        completed_at_ms: u64,
    ) -> BTreeMap<String, ChangeSet> {
        self.entries.retain(|id, _| round.contains_key(id));

        let mut changes = BTreeMap::new();
        for (id, status) in round {
            let changed = status.diff(self.entries.get(&id));
            self.entries.insert(id.clone(), status);
            changes.insert(id, changed);
        }

        self.rounds += 1;
        self.last_round_ms = Some(completed_at_ms);
        changes
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalStatus> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> &BTreeMap<String, CanonicalStatus> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rounds applied since creation or the last clear.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Completion time of the last applied round.
    pub fn last_round_ms(&self) -> Option<u64> {
        self.last_round_ms
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statuswatch_types::{ServerConfig, StatusField};

    fn status(id: &str, allies: u32) -> CanonicalStatus {
        let server = ServerConfig::new(id, id, "http://x.example");
        CanonicalStatus::builder(&server).allies_count(allies).build(1)
    }

    fn round(entries: &[(&str, u32)]) -> BTreeMap<String, CanonicalStatus> {
        entries
            .iter()
            .map(|(id, allies)| (id.to_string(), status(id, *allies)))
            .collect()
    }

    #[test]
    fn test_first_round_is_full_change() {
        let mut cache = StatusCache::new();
        let changes = cache.apply(round(&[("a", 1), ("b", 2)]), 100);

        assert_eq!(changes.len(), 2);
        assert!(changes.values().all(|c| c.len() == StatusField::ALL.len()));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.rounds(), 1);
        assert_eq!(cache.last_round_ms(), Some(100));
    }

    #[test]
    fn test_identical_round_has_no_changes() {
        let mut cache = StatusCache::new();
        cache.apply(round(&[("a", 1)]), 100);
        let changes = cache.apply(round(&[("a", 1)]), 200);
        assert!(changes["a"].is_empty());
    }

    #[test]
    fn test_changed_field_reported() {
        let mut cache = StatusCache::new();
        cache.apply(round(&[("a", 1)]), 100);
        let changes = cache.apply(round(&[("a", 4)]), 200);

        let expected: ChangeSet = [StatusField::AlliesCount].into_iter().collect();
        assert_eq!(changes["a"], expected);
        assert_eq!(cache.get("a").unwrap().allies_count, 4);
    }

    #[test]
    fn test_removed_server_evicted_on_next_round() {
        let mut cache = StatusCache::new();
        cache.apply(round(&[("a", 1), ("b", 2)]), 100);
        assert!(cache.get("b").is_some());

        let changes = cache.apply(round(&[("a", 1)]), 200);
        assert!(cache.get("b").is_none());
        assert!(!changes.contains_key("b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_readded_server_is_a_first_observation() {
        let mut cache = StatusCache::new();
        cache.apply(round(&[("a", 1), ("b", 2)]), 100);
        cache.apply(round(&[("a", 1)]), 200);
        let changes = cache.apply(round(&[("a", 1), ("b", 2)]), 300);
        assert_eq!(changes["b"].len(), StatusField::ALL.len());
    }

    #[test]
    fn test_clear() {
        let mut cache = StatusCache::new();
        cache.apply(round(&[("a", 1)]), 100);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.rounds(), 0);
        assert_eq!(cache.last_round_ms(), None);
    }
}
