//! Per-state job counter table
//!
//! A pipeline record keeps one counter per [`JobState`]. The table is a fixed
//! array indexed by the state, so every state always has a slot and a count can
//! never go below zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::job::JobState;

/// Number of jobs of a pipeline currently in each state
///
/// Persisted as a map from state name to count; zero entries are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<JobState, u32>", into = "BTreeMap<JobState, u32>")]
pub struct JobCounts([u32; JobState::ALL.len()]);

impl JobCounts {
    pub fn get(&self, state: JobState) -> u32 {
        self.0[state.index()]
    }

    pub fn increment(&mut self, state: JobState) {
        let slot = &mut self.0[state.index()];
        *slot = slot.saturating_add(1);
    }

    /// Decrements the counter for `state`, leaving it at zero if it already is
    pub fn decrement(&mut self, state: JobState) {
        let slot = &mut self.0[state.index()];
        *slot = slot.saturating_sub(1);
    }

    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&n| u64::from(n)).sum()
    }

    /// Iterates over `(state, count)` pairs in state order, zeros included
    pub fn iter(&self) -> impl Iterator<Item = (JobState, u32)> + '_ {
        JobState::ALL.iter().map(move |&s| (s, self.get(s)))
    }
}

impl From<BTreeMap<JobState, u32>> for JobCounts {
    fn from(map: BTreeMap<JobState, u32>) -> Self {
        let mut counts = JobCounts::default();
        for (state, n) in map {
            counts.0[state.index()] = n;
        }
        counts
    }
}

impl From<JobCounts> for BTreeMap<JobState, u32> {
    fn from(counts: JobCounts) -> Self {
        counts.iter().filter(|&(_, n)| n > 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut counts = JobCounts::default();
        counts.decrement(JobState::Running);
        assert_eq!(counts.get(JobState::Running), 0);

        counts.increment(JobState::Running);
        counts.decrement(JobState::Running);
        counts.decrement(JobState::Running);
        assert_eq!(counts.get(JobState::Running), 0);
    }

    #[test]
    fn test_total() {
        let mut counts = JobCounts::default();
        counts.increment(JobState::Starting);
        counts.increment(JobState::Starting);
        counts.increment(JobState::Success);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_serialized_form_omits_zero_counts() {
        let mut counts = JobCounts::default();
        counts.increment(JobState::Running);
        counts.increment(JobState::Running);
        counts.increment(JobState::Killed);

        let value = serde_json::to_value(counts).unwrap();
        assert_eq!(value, serde_json::json!({ "RUNNING": 2, "KILLED": 1 }));

        let parsed: JobCounts = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, counts);
    }
}
