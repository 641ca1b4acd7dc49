//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a job
///
/// `Success`, `Failure` and `Killed` are terminal for scheduling purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Starting,
    Running,
    Merging,
    Success,
    Failure,
    Killed,
}

impl JobState {
    /// Every job state, in declaration order
    pub const ALL: [JobState; 6] = [
        JobState::Starting,
        JobState::Running,
        JobState::Merging,
        JobState::Success,
        JobState::Failure,
        JobState::Killed,
    ];

    /// Returns `true` if no further work is dispatched for a job in this state
    pub fn is_terminal(self) -> bool {
        match self {
            JobState::Success | JobState::Failure | JobState::Killed => true,
            JobState::Starting | JobState::Running | JobState::Merging => false,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Starting => write!(f, "STARTING"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Merging => write!(f, "MERGING"),
            JobState::Success => write!(f, "SUCCESS"),
            JobState::Failure => write!(f, "FAILURE"),
            JobState::Killed => write!(f, "KILLED"),
        }
    }
}

/// Job record as persisted in the `jobs` collection
///
/// Only `state`, `reason`, `started` and `finished` are mutated by the
/// coordinator; everything else is fixed at admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    /// Name of the owning pipeline
    pub pipeline: String,
    pub output_commit: Option<String>,
    pub state: JobState,
    #[serde(default)]
    pub reason: String,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Creates a freshly admitted job for `pipeline` with a random id
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().simple().to_string(), pipeline)
    }

    /// Creates a freshly admitted job with a caller-chosen id
    pub fn with_id(id: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pipeline: pipeline.into(),
            output_commit: None,
            state: JobState::Starting,
            reason: String::new(),
            started: None,
            finished: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Success.is_terminal());
        assert!(JobState::Failure.is_terminal());
        assert!(JobState::Killed.is_terminal());
        assert!(!JobState::Starting.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Merging.is_terminal());
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let json = serde_json::to_string(&JobState::Merging).unwrap();
        assert_eq!(json, "\"MERGING\"");
        assert_eq!(JobState::Merging.to_string(), "MERGING");
    }

    #[test]
    fn test_new_job_is_starting() {
        let job = JobRecord::new("edges");
        assert_eq!(job.pipeline, "edges");
        assert_eq!(job.state, JobState::Starting);
        assert_eq!(job.id.len(), 32);
        assert!(job.started.is_none());
        assert!(job.finished.is_none());
    }
}
