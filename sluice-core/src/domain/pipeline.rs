//! Pipeline domain types

use serde::{Deserialize, Serialize};

use super::counts::JobCounts;
use super::input::Input;
use super::job::JobState;

/// Pipeline lifecycle state, independent of the state of its jobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    #[default]
    Starting,
    Running,
    Restarting,
    Failure,
    Paused,
    Standby,
    Crashing,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Starting => write!(f, "STARTING"),
            PipelineState::Running => write!(f, "RUNNING"),
            PipelineState::Restarting => write!(f, "RESTARTING"),
            PipelineState::Failure => write!(f, "FAILURE"),
            PipelineState::Paused => write!(f, "PAUSED"),
            PipelineState::Standby => write!(f, "STANDBY"),
            PipelineState::Crashing => write!(f, "CRASHING"),
        }
    }
}

/// Pipeline record as persisted in the `pipelines` collection
///
/// Holds only the volatile fields of a pipeline. The full specification lives
/// in the spec store at `spec_commit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub name: String,
    pub state: PipelineState,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub job_counts: JobCounts,
    pub last_job_state: Option<JobState>,
    pub spec_commit: Option<String>,
}

impl PipelineRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Worker count request: a fixed number, or a multiple of the cluster's nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParallelismSpec {
    #[serde(default)]
    pub constant: u64,
    #[serde(default)]
    pub coefficient: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtreeSpec {
    #[serde(default)]
    pub constant: i64,
}

/// Declared resources for a pipeline's workers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Fractional cores
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: String,
    /// Ephemeral storage; left out of the resource list when empty
    #[serde(default)]
    pub disk: String,
    pub gpu: Option<GpuSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuSpec {
    /// Extended resource name, e.g. `nvidia.com/gpu`
    #[serde(rename = "type")]
    pub kind: String,
    pub number: i64,
}

/// Full pipeline information: the stored specification overlaid with the
/// volatile fields of the pipeline record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
    pub input: Option<Input>,
    pub output_branch: String,
    pub parallelism_spec: Option<ParallelismSpec>,
    pub hashtree_spec: Option<HashtreeSpec>,
    pub resource_requests: Option<ResourceSpec>,
    pub resource_limits: Option<ResourceSpec>,
    pub cache_size: String,
    pub enable_stats: bool,
    pub max_queue_size: i64,
    pub salt: String,
    pub standby: bool,
    pub datum_tries: i64,

    // Volatile fields, owned by the pipeline record
    pub state: PipelineState,
    pub reason: String,
    pub job_counts: JobCounts,
    pub last_job_state: Option<JobState>,
    pub spec_commit: Option<String>,
}

impl PipelineInfo {
    /// Name of the repository the pipeline writes its output commits to
    pub fn output_repo(&self) -> &str {
        &self.name
    }

    /// Replaces the volatile fields with the ones held by `record`
    pub fn overlay(&mut self, record: &PipelineRecord) {
        self.state = record.state;
        self.reason = record.reason.clone();
        self.job_counts = record.job_counts;
        self.last_job_state = record.last_job_state;
        self.spec_commit = record.spec_commit.clone();
    }
}

/// Request to create (or recreate) a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePipelineRequest {
    pub name: String,
    pub description: Option<String>,
    pub input: Option<Input>,
    pub output_branch: String,
    pub parallelism_spec: Option<ParallelismSpec>,
    pub hashtree_spec: Option<HashtreeSpec>,
    pub resource_requests: Option<ResourceSpec>,
    pub resource_limits: Option<ResourceSpec>,
    pub cache_size: String,
    pub enable_stats: bool,
    pub max_queue_size: i64,
    pub salt: String,
    pub standby: bool,
    pub datum_tries: i64,
}

impl From<&PipelineInfo> for CreatePipelineRequest {
    fn from(info: &PipelineInfo) -> Self {
        Self {
            name: info.name.clone(),
            description: info.description.clone(),
            input: info.input.clone(),
            output_branch: info.output_branch.clone(),
            parallelism_spec: info.parallelism_spec,
            hashtree_spec: info.hashtree_spec,
            resource_requests: info.resource_requests.clone(),
            resource_limits: info.resource_limits.clone(),
            cache_size: info.cache_size.clone(),
            enable_stats: info.enable_stats,
            max_queue_size: info.max_queue_size,
            salt: info.salt.clone(),
            standby: info.standby,
            datum_tries: info.datum_tries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_replaces_volatile_fields_only() {
        let mut info = PipelineInfo {
            name: "edges".to_string(),
            cache_size: "64M".to_string(),
            state: PipelineState::Running,
            ..Default::default()
        };

        let mut record = PipelineRecord::new("edges");
        record.state = PipelineState::Failure;
        record.reason = "image pull failed".to_string();
        record.job_counts.increment(JobState::Failure);
        record.last_job_state = Some(JobState::Failure);
        record.spec_commit = Some("abc123".to_string());

        info.overlay(&record);

        assert_eq!(info.state, PipelineState::Failure);
        assert_eq!(info.reason, "image pull failed");
        assert_eq!(info.job_counts.get(JobState::Failure), 1);
        assert_eq!(info.last_job_state, Some(JobState::Failure));
        assert_eq!(info.spec_commit.as_deref(), Some("abc123"));
        assert_eq!(info.cache_size, "64M");
    }

    #[test]
    fn test_create_request_from_info() {
        let info = PipelineInfo {
            name: "edges".to_string(),
            description: Some("edge detection".to_string()),
            parallelism_spec: Some(ParallelismSpec {
                constant: 4,
                coefficient: 0.0,
            }),
            state: PipelineState::Failure,
            reason: "crashed".to_string(),
            ..Default::default()
        };

        let req = CreatePipelineRequest::from(&info);
        assert_eq!(req.name, "edges");
        assert_eq!(req.description.as_deref(), Some("edge detection"));
        assert_eq!(req.parallelism_spec.map(|p| p.constant), Some(4));
        assert_eq!(info.output_repo(), "edges");
    }

    #[test]
    fn test_record_defaults() {
        let record = PipelineRecord::new("edges");
        assert_eq!(record.state, PipelineState::Starting);
        assert_eq!(record.job_counts.total(), 0);
        assert!(record.last_job_state.is_none());
    }
}
