//! Job Service
//!
//! Job state transitions and the pipeline counters that summarize them.

use chrono::Utc;
use sluice_core::domain::job::{JobRecord, JobState};
use sluice_core::domain::pipeline::PipelineRecord;

use crate::error::{CoordinatorError, Result};
use crate::repository::job::JOBS;
use crate::repository::pipeline::PIPELINES;
use crate::store::{ReadWriteCollection, Stm};

/// Moves `job` to `state` inside an open transaction
///
/// Decrements the owning pipeline's counter for the job's current state,
/// increments the one for `state`, records `state` as the pipeline's last
/// job state and stamps the job's `started`/`finished` times on first entry.
/// Both records are written through the caller's transaction; nothing is
/// committed here.
///
/// A job in `FAILURE` can never be moved again. On error, `job` is left as it
/// was and nothing is buffered.
pub async fn update_job_state(
    pipelines: &ReadWriteCollection<PipelineRecord>,
    jobs: &ReadWriteCollection<JobRecord>,
    job: &mut JobRecord,
    state: JobState,
    reason: &str,
) -> Result<()> {
    if job.state == JobState::Failure {
        return Err(CoordinatorError::IllegalTransition {
            job_id: job.id.clone(),
            requested: state,
        });
    }

    let mut pipeline = pipelines
        .get(&job.pipeline)
        .await?
        .ok_or_else(|| CoordinatorError::PipelineNotFound(job.pipeline.clone()))?;

    pipeline.job_counts.decrement(job.state);
    pipeline.job_counts.increment(state);
    pipeline.last_job_state = Some(state);
    pipelines.put(&job.pipeline, &pipeline)?;

    let now = Utc::now();
    if state == JobState::Starting {
        job.started.get_or_insert(now);
    } else if state.is_terminal() {
        job.finished.get_or_insert(now);
    }
    job.state = state;
    job.reason = reason.to_string();

    jobs.put(&job.id, job)?;
    Ok(())
}

/// Inserts a newly admitted job and counts it on its pipeline
///
/// The job is counted once under its initial state. A job admitted in
/// `STARTING` gets its start time stamped here.
pub async fn admit_job(stm: &Stm, job: JobRecord) -> Result<JobRecord> {
    let job = stm
        .run(|txn| {
            let mut job = job.clone();
            async move {
                let pipelines = PIPELINES.read_write(&txn);
                let jobs = JOBS.read_write(&txn);

                if jobs.get(&job.id).await?.is_some() {
                    return Err(CoordinatorError::JobExists(job.id));
                }

                let mut pipeline = pipelines
                    .get(&job.pipeline)
                    .await?
                    .ok_or_else(|| CoordinatorError::PipelineNotFound(job.pipeline.clone()))?;
                pipeline.job_counts.increment(job.state);
                pipeline.last_job_state = Some(job.state);
                pipelines.put(&job.pipeline, &pipeline)?;

                let now = Utc::now();
                if job.state == JobState::Starting {
                    job.started.get_or_insert(now);
                } else if job.state.is_terminal() {
                    job.finished.get_or_insert(now);
                }

                jobs.put(&job.id, &job)?;
                Ok(job)
            }
        })
        .await?;

    tracing::info!("Job admitted: {} for pipeline: {}", job.id, job.pipeline);

    Ok(job)
}

/// Moves the stored job `job_id` to `state` in its own transaction
///
/// The job is re-read on every attempt, so the transition always applies to
/// its latest committed state.
pub async fn transition_job(
    stm: &Stm,
    job_id: &str,
    state: JobState,
    reason: &str,
) -> Result<JobRecord> {
    let (previous, job) = stm
        .run(|txn| async move {
            let pipelines = PIPELINES.read_write(&txn);
            let jobs = JOBS.read_write(&txn);

            let mut job = jobs
                .get(job_id)
                .await?
                .ok_or_else(|| CoordinatorError::JobNotFound(job_id.to_string()))?;
            let previous = job.state;

            update_job_state(&pipelines, &jobs, &mut job, state, reason).await?;
            Ok::<_, CoordinatorError>((previous, job))
        })
        .await?;

    tracing::info!(
        "Job {} of pipeline {} moved from {} to {}",
        job.id,
        job.pipeline,
        previous,
        state
    );

    Ok(job)
}
