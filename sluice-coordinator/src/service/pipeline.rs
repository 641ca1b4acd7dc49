//! Pipeline Service
//!
//! Pipeline failure and assembly of the full pipeline view.

use sluice_core::domain::pipeline::{PipelineInfo, PipelineRecord, PipelineState};

use crate::error::{CoordinatorError, Result};
use crate::repository::pipeline::{self as pipeline_repository, PIPELINES};
use crate::spec_store::{SPEC_FILE, SPEC_REPO, SpecStore};
use crate::store::Stm;

/// Marks a pipeline as failed with `reason`
///
/// Only the pipeline's state and reason change; its jobs and counters are
/// left alone. Failing an already failed pipeline just replaces the reason.
pub async fn fail_pipeline(stm: &Stm, name: &str, reason: &str) -> Result<()> {
    stm.run(|txn| async move {
        let pipelines = PIPELINES.read_write(&txn);
        let mut pipeline = pipelines
            .get(name)
            .await?
            .ok_or_else(|| CoordinatorError::PipelineNotFound(name.to_string()))?;

        pipeline.state = PipelineState::Failure;
        pipeline.reason = reason.to_string();
        pipelines.put(name, &pipeline)?;
        Ok::<_, CoordinatorError>(())
    })
    .await?;

    tracing::warn!("Pipeline {} failed: {}", name, reason);

    Ok(())
}

/// Loads the full view of pipeline `name`
pub async fn get_pipeline_info(
    stm: &Stm,
    spec_store: &dyn SpecStore,
    name: &str,
) -> Result<PipelineInfo> {
    let record = pipeline_repository::find(stm, name)
        .await?
        .ok_or_else(|| CoordinatorError::PipelineNotFound(name.to_string()))?;

    pipeline_info_from_record(spec_store, &record).await
}

/// Reads the spec `record` points at and overlays the record's volatile fields
pub async fn pipeline_info_from_record(
    spec_store: &dyn SpecStore,
    record: &PipelineRecord,
) -> Result<PipelineInfo> {
    let commit = record
        .spec_commit
        .as_deref()
        .ok_or_else(|| CoordinatorError::MissingSpecCommit(record.name.clone()))?;

    let bytes = spec_store
        .read_pipeline_spec(SPEC_REPO, commit, SPEC_FILE)
        .await
        .map_err(CoordinatorError::SpecRead)?;

    let mut info: PipelineInfo =
        serde_json::from_slice(&bytes).map_err(CoordinatorError::SpecDecode)?;
    info.overlay(record);

    Ok(info)
}
