//! Pipeline Repository
//!
//! Pipeline records, keyed by pipeline name.

use sluice_core::domain::pipeline::PipelineRecord;

use crate::error::{CoordinatorError, Result};
use crate::store::{Collection, Stm};

/// Collection of pipeline records
pub const PIPELINES: Collection<PipelineRecord> = Collection::new("pipelines");

/// Insert a new pipeline record
pub async fn create(stm: &Stm, record: PipelineRecord) -> Result<PipelineRecord> {
    stm.run(|txn| {
        let record = record.clone();
        async move {
            let pipelines = PIPELINES.read_write(&txn);
            if pipelines.get(&record.name).await?.is_some() {
                return Err(CoordinatorError::PipelineExists(record.name));
            }
            pipelines.put(&record.name, &record)?;
            Ok(record)
        }
    })
    .await
}

/// Find a pipeline record by name
pub async fn find(stm: &Stm, name: &str) -> Result<Option<PipelineRecord>> {
    stm.run(|txn| async move { Ok(PIPELINES.read_write(&txn).get(name).await?) })
        .await
}
