//! Job Repository
//!
//! Job records, keyed by job id. Jobs are inserted through
//! [`admit_job`](crate::service::job::admit_job), which also updates the
//! owning pipeline's counters.

use sluice_core::domain::job::JobRecord;

use crate::error::Result;
use crate::store::{Collection, Stm};

/// Collection of job records
pub const JOBS: Collection<JobRecord> = Collection::new("jobs");

/// Find a job record by id
pub async fn find(stm: &Stm, id: &str) -> Result<Option<JobRecord>> {
    stm.run(|txn| async move { Ok(JOBS.read_write(&txn).get(id).await?) })
        .await
}
