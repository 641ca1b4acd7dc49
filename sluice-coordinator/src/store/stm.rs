//! Optimistic-concurrency transactions
//!
//! [`Stm::run`] executes a closure against a fresh [`Txn`] and commits the
//! writes it buffered. If a concurrent writer changed any entry the closure
//! read, nothing is written and the whole closure runs again with fresh
//! reads. The closure must therefore only talk to the store through the `Txn`
//! it is given.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{CommitOutcome, EntryKey, KvBackend, ReadGuard, Result, StoreError, Versioned};

/// How often and how patiently a conflicting transaction is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following attempt number `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 16,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(500),
        }
    }
}

/// Runs closures as retried, atomically committed transactions
#[derive(Clone)]
pub struct Stm {
    backend: Arc<dyn KvBackend>,
    policy: RetryPolicy,
}

impl Stm {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs `body` until its writes commit without conflict
    ///
    /// An `Err` from `body` aborts the transaction: its buffered writes are
    /// dropped and the error is returned as is, without retrying.
    pub async fn run<T, E, F, Fut>(&self, mut body: F) -> std::result::Result<T, E>
    where
        F: FnMut(Txn) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<StoreError>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let txn = Txn::new(Arc::clone(&self.backend));
            let value = body(txn.clone()).await?;

            match txn.commit().await? {
                CommitOutcome::Committed => {
                    if attempt > 1 {
                        debug!("Transaction committed after {} attempt(s)", attempt);
                    }
                    return Ok(value);
                }
                CommitOutcome::Conflict => {
                    if attempt >= self.policy.max_attempts {
                        warn!("Transaction still conflicting after {} attempts", attempt);
                        return Err(StoreError::RetriesExhausted { attempts: attempt }.into());
                    }

                    let delay = self.policy.backoff(attempt);
                    debug!(
                        "Transaction conflict (attempt {}/{}), retrying in {:?}",
                        attempt, self.policy.max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Handle to one transaction attempt
///
/// Cheap to clone; all clones share the same read set and write buffer.
/// Reads are cached so a key read twice yields the same value, and buffered
/// writes are visible to later reads of the same attempt.
#[derive(Clone)]
pub struct Txn {
    backend: Arc<dyn KvBackend>,
    state: Arc<Mutex<TxnState>>,
}

#[derive(Default)]
struct TxnState {
    reads: BTreeMap<EntryKey, Option<Versioned>>,
    writes: BTreeMap<EntryKey, Value>,
}

impl Txn {
    fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(TxnState::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TxnState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Reads `key` as of this attempt
    pub async fn get(&self, key: &EntryKey) -> Result<Option<Value>> {
        {
            let state = self.lock()?;
            if let Some(value) = state.writes.get(key) {
                return Ok(Some(value.clone()));
            }
            if let Some(read) = state.reads.get(key) {
                return Ok(read.as_ref().map(|v| v.value.clone()));
            }
        }

        let fetched = self.backend.read(key).await?;

        let mut state = self.lock()?;
        // A clone of this handle may have fetched the key meanwhile; keep the
        // first observation so the guard matches what callers saw
        let read = state.reads.entry(key.clone()).or_insert(fetched);
        Ok(read.as_ref().map(|v| v.value.clone()))
    }

    /// Buffers a write of `value` to `key`
    pub fn put(&self, key: EntryKey, value: Value) -> Result<()> {
        self.lock()?.writes.insert(key, value);
        Ok(())
    }

    async fn commit(&self) -> Result<CommitOutcome> {
        let (guards, writes) = {
            let state = self.lock()?;
            let guards: Vec<ReadGuard> = state
                .reads
                .iter()
                .map(|(key, read)| ReadGuard {
                    key: key.clone(),
                    revision: read.as_ref().map(|v| v.revision),
                })
                .collect();
            let writes: Vec<(EntryKey, Value)> = state
                .writes
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            (guards, writes)
        };

        self.backend.commit(&guards, &writes).await
    }
}
