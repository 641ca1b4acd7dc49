//! In-process backend
//!
//! Keeps every entry in one mutex-guarded map. Useful for tests and for
//! embedding the coordinator in a single process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{CommitOutcome, EntryKey, KvBackend, ReadGuard, Result, StoreError, Versioned};

/// In-memory [`KvBackend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<EntryKey, Versioned>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<EntryKey, Versioned>>> {
        self.entries.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Current value and revision of `key`, outside of any transaction
    pub fn entry(&self, key: &EntryKey) -> Result<Option<Versioned>> {
        Ok(self.lock()?.get(key).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn read(&self, key: &EntryKey) -> Result<Option<Versioned>> {
        // Give concurrent transactions a chance to interleave with this one
        tokio::task::yield_now().await;
        self.entry(key)
    }

    async fn commit(
        &self,
        guards: &[ReadGuard],
        writes: &[(EntryKey, Value)],
    ) -> Result<CommitOutcome> {
        let mut entries = self.lock()?;

        let stale = guards
            .iter()
            .any(|guard| entries.get(&guard.key).map(|v| v.revision) != guard.revision);
        if stale {
            return Ok(CommitOutcome::Conflict);
        }

        for (key, value) in writes {
            let revision = entries.get(key).map_or(1, |v| v.revision + 1);
            entries.insert(
                key.clone(),
                Versioned {
                    value: value.clone(),
                    revision,
                },
            );
        }

        Ok(CommitOutcome::Committed)
    }
}
