//! Transactional Store
//!
//! The shared, versioned key-value store every coordinator process writes to.
//! A [`KvBackend`] only knows how to read one entry and how to atomically
//! commit a batch of writes guarded by the revisions of the entries that were
//! read. Everything else (read caching, write buffering, retrying on conflict)
//! lives in [`Stm`], so backends stay small.

pub mod collection;
pub mod memory;
pub mod postgres;
pub mod stm;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use collection::{Collection, ReadWriteCollection};
pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use stm::{RetryPolicy, Stm, Txn};

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal mutex was poisoned by a panicked thread
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Every attempt of a transaction lost to a concurrent writer
    #[error("transaction aborted after {attempts} conflicting attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Address of one entry: a collection name and a key within it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub collection: String,
    pub key: String,
}

impl EntryKey {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

/// A stored value together with the revision it was last written at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub value: Value,
    pub revision: i64,
}

/// Revision observed for one key during a transaction attempt
///
/// `None` means the key was absent when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGuard {
    pub key: EntryKey,
    pub revision: Option<i64>,
}

/// Outcome of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A guarded key changed since it was read; nothing was written
    Conflict,
}

/// Storage contract for the transactional store
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn KvBackend>`.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Reads the current value and revision of `key`
    ///
    /// Returns `Ok(None)` when the key does not exist.
    async fn read(&self, key: &EntryKey) -> Result<Option<Versioned>>;

    /// Atomically applies `writes` if every guard still holds
    ///
    /// Either all writes become visible or none do. A write bumps the
    /// entry's revision.
    async fn commit(&self, guards: &[ReadGuard], writes: &[(EntryKey, Value)])
    -> Result<CommitOutcome>;
}
