//! Typed collections
//!
//! A [`Collection`] names a group of entries holding one record type. Bound to
//! a transaction with [`Collection::read_write`], it reads and writes records
//! as JSON through that transaction.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{EntryKey, Result, Txn};

/// Named collection of `T` records
pub struct Collection<T> {
    name: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Collection<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self, key: &str) -> EntryKey {
        EntryKey::new(self.name, key)
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    /// Binds the collection to one transaction attempt
    pub fn read_write(&self, txn: &Txn) -> ReadWriteCollection<T> {
        ReadWriteCollection {
            collection: *self,
            txn: txn.clone(),
        }
    }
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Collection<T> {}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

/// A collection bound to a transaction attempt
pub struct ReadWriteCollection<T> {
    collection: Collection<T>,
    txn: Txn,
}

impl<T: Serialize + DeserializeOwned> ReadWriteCollection<T> {
    /// Reads the record stored under `key`, if any
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        match self.txn.get(&self.collection.key(key)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Buffers a write of `record` under `key`
    pub fn put(&self, key: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.txn.put(self.collection.key(key), value)
    }
}
