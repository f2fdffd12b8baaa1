//! Local persisted state for held orders
//!
//! # Keys
//!
//! | Key | Value | Purpose |
//! |-----|-------|---------|
//! | `kasir:held_orders` | `Vec<HeldOrder>` | Last reconciled held-order list |
//! | `kasir:recalled_order` | `RecalledSnapshot` | Order currently recalled into the draft |
//!
//! Values are JSON. The held list is overwritten wholesale on every
//! reconciliation; it is never patched in place.

use dashmap::DashMap;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{HeldOrder, RecalledSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Single key-value table: key = namespaced key, value = JSON bytes
const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

const HELD_ORDERS_KEY: &str = "kasir:held_orders";
const RECALLED_ORDER_KEY: &str = "kasir:recalled_order";

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-oriented key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    fn remove(&self, key: &str) -> CacheResult<()>;
}

/// Process-local store; contents are lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a redb file
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database (for tests)
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::init(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        )
    }

    fn init(db: Database) -> CacheResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// Typed view over a [`KeyValueStore`] for held-order state
#[derive(Clone)]
pub struct HeldOrderCache {
    store: Arc<dyn KeyValueStore>,
}

impl HeldOrderCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Last reconciled held list; empty when nothing was cached
    pub fn load_held(&self) -> CacheResult<Vec<HeldOrder>> {
        Ok(self.read(HELD_ORDERS_KEY)?.unwrap_or_default())
    }

    /// Replace the cached held list
    pub fn save_held(&self, orders: &[HeldOrder]) -> CacheResult<()> {
        self.write(HELD_ORDERS_KEY, orders)
    }

    pub fn load_recalled(&self) -> CacheResult<Option<RecalledSnapshot>> {
        self.read(RECALLED_ORDER_KEY)
    }

    pub fn save_recalled(&self, snapshot: &RecalledSnapshot) -> CacheResult<()> {
        self.write(RECALLED_ORDER_KEY, snapshot)
    }

    pub fn clear_recalled(&self) -> CacheResult<()> {
        self.store.remove(RECALLED_ORDER_KEY)
    }

    /// Drop all held-order state
    pub fn clear(&self) -> CacheResult<()> {
        self.store.remove(HELD_ORDERS_KEY)?;
        self.store.remove(RECALLED_ORDER_KEY)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)
    }
}
