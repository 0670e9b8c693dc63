//! Persistent log store backed by redb.
//!
//! Rows are serde_json-encoded [`LogEntry`] values keyed by their assigned
//! id; a small meta table carries the id counter so ids stay monotone
//! across restarts.

use super::{sort_entries, LogStore, QueryFilter};
use crate::error::{LogError, LogResult};
use crate::types::{LogEntry, NewEntry, OwnerRef};
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Log rows (key: entry id, value: serialized LogEntry)
const LOGS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("logs");

/// Store bookkeeping (key: counter name, value: next value)
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

/// redb-backed [`LogStore`] with ACID batch inserts.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<RwLock<Database>>,
}

impl RedbStore {
    /// Open (or create) a store at the given path.
    ///
    /// Creates the parent directory and initializes both tables so later
    /// reads never hit a missing table.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LOGS_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }

    fn decode(bytes: &[u8]) -> LogResult<LogEntry> {
        serde_json::from_slice(bytes).map_err(|e| LogError::Serialization(e.to_string()))
    }

    fn encode(entry: &LogEntry) -> LogResult<Vec<u8>> {
        serde_json::to_vec(entry).map_err(|e| LogError::Serialization(e.to_string()))
    }
}

impl LogStore for RedbStore {
    fn insert(&self, entry: NewEntry) -> LogResult<LogEntry> {
        let mut inserted = self.insert_batch(vec![entry])?;
        inserted
            .pop()
            .ok_or_else(|| LogError::Storage("batch insert returned no row".to_string()))
    }

    fn insert_batch(&self, entries: Vec<NewEntry>) -> LogResult<Vec<LogEntry>> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        let mut inserted = Vec::with_capacity(entries.len());
        {
            let mut meta = write_txn.open_table(META_TABLE)?;
            let mut next_id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);

            let mut logs = write_txn.open_table(LOGS_TABLE)?;
            for draft in entries {
                let entry = draft.into_entry(next_id);
                next_id += 1;
                let row = Self::encode(&entry)?;
                logs.insert(entry.id, row.as_slice())?;
                inserted.push(entry);
            }

            meta.insert(NEXT_ID_KEY, next_id)?;
        }
        write_txn.commit()?;
        Ok(inserted)
    }

    fn query(&self, filter: &QueryFilter) -> LogResult<Vec<LogEntry>> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(LOGS_TABLE)?;

        let mut matched = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            let entry = Self::decode(value.value())?;
            if filter.matches(&entry) {
                matched.push(entry);
            }
        }

        sort_entries(&mut matched, filter.order);
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn delete_where(
        &self,
        owner: &OwnerRef,
        predicate: &dyn Fn(&LogEntry) -> bool,
    ) -> LogResult<u64> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        let deleted;
        {
            let mut table = write_txn.open_table(LOGS_TABLE)?;

            let mut doomed = Vec::new();
            for row in table.iter()? {
                let (key, value) = row?;
                let entry = Self::decode(value.value())?;
                if &entry.owner == owner && predicate(&entry) {
                    doomed.push(key.value());
                }
            }

            for id in &doomed {
                table.remove(*id)?;
            }
            deleted = doomed.len() as u64;
        }
        write_txn.commit()?;
        Ok(deleted)
    }
}
