//! In-memory log store for tests and demos.

use super::{sort_entries, LogStore, QueryFilter};
use crate::error::LogResult;
use crate::types::{LogEntry, NewEntry, OwnerRef};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Vector-backed [`LogStore`].
///
/// Batch inserts happen under one lock acquisition, so the all-or-nothing
/// guarantee holds here just as it does for the transactional store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LogEntry>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Total number of stored entries, across all owners
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn assign_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl LogStore for MemoryStore {
    fn insert(&self, entry: NewEntry) -> LogResult<LogEntry> {
        let entry = entry.into_entry(self.assign_id());
        self.entries.lock().push(entry.clone());
        Ok(entry)
    }

    fn insert_batch(&self, entries: Vec<NewEntry>) -> LogResult<Vec<LogEntry>> {
        let mut guard = self.entries.lock();
        let mut inserted = Vec::with_capacity(entries.len());
        for draft in entries {
            let entry = draft.into_entry(self.assign_id());
            guard.push(entry.clone());
            inserted.push(entry);
        }
        Ok(inserted)
    }

    fn query(&self, filter: &QueryFilter) -> LogResult<Vec<LogEntry>> {
        let mut matched: Vec<LogEntry> = self
            .entries
            .lock()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
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
        let mut guard = self.entries.lock();
        let before = guard.len();
        guard.retain(|e| &e.owner != owner || !predicate(e));
        Ok((before - guard.len()) as u64)
    }
}
