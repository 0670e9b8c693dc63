//! Storage contract for log entries.
//!
//! The core never talks to a database directly; everything goes through the
//! [`LogStore`] trait. Two implementations ship with the crate:
//! - [`MemoryStore`] — lock-guarded vector, for tests and demos
//! - [`RedbStore`] — redb-backed persistent store

use crate::error::LogResult;
use crate::types::{LogEntry, LogLevel, NewEntry, OwnerRef};

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Sort order for query results. Ties on `created_at` break by `id`
/// (higher id = more recent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Declarative filter for [`LogStore::query`].
///
/// All populated criteria must hold; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Restrict to one owner
    pub owner: Option<OwnerRef>,
    /// Restrict to one level (matched against metadata `log_level`)
    pub level: Option<LogLevel>,
    /// Restrict to one `status` string
    pub status: Option<String>,
    /// Restrict to one `category` string
    pub category: Option<String>,
    /// Inclusive lower bound on `created_at` (unix millis)
    pub since: Option<i64>,
    /// Inclusive upper bound on `created_at` (unix millis)
    pub until: Option<i64>,
    /// Keys that must each occur somewhere in the metadata tree
    pub required_keys: Vec<String>,
    /// Require a non-empty `data` payload
    pub with_data: bool,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn since(mut self, millis: i64) -> Self {
        self.since = Some(millis);
        self
    }

    pub fn until(mut self, millis: i64) -> Self {
        self.until = Some(millis);
        self
    }

    pub fn require_key(mut self, key: impl Into<String>) -> Self {
        self.required_keys.push(key.into());
        self
    }

    pub fn with_data(mut self) -> Self {
        self.with_data = true;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `entry` satisfies every populated criterion
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(owner) = &self.owner {
            if &entry.owner != owner {
                return false;
            }
        }
        if let Some(level) = self.level {
            if entry.level() != level {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if entry.metadata.status() != Some(status.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if entry.metadata.category() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.created_at > until {
                return false;
            }
        }
        if self.with_data && !entry.metadata.has_data() {
            return false;
        }
        self.required_keys.iter().all(|k| entry.metadata.has_key(k))
    }
}

/// Sort entries in place according to `order`, breaking `created_at` ties
/// by `id`.
pub(crate) fn sort_entries(entries: &mut [LogEntry], order: SortOrder) {
    match order {
        SortOrder::NewestFirst => {
            entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
        }
        SortOrder::OldestFirst => {
            entries.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)))
        }
    }
}

/// Persistence contract consumed by the logging core.
///
/// Implementations assign entry ids and are safe for concurrent use.
pub trait LogStore: Send + Sync {
    /// Persist one entry, returning it with its assigned id
    fn insert(&self, entry: NewEntry) -> LogResult<LogEntry>;

    /// Persist a batch of entries.
    ///
    /// Atomic where the backing store supports transactions ([`RedbStore`]
    /// uses a single write transaction; [`MemoryStore`] holds its lock for
    /// the whole batch). Either all entries become visible or none do.
    fn insert_batch(&self, entries: Vec<NewEntry>) -> LogResult<Vec<LogEntry>>;

    /// Fetch entries matching `filter`, sorted and truncated per the filter
    fn query(&self, filter: &QueryFilter) -> LogResult<Vec<LogEntry>>;

    /// Delete this owner's entries satisfying `predicate`, returning the
    /// number removed. No matches is success with 0.
    fn delete_where(
        &self,
        owner: &OwnerRef,
        predicate: &dyn Fn(&LogEntry) -> bool,
    ) -> LogResult<u64>;
}
