//! Read-only query helpers composed over a [`LogStore`].
//!
//! Mirrors the scope set the logging surface exposes: filter by level,
//! status, category, data presence, deep key presence, recency, and time
//! range. Builders are cheap value types; nothing touches the store until
//! a terminal call (`fetch`, `count`, `first`).

use crate::error::LogResult;
use crate::store::{LogStore, QueryFilter, SortOrder};
use crate::types::{LogEntry, LogLevel, OwnerRef};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Composable query over log entries.
#[derive(Clone)]
pub struct LogQuery {
    store: Arc<dyn LogStore>,
    filter: QueryFilter,
}

impl LogQuery {
    /// Query across all owners
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            filter: QueryFilter::new(),
        }
    }

    /// Query scoped to one owner's entries
    pub fn for_owner(store: Arc<dyn LogStore>, owner: OwnerRef) -> Self {
        Self {
            store,
            filter: QueryFilter::new().owner(owner),
        }
    }

    /// Entries at exactly this level
    pub fn by_level(mut self, level: LogLevel) -> Self {
        self.filter = self.filter.level(level);
        self
    }

    /// Error-level entries
    pub fn errors(self) -> Self {
        self.by_level(LogLevel::Error)
    }

    /// Entries whose metadata `status` equals the given string
    pub fn by_status(mut self, status: impl Into<String>) -> Self {
        self.filter = self.filter.status(status);
        self
    }

    /// Entries whose metadata `category` equals the given string
    pub fn by_category(mut self, category: impl Into<String>) -> Self {
        self.filter = self.filter.category(category);
        self
    }

    /// Entries carrying a non-empty `data` payload
    pub fn with_data(mut self) -> Self {
        self.filter = self.filter.with_data();
        self
    }

    /// Entries whose metadata contains every given key, at any depth.
    ///
    /// Keys match independently; see
    /// [`Metadata::has_all_keys`](crate::metadata::Metadata::has_all_keys)
    /// for the exact semantics.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.filter = self.filter.require_key(key);
        }
        self
    }

    /// The `n` most recent entries, newest first
    pub fn recent(mut self, n: usize) -> Self {
        self.filter = self.filter.order(SortOrder::NewestFirst).limit(n);
        self
    }

    /// Entries created within `[start, end]`, inclusive on both ends
    pub fn in_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.filter = self
            .filter
            .since(start.timestamp_millis())
            .until(end.timestamp_millis());
        self
    }

    /// Oldest-first ordering (default is newest first)
    pub fn oldest_first(mut self) -> Self {
        self.filter = self.filter.order(SortOrder::OldestFirst);
        self
    }

    /// Cap the number of returned entries
    pub fn limit(mut self, n: usize) -> Self {
        self.filter = self.filter.limit(n);
        self
    }

    /// Execute the query
    pub fn fetch(&self) -> LogResult<Vec<LogEntry>> {
        self.store.query(&self.filter)
    }

    /// Number of matching entries
    pub fn count(&self) -> LogResult<usize> {
        Ok(self.fetch()?.len())
    }

    /// First matching entry under the current ordering
    pub fn first(&self) -> LogResult<Option<LogEntry>> {
        Ok(self.clone().limit(1).fetch()?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::store::MemoryStore;
    use crate::types::NewEntry;
    use serde_json::json;

    fn seeded_store() -> (Arc<MemoryStore>, OwnerRef) {
        let store = Arc::new(MemoryStore::new());
        let owner = OwnerRef::new("User", 1);

        let rows = [
            json!({ "log_level": "debug", "status": "debug", "category": "test" }),
            json!({ "log_level": "info", "status": "success", "category": "test" }),
            json!({ "log_level": "error", "status": "error", "category": "test" }),
            json!({
                "log_level": "info",
                "status": "success",
                "category": "settings",
                "settings": { "notifications": { "email": true, "sms": false } }
            }),
            json!({
                "log_level": "info",
                "status": "success",
                "category": "data_test",
                "data": { "key": "value" }
            }),
        ];
        for (i, meta) in rows.iter().enumerate() {
            store
                .insert(NewEntry::new(
                    owner.clone(),
                    format!("m{i}"),
                    Metadata::from_value(meta.clone()),
                ))
                .unwrap();
        }
        (store, owner)
    }

    #[test]
    fn test_by_level_and_errors() {
        let (store, owner) = seeded_store();
        let q = LogQuery::for_owner(store.clone(), owner.clone());
        assert_eq!(q.clone().by_level(LogLevel::Info).count().unwrap(), 3);
        assert_eq!(q.errors().count().unwrap(), 1);
    }

    #[test]
    fn test_by_status_and_category() {
        let (store, owner) = seeded_store();
        let q = LogQuery::for_owner(store, owner);
        assert_eq!(q.clone().by_status("success").count().unwrap(), 3);
        assert_eq!(q.by_category("test").count().unwrap(), 3);
    }

    #[test]
    fn test_with_data() {
        let (store, owner) = seeded_store();
        let entries = LogQuery::for_owner(store, owner).with_data().fetch().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.category(), Some("data_test"));
    }

    #[test]
    fn test_with_keys_deep() {
        let (store, owner) = seeded_store();
        let q = LogQuery::for_owner(store, owner);
        assert_eq!(q.clone().with_keys(["email"]).count().unwrap(), 1);
        assert_eq!(q.clone().with_keys(["email", "sms"]).count().unwrap(), 1);
        assert_eq!(q.with_keys(["email", "missing"]).count().unwrap(), 0);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let (store, owner) = seeded_store();
        let entries = LogQuery::for_owner(store, owner).recent(3).fetch().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn test_in_range_includes_bounds() {
        let (store, owner) = seeded_store();
        let all = LogQuery::for_owner(store.clone(), owner.clone())
            .fetch()
            .unwrap();
        let start = DateTime::from_timestamp_millis(all.iter().map(|e| e.created_at).min().unwrap())
            .unwrap();
        let end = DateTime::from_timestamp_millis(all.iter().map(|e| e.created_at).max().unwrap())
            .unwrap();
        let ranged = LogQuery::for_owner(store, owner)
            .in_range(start, end)
            .fetch()
            .unwrap();
        assert_eq!(ranged.len(), all.len());
    }

    #[test]
    fn test_first_respects_ordering() {
        let (store, owner) = seeded_store();
        let newest = LogQuery::for_owner(store.clone(), owner.clone())
            .first()
            .unwrap()
            .unwrap();
        let oldest = LogQuery::for_owner(store, owner)
            .oldest_first()
            .first()
            .unwrap()
            .unwrap();
        assert!(newest.id > oldest.id);
    }
}
