//! Age- and count-bounded retention for an owner's log entries.

use crate::error::LogResult;
use crate::store::{LogStore, QueryFilter, SortOrder};
use crate::types::{LogEntry, OwnerRef};
use std::collections::HashSet;
use std::sync::Arc;

/// Retention policy combining an age threshold with a recent-count floor.
///
/// `keep_recent` always wins over `older_than`: the most recent entries are
/// never deleted, no matter how old they are.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Entries strictly older than this are deletion candidates
    pub older_than: chrono::Duration,
    /// This many most-recent entries are always preserved
    pub keep_recent: usize,
}

impl RetentionPolicy {
    pub fn new(older_than: chrono::Duration, keep_recent: usize) -> Self {
        Self {
            older_than,
            keep_recent,
        }
    }
}

/// Applies [`RetentionPolicy`] deletions through a [`LogStore`].
#[derive(Clone)]
pub struct RetentionManager {
    store: Arc<dyn LogStore>,
}

impl RetentionManager {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Delete `owner`'s entries that are both older than the policy's age
    /// threshold and outside its recent-count floor. Recency ranks by
    /// `created_at`, ties broken by higher `id`. Returns the number of
    /// entries deleted; zero matches is success.
    pub fn cleanup(&self, owner: &OwnerRef, policy: &RetentionPolicy) -> LogResult<u64> {
        let cutoff = chrono::Utc::now().timestamp_millis() - policy.older_than.num_milliseconds();

        let protected: HashSet<u64> = if policy.keep_recent > 0 {
            self.store
                .query(
                    &QueryFilter::new()
                        .owner(owner.clone())
                        .order(SortOrder::NewestFirst)
                        .limit(policy.keep_recent),
                )?
                .into_iter()
                .map(|e| e.id)
                .collect()
        } else {
            HashSet::new()
        };

        let deleted = self.store.delete_where(owner, &|entry: &LogEntry| {
            entry.created_at < cutoff && !protected.contains(&entry.id)
        })?;

        tracing::debug!(owner = %owner, deleted, "retention cleanup");
        Ok(deleted)
    }
}
