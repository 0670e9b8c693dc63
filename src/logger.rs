//! The logging capability attached to domain entities.
//!
//! A [`Logger`] binds a store, the process-wide [`ChainCache`], and one
//! owner's identity tuple. Entities acquire it by composition (see the
//! [`Loggable`] trait), not inheritance: anything with a stable (type, id)
//! pair can emit entries.

use crate::chain::ChainCache;
use crate::error::LogResult;
use crate::metadata::{
    Metadata, FIELD_CATEGORY, FIELD_DATA, FIELD_LOG_LEVEL, FIELD_STATUS, FIELD_VISIBLE_TO,
};
use crate::query::LogQuery;
use crate::retention::{RetentionManager, RetentionPolicy};
use crate::store::LogStore;
use crate::types::{LogEntry, LogLevel, NewEntry, OwnerRef};
use serde_json::{json, Value};
use std::sync::Arc;

/// Per-owner defaults applied when a call leaves a field unset.
#[derive(Debug, Clone, Default)]
pub struct LoggerDefaults {
    /// Level used when the call does not name one
    pub level: LogLevel,
    /// Audience tag used when the call does not name one
    pub visible_to: Option<String>,
}

impl LoggerDefaults {
    pub fn new(level: LogLevel, visible_to: Option<String>) -> Self {
        Self { level, visible_to }
    }
}

/// Per-call options for [`Logger::log`] and friends.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    level: Option<LogLevel>,
    visible_to: Option<String>,
    status: Option<String>,
    category: Option<String>,
    data: Option<Value>,
    chain: Option<String>,
    extra: serde_json::Map<String, Value>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn visible_to(mut self, audience: impl Into<String>) -> Self {
        self.visible_to = Some(audience.into());
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

    /// Arbitrary nested caller payload, stored under `data`
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Explicit correlation chain. Non-empty values re-point the owner's
    /// cached chain; empty strings are ignored (cache/mint fallback).
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    /// Additional top-level metadata field outside the conventional set
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    fn explicit_chain(&self) -> Option<&str> {
        self.chain.as_deref().filter(|c| !c.is_empty())
    }

    /// Assemble the metadata tree, injecting the resolved chain. Extra
    /// fields go in first so conventional fields cannot be clobbered.
    fn into_metadata(self, defaults: &LoggerDefaults, chain: &str) -> Metadata {
        let mut meta = Metadata::from_map(self.extra);
        let level = self.level.unwrap_or(defaults.level);
        meta.insert(FIELD_LOG_LEVEL, Value::String(level.as_str().to_string()));
        if let Some(audience) = self.visible_to.or_else(|| defaults.visible_to.clone()) {
            meta.insert(FIELD_VISIBLE_TO, Value::String(audience));
        }
        if let Some(status) = self.status {
            meta.insert(FIELD_STATUS, Value::String(status));
        }
        if let Some(category) = self.category {
            meta.insert(FIELD_CATEGORY, Value::String(category));
        }
        if let Some(data) = self.data {
            meta.insert(FIELD_DATA, data);
        }
        meta.set_chain(chain);
        meta
    }
}

/// One message in a [`Logger::log_batch`] call.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub message: String,
    pub options: LogOptions,
}

impl BatchItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            options: LogOptions::new(),
        }
    }

    pub fn with_options(message: impl Into<String>, options: LogOptions) -> Self {
        Self {
            message: message.into(),
            options,
        }
    }
}

/// Entities that can acquire the logging capability.
///
/// Implement `owner_ref` to return the entity's stable identity tuple;
/// `logger` then binds a [`Logger`] to it.
pub trait Loggable {
    fn owner_ref(&self) -> OwnerRef;

    fn logger(&self, store: Arc<dyn LogStore>, chains: Arc<ChainCache>) -> Logger {
        Logger::new(store, chains, self.owner_ref())
    }
}

/// Correlation-aware logging surface bound to one owner.
#[derive(Clone)]
pub struct Logger {
    store: Arc<dyn LogStore>,
    chains: Arc<ChainCache>,
    owner: OwnerRef,
    defaults: LoggerDefaults,
}

impl Logger {
    pub fn new(store: Arc<dyn LogStore>, chains: Arc<ChainCache>, owner: OwnerRef) -> Self {
        Self {
            store,
            chains,
            owner,
            defaults: LoggerDefaults::default(),
        }
    }

    /// Replace the per-owner defaults (level, audience tag)
    pub fn with_defaults(mut self, defaults: LoggerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// The owner's currently cached chain, if any
    pub fn current_chain(&self) -> Option<String> {
        self.chains.peek(&self.owner)
    }

    /// Drop the cached chain so the next implicit log starts a fresh one
    pub fn end_chain(&self) {
        self.chains.forget(&self.owner);
    }

    /// Emit one entry.
    ///
    /// The chain resolves through the cache: an explicit non-empty chain in
    /// `options` wins and is cached; otherwise the cached chain is reused,
    /// or a fresh one is minted on first use. Store failures surface to the
    /// caller and are never retried.
    pub fn log(&self, message: impl Into<String>, options: LogOptions) -> LogResult<LogEntry> {
        let chain = self.chains.resolve(&self.owner, options.explicit_chain());
        let metadata = options.into_metadata(&self.defaults, &chain);
        self.store
            .insert(NewEntry::new(self.owner.clone(), message, metadata))
    }

    /// Administrative path: emit an entry with an explicit `created_at`
    /// (unix millis). Only for simulating historical data; normal traffic
    /// goes through [`Logger::log`].
    pub fn log_backdated(
        &self,
        message: impl Into<String>,
        options: LogOptions,
        created_at: i64,
    ) -> LogResult<LogEntry> {
        let chain = self.chains.resolve(&self.owner, options.explicit_chain());
        let metadata = options.into_metadata(&self.defaults, &chain);
        self.store.insert(NewEntry::backdated(
            self.owner.clone(),
            message,
            metadata,
            created_at,
        ))
    }

    /// Emit a batch of entries in one store call.
    ///
    /// The chain resolves once from the first item (its explicit chain if
    /// given, else the cached/minted one). An explicit chain on a later
    /// item becomes the active chain for that item and the rest of the
    /// batch. When the batch completes, the cache holds the last chain
    /// used, so work continuing afterwards stays correlated with the tail.
    pub fn log_batch(&self, items: Vec<BatchItem>) -> LogResult<Vec<LogEntry>> {
        let Some(first) = items.first() else {
            return Ok(Vec::new());
        };

        let mut active = self
            .chains
            .resolve(&self.owner, first.options.explicit_chain());

        let mut drafts = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                if let Some(chain) = item.options.explicit_chain() {
                    active = chain.to_string();
                }
            }
            let metadata = item.options.into_metadata(&self.defaults, &active);
            drafts.push(NewEntry::new(self.owner.clone(), item.message, metadata));
        }

        // Leave the cache holding the batch's final chain
        self.chains.resolve(&self.owner, Some(&active));

        self.store.insert_batch(drafts)
    }

    /// Run a unit of work with start/end/failure entries on one chain.
    ///
    /// Emits "`label` started", invokes `f` with a handle whose `log` calls
    /// reuse the block's chain, then emits "`label` completed" on success
    /// or a failure diagnostic on error. `f`'s result is propagated
    /// untouched either way; if persisting one of the observational entries
    /// fails, that failure is reported via `tracing::warn!` and does not
    /// affect the outcome.
    pub fn log_block<T, E, F>(&self, label: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&BlockHandle<'_>) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let chain = self.chains.resolve(&self.owner, None);

        self.emit_observational(
            format!("{label} started"),
            LogOptions::new().status("started").chain(chain.clone()),
        );

        let handle = BlockHandle {
            logger: self,
            chain: chain.clone(),
        };

        match f(&handle) {
            Ok(value) => {
                self.emit_observational(
                    format!("{label} completed"),
                    LogOptions::new().status("completed").chain(chain),
                );
                Ok(value)
            }
            Err(err) => {
                self.emit_observational(
                    format!("{label} failed"),
                    LogOptions::new()
                        .level(LogLevel::Error)
                        .status("failed")
                        .data(json!({ "error": err.to_string() }))
                        .chain(chain),
                );
                Err(err)
            }
        }
    }

    fn emit_observational(&self, message: String, options: LogOptions) {
        if let Err(err) = self.log(message, options) {
            tracing::warn!(owner = %self.owner, error = %err, "failed to persist block entry");
        }
    }

    /// Apply a retention policy to this owner's entries
    pub fn cleanup(&self, policy: &RetentionPolicy) -> LogResult<u64> {
        RetentionManager::new(self.store.clone()).cleanup(&self.owner, policy)
    }

    /// Query builder scoped to this owner's entries
    pub fn logs(&self) -> LogQuery {
        LogQuery::for_owner(self.store.clone(), self.owner.clone())
    }
}

/// Handle passed to [`Logger::log_block`] closures; every `log` call goes
/// out on the block's chain. Scoped to one unit of work — do not share it
/// across concurrent callers.
pub struct BlockHandle<'a> {
    logger: &'a Logger,
    chain: String,
}

impl BlockHandle<'_> {
    /// The chain all of this block's entries share
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Emit an entry on the block's chain
    pub fn log(&self, message: impl Into<String>, options: LogOptions) -> LogResult<LogEntry> {
        self.logger.log(message, options.chain(self.chain.clone()))
    }
}
