//! chainlog — correlation-aware structured event logging for domain entities
//!
//! Any entity with a stable (type, id) identity can acquire a logging
//! capability and emit entries carrying free-form nested metadata. Entries
//! emitted in succession by one entity are grouped into a "chain"
//! (correlation id) automatically unless the caller supplies one.
//!
//! ## Core pieces
//!
//! - **Chain caching**: consecutive implicit log calls share a chain; an
//!   explicit chain re-points the cache immediately
//! - **Batch emission**: one atomic insert, chain resolved once per batch
//! - **Block logging**: start/end/failure entries around a unit of work,
//!   never swallowing the work's own error
//! - **Deep-key querying**: match entries by keys anywhere in the metadata
//!   tree, regardless of nesting depth
//! - **Retention**: age-bounded cleanup with a recent-count floor
//!
//! ## Quick Start
//!
//! ```ignore
//! use chainlog::{ChainCache, Loggable, LogOptions, Logger, OwnerRef, RedbStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct User { id: u64 }
//!
//! impl Loggable for User {
//!     fn owner_ref(&self) -> OwnerRef {
//!         OwnerRef::new("User", self.id)
//!     }
//! }
//!
//! fn main() -> Result<(), chainlog::LogError> {
//!     let store = Arc::new(RedbStore::open("~/.myapp/logs.redb")?);
//!     let chains = Arc::new(ChainCache::new());
//!
//!     let user = User { id: 42 };
//!     let logger = user.logger(store, chains);
//!
//!     logger.log(
//!         "User logged in",
//!         LogOptions::new()
//!             .category("authentication")
//!             .status("success")
//!             .data(json!({ "ip_address": "192.168.1.1" })),
//!     )?;
//!
//!     // Same chain as the entry above
//!     logger.log("Session refreshed", LogOptions::new())?;
//!
//!     for entry in logger.logs().recent(10).fetch()? {
//!         println!("[{}] {}", entry.level(), entry.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod error;
pub mod logger;
pub mod metadata;
pub mod query;
pub mod retention;
pub mod store;
pub mod types;

// Re-exports
pub use chain::ChainCache;
pub use error::{LogError, LogResult};
pub use logger::{BatchItem, BlockHandle, LogOptions, Loggable, Logger, LoggerDefaults};
pub use metadata::Metadata;
pub use query::LogQuery;
pub use retention::{RetentionManager, RetentionPolicy};
pub use store::{LogStore, MemoryStore, QueryFilter, RedbStore, SortOrder};
pub use types::{LogEntry, LogLevel, NewEntry, OwnerRef};
