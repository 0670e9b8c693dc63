//! Core types for chainlog

use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};

/// Polymorphic reference to the entity that emitted a log entry.
///
/// Any domain entity with a stable (type, id) pair can own log entries;
/// the pair is also the key for correlation-chain caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Owner type discriminator (e.g., "User", "Order")
    pub kind: String,
    /// Owner identifier, stringified for uniformity across id schemes
    pub id: String,
}

impl OwnerRef {
    /// Create an owner reference from a type discriminator and an id
    pub fn new(kind: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Severity of a log entry
///
/// Stored inside metadata as the conventional `log_level` field
/// (lowercase string form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase string form used in stored metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a stored level string, falling back to `Info` for anything
    /// unrecognized. Stored metadata is free-form, so reads never fail here;
    /// strict parsing of caller input goes through `FromStr`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::error::LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(crate::error::LogError::InvalidLevel(other.to_string())),
        }
    }
}

/// A persisted log entry.
///
/// Entries are immutable once inserted; `id` is assigned by the store and
/// is the tie-breaker wherever `created_at` collides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned unique identifier
    pub id: u64,
    /// Emitting entity
    pub owner: OwnerRef,
    /// Display message
    pub message: String,
    /// Free-form nested payload, including the conventional fields
    pub metadata: Metadata,
    /// Unix timestamp in milliseconds, set at insert
    pub created_at: i64,
    /// Unix timestamp in milliseconds, set at insert
    pub updated_at: i64,
}

impl LogEntry {
    /// Correlation chain id, if present in metadata
    pub fn chain(&self) -> Option<&str> {
        self.metadata.chain()
    }

    /// Level recorded in metadata (defaults to `Info` when absent or unknown)
    pub fn level(&self) -> LogLevel {
        self.metadata.level()
    }
}

/// A log entry awaiting insertion; the store assigns the `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub owner: OwnerRef,
    pub message: String,
    pub metadata: Metadata,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewEntry {
    /// Create a new entry stamped with the current time
    pub fn new(owner: OwnerRef, message: impl Into<String>, metadata: Metadata) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            owner,
            message: message.into(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Administrative override: create an entry with explicit timestamps.
    ///
    /// This exists only to simulate historical data (fixtures, retention
    /// demos). Normal write traffic always goes through [`NewEntry::new`].
    pub fn backdated(
        owner: OwnerRef,
        message: impl Into<String>,
        metadata: Metadata,
        created_at: i64,
    ) -> Self {
        Self {
            owner,
            message: message.into(),
            metadata,
            created_at,
            updated_at: created_at,
        }
    }

    /// Attach the store-assigned id, producing the persisted form
    pub fn into_entry(self, id: u64) -> LogEntry {
        LogEntry {
            id,
            owner: self.owner,
            message: self.message,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
