//! Correlation-chain cache.
//!
//! Entries emitted by one owner in succession share a "chain" (correlation
//! id) unless the caller supplies an explicit one. The cache holds the
//! last-used chain per owner for the lifetime of the process; it is not
//! persisted, and a cold cache simply mints a fresh chain on first use.

use crate::types::OwnerRef;
use parking_lot::Mutex;
use std::collections::HashMap;
use ulid::Ulid;

/// Process-lifetime cache of the active correlation chain per owner.
///
/// Resolution is check-then-act, so it runs under the cache lock: two
/// concurrent first calls for the same owner must agree on a single minted
/// chain, otherwise one logical workflow splits into two correlation groups.
/// The lock covers only the map operation; store I/O happens outside it.
#[derive(Debug, Default)]
pub struct ChainCache {
    inner: Mutex<HashMap<OwnerRef, String>>,
}

impl ChainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the active chain for `owner`.
    ///
    /// An explicit non-empty chain wins and becomes the cached chain.
    /// An empty explicit chain is treated as absent rather than cached.
    /// With no usable explicit value, the cached chain is returned, or a
    /// fresh ULID is minted and cached on first use.
    pub fn resolve(&self, owner: &OwnerRef, explicit: Option<&str>) -> String {
        let mut cache = self.inner.lock();
        match explicit {
            Some(chain) if !chain.is_empty() => {
                cache.insert(owner.clone(), chain.to_string());
                chain.to_string()
            }
            _ => cache
                .entry(owner.clone())
                .or_insert_with(mint_chain)
                .clone(),
        }
    }

    /// Current cached chain for `owner`, without minting
    pub fn peek(&self, owner: &OwnerRef) -> Option<String> {
        self.inner.lock().get(owner).cloned()
    }

    /// Drop the cached chain for `owner`; the next implicit log call mints
    /// a new one (session-end semantics)
    pub fn forget(&self, owner: &OwnerRef) {
        self.inner.lock().remove(owner);
    }

    /// Drop all cached chains
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// Mint a fresh correlation id. ULIDs are collision-resistant and sort by
/// creation time, which keeps chains readable in dumps.
fn mint_chain() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn owner() -> OwnerRef {
        OwnerRef::new("User", 1)
    }

    #[test]
    fn test_first_resolve_mints_and_caches() {
        let cache = ChainCache::new();
        let chain = cache.resolve(&owner(), None);
        assert!(!chain.is_empty());
        assert_eq!(cache.peek(&owner()), Some(chain.clone()));
        // Second implicit resolve reuses it
        assert_eq!(cache.resolve(&owner(), None), chain);
    }

    #[test]
    fn test_explicit_chain_repoints_cache() {
        let cache = ChainCache::new();
        let minted = cache.resolve(&owner(), None);
        let explicit = cache.resolve(&owner(), Some("workflow-9"));
        assert_eq!(explicit, "workflow-9");
        assert_ne!(explicit, minted);
        // Subsequent implicit calls follow the explicit chain
        assert_eq!(cache.resolve(&owner(), None), "workflow-9");
    }

    #[test]
    fn test_empty_explicit_chain_falls_back() {
        let cache = ChainCache::new();
        let minted = cache.resolve(&owner(), Some(""));
        assert!(!minted.is_empty());
        // The empty string was not cached
        assert_eq!(cache.peek(&owner()), Some(minted));
    }

    #[test]
    fn test_owners_are_independent() {
        let cache = ChainCache::new();
        let a = cache.resolve(&OwnerRef::new("User", 1), None);
        let b = cache.resolve(&OwnerRef::new("User", 2), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_forget_mints_fresh_chain() {
        let cache = ChainCache::new();
        let first = cache.resolve(&owner(), None);
        cache.forget(&owner());
        assert_eq!(cache.peek(&owner()), None);
        let second = cache.resolve(&owner(), None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_concurrent_first_use_agrees_on_one_chain() {
        let cache = Arc::new(ChainCache::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                cache.resolve(&OwnerRef::new("User", 42), None)
            }));
        }
        let chains: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(chains.windows(2).all(|w| w[0] == w[1]));
    }
}
