//! Cache store collaborator
//!
//! The access layer only needs two operations from a cache: a get that
//! distinguishes absence (`Ok(None)`) from transport failure (`Err`), and a
//! set with expiry. Implementations are best-effort; callers never depend on
//! an entry being present.

pub mod memory;

use std::sync::Arc;

use crate::errors::CacheError;

pub use memory::{Clock, InMemoryCache, ManualClock, SystemClock};

/// Key-value store holding serialized record sets
pub trait CacheStore: Send + Sync {
    /// Fetch the blob stored under `key`, `Ok(None)` when absent or expired
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `blob` under `key`, replacing any previous value, expiring after `ttl_seconds`
    fn set_with_expiry(&self, key: &str, blob: &str, ttl_seconds: u64) -> Result<(), CacheError>;
}

impl<C: CacheStore + ?Sized> CacheStore for Arc<C> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set_with_expiry(&self, key: &str, blob: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        (**self).set_with_expiry(key, blob, ttl_seconds)
    }
}

impl<C: CacheStore + ?Sized> CacheStore for &C {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set_with_expiry(&self, key: &str, blob: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        (**self).set_with_expiry(key, blob, ttl_seconds)
    }
}
