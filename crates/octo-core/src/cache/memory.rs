//! In-process cache store
//!
//! Honours TTLs against an injectable clock and can simulate an outage, which
//! makes it the cache of choice for tests and single-process deployments.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::CacheStore;
use crate::errors::CacheError;

/// Time source used to expire entries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    blob: String,
    expires_at: DateTime<Utc>,
}

/// TTL-honouring in-memory cache
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Toggle a simulated outage; while unavailable every call fails with a transport error
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether a live (unexpired) entry exists, bypassing the outage switch
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|e| e.expires_at > now))
            .unwrap_or(false)
    }

    /// Seconds until `key` expires, if it is live
    pub fn ttl_remaining(&self, key: &str) -> Option<i64> {
        let now = self.clock.now();
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        (entry.expires_at > now).then(|| (entry.expires_at - now).num_seconds())
    }

    /// Overwrite the raw blob under `key`, keeping its expiry, to simulate corruption
    pub fn corrupt(&self, key: &str, blob: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entry) = entries.get_mut(key) {
                entry.blob = blob.to_string();
            }
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::transport("in-memory cache marked unavailable"))
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_available()?;
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::transport("cache mutex poisoned"))?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.blob.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_with_expiry(&self, key: &str, blob: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.ensure_available()?;
        let expires_at = Duration::from_std(std::time::Duration::from_secs(ttl_seconds))
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or(CacheError::TtlOutOfRange { ttl_seconds })?;
        let entry = Entry {
            blob: blob.to_string(),
            expires_at,
        };
        self.entries
            .lock()
            .map_err(|_| CacheError::transport("cache mutex poisoned"))?
            .insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn manual() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = manual();
        let cache = InMemoryCache::with_clock(clock.clone());
        cache.set_with_expiry("k", "v", 60).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(cache.ttl_remaining("k"), Some(60));

        clock.advance(Duration::seconds(59));
        assert!(cache.contains("k"));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("k").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_resets_value_and_ttl() {
        let clock = manual();
        let cache = InMemoryCache::with_clock(clock.clone());
        cache.set_with_expiry("k", "v1", 60).unwrap();
        clock.advance(Duration::seconds(50));
        cache.set_with_expiry("k", "v2", 60).unwrap();
        clock.advance(Duration::seconds(50));
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_outage_reports_transport_error() {
        let cache = InMemoryCache::new();
        cache.set_with_expiry("k", "v", 60).unwrap();
        cache.set_available(false);
        assert!(matches!(cache.get("k"), Err(CacheError::Transport { .. })));
        assert!(cache.set_with_expiry("k", "v", 60).is_err());
        cache.set_available(true);
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_unrepresentable_ttl_is_rejected() {
        let cache = InMemoryCache::with_clock(manual());
        let err = cache.set_with_expiry("k", "v", u64::MAX).unwrap_err();
        assert_eq!(err, CacheError::TtlOutOfRange { ttl_seconds: u64::MAX });
        assert!(cache.is_empty());

        // Long but representable lifetimes are still accepted
        cache.set_with_expiry("k", "v", 100 * 365 * 24 * 3600).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
    }
}
