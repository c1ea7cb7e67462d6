//! Redis-backed cache store
//!
//! Uses plain `GET` / `SETEX` on a single blocking connection. The connection
//! is opened lazily and dropped after any transport failure, so the next call
//! reconnects instead of reusing a dead socket.

use std::sync::Mutex;
use std::time::Duration;

use octo_core::cache::CacheStore;
use octo_core::errors::CacheError;
use redis::{Client, Connection, RedisResult};
use tracing::debug;

use crate::config::CacheConfig;
use crate::errors::from_redis;

pub struct RedisCache {
    client: Client,
    timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl RedisCache {
    /// Build a cache for the configured server without connecting yet
    ///
    /// # Errors
    ///
    /// `CacheError::Transport` when the host/port do not form a valid URL.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.url()).map_err(from_redis)?;
        Ok(Self {
            client,
            timeout: config.timeout(),
            conn: Mutex::new(None),
        })
    }

    fn connect(&self) -> Result<Connection, CacheError> {
        let conn = self
            .client
            .get_connection_with_timeout(self.timeout)
            .map_err(from_redis)?;
        conn.set_read_timeout(Some(self.timeout)).map_err(from_redis)?;
        conn.set_write_timeout(Some(self.timeout)).map_err(from_redis)?;
        debug!(timeout_ms = self.timeout.as_millis() as u64, "redis connection opened");
        Ok(conn)
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, CacheError> {
        let mut slot = self
            .conn
            .lock()
            .map_err(|_| CacheError::transport("redis connection mutex poisoned"))?;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };

        match f(&mut conn) {
            Ok(value) => {
                *slot = Some(conn);
                Ok(value)
            }
            Err(err) => {
                let broken =
                    err.is_io_error() || err.is_timeout() || err.is_connection_dropped();
                if !broken {
                    *slot = Some(conn);
                }
                Err(from_redis(err))
            }
        }
    }
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_connection(|conn| redis::cmd("GET").arg(key).query::<Option<String>>(conn))
    }

    fn set_with_expiry(&self, key: &str, blob: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.with_connection(|conn| {
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_seconds)
                .arg(blob)
                .query::<()>(conn)
        })
    }
}
