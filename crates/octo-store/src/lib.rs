//! Octo Store - Persistence and cache backends with SQLite and Redis
//!
//! Provides:
//! - SQLite schema with a reversible migrations framework
//! - `SqliteRecordStore`, the relational store behind the access layer
//! - `RedisCache`, the networked cache store
//! - Store configuration from TOML or the environment

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use cache::RedisCache;
pub use config::{CacheConfig, StoreConfig};
pub use errors::Result;
pub use repo::SqliteRecordStore;
