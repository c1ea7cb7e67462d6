//! Octo Core - cache-augmented record access
//!
//! This crate provides the read-through / write-through layer that sits in
//! front of the analytics relational store, including:
//! - Typed entities with natural-key and attribute field enums
//! - Deterministic cache-key derivation and per-entity TTL policy
//! - The serialization contract for cached records and record sets
//! - Find, find-or-create, upsert and counter-adjust protocols
//! - Pluggable record and cache stores, with in-memory implementations
//!
//! The SQLite store, the Redis cache and schema migrations live in `octo-store`.

pub mod access;
pub mod cache;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod store;

pub use octo_core_types::schema;

// Re-export commonly used types
pub use access::CachedRecordAccess;
pub use cache::{CacheStore, InMemoryCache};
pub use codec::CacheKey;
pub use errors::{CacheError, ExError, ExErrorKind, Result};
pub use model::{Changes, CounterEntity, Entity, FieldValue, Filter, RecordSet, Row};
pub use store::{MemoryRecordStore, RecordStore};
