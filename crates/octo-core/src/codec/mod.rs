//! Cache key derivation, record serialization and TTL policy
//!
//! - Keys: entity name followed by alternating field/value tokens, joined
//!   with [`KEY_DELIMITER`]
//! - Blobs: JSON envelope tagged with the entity name and multiplicity
//! - TTL: per-entity minutes, 60 by default, seconds at the store boundary

mod blob;
mod key;
mod ttl;

pub use blob::{deserialize, serialize};
pub use key::{derive_key, CacheKey, KEY_DELIMITER};
pub use ttl::{ttl, ttl_seconds, DEFAULT_TTL_MINUTES};
