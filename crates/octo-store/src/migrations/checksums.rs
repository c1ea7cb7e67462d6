//! Migration fingerprints
//!
//! A migration's checksum covers both of its scripts, so editing a rollback
//! after the fact is caught just like editing the forward script.

use sha2::{Digest, Sha256};

use super::embedded::Migration;

/// Hex SHA-256 over the up and down scripts of `migration`
///
/// Each script is length-prefixed so text cannot shift between the two
/// without changing the digest.
pub fn migration_checksum(migration: &Migration) -> String {
    let mut hasher = Sha256::new();
    for script in [migration.up, migration.down] {
        hasher.update((script.len() as u64).to_le_bytes());
        hasher.update(script.as_bytes());
    }
    hex::encode(hasher.finalize())
}
