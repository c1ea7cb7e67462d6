use std::fmt;

use crate::model::{Entity, Field, Filter};

/// Fixed separator between cache key tokens
pub const KEY_DELIMITER: &str = "::";

/// Cache key derived from an entity name and a filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for `filter` on entity `E`
///
/// Tokens follow the filter's insertion order, so the same fields supplied
/// in a different order yield a different key. Values are not escaped; a
/// value containing `::` can collide with another filter's key.
pub fn derive_key<E: Entity>(filter: &Filter<E::Key>) -> CacheKey {
    let mut tokens: Vec<String> = Vec::with_capacity(1 + filter.len() * 2);
    tokens.push(E::NAME.to_string());
    for (field, value) in filter.iter() {
        tokens.push(field.column().to_string());
        tokens.push(value.to_string());
    }
    CacheKey(tokens.join(KEY_DELIMITER))
}
