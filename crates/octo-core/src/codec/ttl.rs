use std::time::Duration;

use crate::model::Entity;

/// TTL applied when an entity declares none
pub const DEFAULT_TTL_MINUTES: u64 = 60;

/// Cache lifetime of entries for entity `E`
pub fn ttl<E: Entity>() -> Duration {
    Duration::from_secs(ttl_seconds::<E>())
}

/// Cache lifetime of entries for entity `E`, in whole seconds
pub fn ttl_seconds<E: Entity>() -> u64 {
    E::TTL_MINUTES.unwrap_or(DEFAULT_TTL_MINUTES) * 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Counter, Product};

    #[test]
    fn test_declared_ttl() {
        assert_eq!(ttl_seconds::<Counter>(), 300);
        assert_eq!(ttl::<Counter>(), Duration::from_secs(300));
    }

    #[test]
    fn test_default_ttl() {
        assert_eq!(ttl_seconds::<Product>(), 3600);
    }
}
