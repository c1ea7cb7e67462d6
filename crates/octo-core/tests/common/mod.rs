use octo_core::entities::{Counter, CounterAttr, CounterKey};
use octo_core::{CachedRecordAccess, Changes, Filter, InMemoryCache, MemoryRecordStore};

pub type MemoryAccess = CachedRecordAccess<MemoryRecordStore, InMemoryCache>;

/// Access layer over empty in-memory stores
#[allow(dead_code)]
pub fn new_access() -> MemoryAccess {
    CachedRecordAccess::new(MemoryRecordStore::new(), InMemoryCache::new())
}

#[allow(dead_code)]
pub fn user_filter(user_id: i64) -> Filter<CounterKey> {
    Filter::new().with(CounterKey::UserId, user_id)
}

#[allow(dead_code)]
pub fn count(n: i64) -> Changes<CounterAttr> {
    Changes::new().with(CounterAttr::Count, n)
}

/// Insert a counter directly into the store, bypassing the cache
#[allow(dead_code)]
pub fn seed_counter(access: &MemoryAccess, user_id: i64, value: i64) -> Counter {
    use octo_core::RecordStore;

    let mut counter = Counter {
        id: None,
        user_id,
        count: value,
    };
    access.store().insert(&mut counter).unwrap();
    counter
}
