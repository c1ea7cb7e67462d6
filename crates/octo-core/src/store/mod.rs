//! Relational store collaborator
//!
//! The access layer needs equality lookups, inserts with generated identity,
//! updates by identity and an atomic counter adjustment. Implementations
//! report every failure as a `Persistence` error (or `InvalidInput` for
//! records that cannot be written at all).

pub mod memory;

use crate::errors::Result;
use crate::model::{Entity, Filter};

pub use memory::MemoryRecordStore;

/// Store of record for every entity
pub trait RecordStore {
    /// All records matching every filter pair, ordered by identity
    fn find<E: Entity>(&self, filter: &Filter<E::Key>) -> Result<Vec<E>>;

    /// Insert `record` and assign its generated identity
    fn insert<E: Entity>(&self, record: &mut E) -> Result<()>;

    /// Overwrite the stored columns of `record`, located by identity
    fn update<E: Entity>(&self, record: &E) -> Result<()>;

    /// Add `delta` to `field` on every matching record; returns the number of rows touched
    fn adjust<E: Entity>(&self, filter: &Filter<E::Key>, field: E::Attr, delta: i64)
        -> Result<usize>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn find<E: Entity>(&self, filter: &Filter<E::Key>) -> Result<Vec<E>> {
        (**self).find::<E>(filter)
    }

    fn insert<E: Entity>(&self, record: &mut E) -> Result<()> {
        (**self).insert::<E>(record)
    }

    fn update<E: Entity>(&self, record: &E) -> Result<()> {
        (**self).update::<E>(record)
    }

    fn adjust<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        field: E::Attr,
        delta: i64,
    ) -> Result<usize> {
        (**self).adjust::<E>(filter, field, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::entities::{Counter, CounterAttr, CounterKey};
    use crate::model::Changes;
    use crate::CachedRecordAccess;

    #[test]
    fn test_borrowed_store_forwards_every_operation() {
        let store = MemoryRecordStore::new();
        let borrowed = &store;
        let filter = Filter::new().with(CounterKey::UserId, 5i64);

        let mut counter = Counter { id: None, user_id: 5, count: 1 };
        RecordStore::insert(&borrowed, &mut counter).unwrap();
        counter.count = 2;
        RecordStore::update(&borrowed, &counter).unwrap();
        assert_eq!(
            RecordStore::adjust::<Counter>(&borrowed, &filter, CounterAttr::Count, 3).unwrap(),
            1
        );

        let found: Vec<Counter> = RecordStore::find(&borrowed, &filter).unwrap();
        assert_eq!(found[0].count, 5);
    }

    #[test]
    fn test_access_over_borrowed_store() {
        let store = MemoryRecordStore::new();
        let access = CachedRecordAccess::new(&store, InMemoryCache::new());
        let filter = Filter::new().with(CounterKey::UserId, 6i64);

        access
            .find_or_create::<Counter>(&filter, &Changes::new().with(CounterAttr::Count, 0i64))
            .unwrap();
        access.find_or_create_or_adjust::<Counter>(&filter, 4).unwrap();

        assert_eq!(store.count::<Counter>(), 1);
        let found: Vec<Counter> = store.find(&filter).unwrap();
        assert_eq!(found[0].count, 4);
    }
}
