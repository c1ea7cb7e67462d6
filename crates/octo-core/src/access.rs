//! Cache-augmented record access
//!
//! Every read and write goes through one algorithm, [`CachedRecordAccess::resolve`]:
//!
//! 1. derive the cache key from the entity name and the filter
//! 2. probe the cache; a transport failure or an undecodable blob counts as a miss
//! 3. on a miss, query the store; an empty result is returned as `None` and
//!    never cached, anything else is cached with the entity TTL
//! 4. apply the write policy: nothing, create when missing, or create when
//!    missing and update dirty attributes when present
//!
//! The relational store is authoritative. Cache failures are logged and
//! absorbed; store failures are returned to the caller.

use std::time::Instant;

use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::codec::{self, CacheKey};
use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{
    rounded_eq, Changes, CounterEntity, Entity, Field, FieldValue, Filter, IdentitySource,
    RecordSet, ENTERPRISE_ID_COLUMN,
};
use crate::schema::{
    EVENT_CACHE_DECODE_FAILED, EVENT_CACHE_HIT, EVENT_CACHE_MISS, EVENT_CACHE_UNAVAILABLE,
    EVENT_CACHE_WRITE_FAILED,
};
use crate::store::RecordStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// What to do once the lookup has settled
enum WritePolicy<'a, A: Field> {
    ReadOnly,
    CreateMissing(&'a Changes<A>),
    Upsert(&'a Changes<A>),
}

/// Read-through / write-through access to records of any entity
///
/// The store and the cache are injected; nothing is shared process-wide.
/// No locking is performed: concurrent creators of the same record race and
/// the store's uniqueness constraints decide the winner.
pub struct CachedRecordAccess<S, C> {
    store: S,
    cache: C,
}

impl<S: RecordStore, C: CacheStore> CachedRecordAccess<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn into_parts(self) -> (S, C) {
        (self.store, self.cache)
    }

    /// Records matching `filter`, served from the cache when possible
    ///
    /// Returns `None` when nothing matches; that outcome is not cached.
    pub fn get_cached<E: Entity>(&self, filter: &Filter<E::Key>) -> Result<Option<RecordSet<E>>> {
        self.instrumented::<E, _>("get_cached", || {
            self.resolve::<E>(filter, WritePolicy::ReadOnly)
        })
    }

    /// Matching records, or a newly created one built from `filter ∪ extra`
    ///
    /// Existing matches are returned untouched; `extra` is only used when creating.
    pub fn find_or_create<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        extra: &Changes<E::Attr>,
    ) -> Result<RecordSet<E>> {
        self.instrumented::<E, _>("find_or_create", || {
            self.resolve::<E>(filter, WritePolicy::CreateMissing(extra))?
                .ok_or_else(|| unresolved::<E>("find_or_create"))
        })
    }

    /// The single matching record with `options` applied, creating it if missing
    ///
    /// Only attributes whose value actually changes count as dirty; when none
    /// do, neither the store nor the cache is written.
    pub fn find_or_create_or_update<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        options: &Changes<E::Attr>,
    ) -> Result<E> {
        self.instrumented::<E, _>("find_or_create_or_update", || {
            self.resolve::<E>(filter, WritePolicy::Upsert(options))?
                .and_then(RecordSet::into_single)
                .ok_or_else(|| unresolved::<E>("find_or_create_or_update"))
        })
    }

    /// Ensure a counter row exists for `filter`, then add `delta` to it in the store
    ///
    /// Counters are read through aggregate queries, so the cache is neither
    /// consulted nor written. Returns the number of rows adjusted.
    pub fn find_or_create_or_adjust<E: CounterEntity>(
        &self,
        filter: &Filter<E::Key>,
        delta: i64,
    ) -> Result<usize> {
        self.instrumented::<E, _>("find_or_create_or_adjust", || {
            if self.store.find::<E>(filter)?.is_empty() {
                let seed = Changes::new().with(E::COUNTER, 0i64);
                let mut record = E::build(filter, &seed)?;
                self.store.insert(&mut record)?;
            }
            self.store.adjust::<E>(filter, E::COUNTER, delta)
        })
    }

    /// Look up the `E` records belonging to another object's enterprise identity
    ///
    /// Supported only for entities keyed by `enterprise_id` plus exactly one
    /// other field, which receives the source's uid. Entities without an
    /// `enterprise_id` key yield `None`.
    ///
    /// # Errors
    ///
    /// `NotImplemented` for any other key shape.
    pub fn recreate_from<E: Entity, I: IdentitySource>(
        &self,
        source: &I,
    ) -> Result<Option<RecordSet<E>>> {
        let keys = <E::Key as Field>::ALL;
        let Some(enterprise) = keys.iter().find(|k| k.column() == ENTERPRISE_ID_COLUMN) else {
            return Ok(None);
        };
        let others: Vec<&E::Key> = keys
            .iter()
            .filter(|k| k.column() != ENTERPRISE_ID_COLUMN)
            .collect();
        let [uid_field] = others.as_slice() else {
            let columns: Vec<&str> = others.iter().map(|k| k.column()).collect();
            return Err(ExError::new(ExErrorKind::NotImplemented)
                .with_op("recreate_from")
                .with_entity(E::NAME)
                .with_message(format!(
                    "cannot map a uid onto key columns {:?}",
                    columns
                )));
        };

        let filter = Filter::new()
            .with(*enterprise, source.enterprise_id())
            .with(**uid_field, source.uid());
        self.get_cached::<E>(&filter)
    }

    /// Shared lookup-then-write algorithm behind every public operation
    fn resolve<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        policy: WritePolicy<'_, E::Attr>,
    ) -> Result<Option<RecordSet<E>>> {
        let key = codec::derive_key::<E>(filter);
        let found = self.lookup::<E>(&key, filter)?;

        match (found, policy) {
            (found, WritePolicy::ReadOnly) => Ok(found),
            (Some(set), WritePolicy::CreateMissing(_)) => Ok(Some(set)),
            (Some(set), WritePolicy::Upsert(options)) => {
                let mut record = match set {
                    RecordSet::One(record) => record,
                    RecordSet::Many(records) => {
                        return Err(ExError::new(ExErrorKind::AmbiguousMatch)
                            .with_op("find_or_create_or_update")
                            .with_entity(E::NAME)
                            .with_cache_key(key.as_str())
                            .with_message(format!(
                                "filter matches {} records, update needs exactly one",
                                records.len()
                            )))
                    }
                };
                if apply_changes(&mut record, options)? {
                    self.store.update(&record)?;
                    let set = RecordSet::One(record);
                    self.write_entry(&key, &set);
                    return Ok(Some(set));
                }
                Ok(Some(RecordSet::One(record)))
            }
            (None, WritePolicy::CreateMissing(changes) | WritePolicy::Upsert(changes)) => {
                let mut record = E::build(filter, changes)?;
                self.store.insert(&mut record)?;
                let set = RecordSet::One(record);
                self.write_entry(&key, &set);
                Ok(Some(set))
            }
        }
    }

    /// Cache probe with store fallback and repopulation
    fn lookup<E: Entity>(
        &self,
        key: &CacheKey,
        filter: &Filter<E::Key>,
    ) -> Result<Option<RecordSet<E>>> {
        match self.cache.get(key.as_str()) {
            Ok(Some(blob)) => match codec::deserialize::<E>(&blob) {
                Ok(set) => {
                    debug!(event = EVENT_CACHE_HIT, entity = E::NAME, cache_key = key.as_str());
                    return Ok(Some(set));
                }
                Err(err) => warn!(
                    event = EVENT_CACHE_DECODE_FAILED,
                    entity = E::NAME,
                    cache_key = key.as_str(),
                    err_code = err.code(),
                    error = %err,
                    "discarding undecodable cache entry"
                ),
            },
            Ok(None) => {
                debug!(event = EVENT_CACHE_MISS, entity = E::NAME, cache_key = key.as_str());
            }
            Err(err) => warn!(
                event = EVENT_CACHE_UNAVAILABLE,
                entity = E::NAME,
                cache_key = key.as_str(),
                error = %err,
                "cache probe failed, reading from store"
            ),
        }

        let records = self
            .store
            .find::<E>(filter)
            .map_err(|e| e.with_entity(E::NAME))?;
        let Some(set) = RecordSet::from_records(records) else {
            return Ok(None);
        };
        self.write_entry(key, &set);
        Ok(Some(set))
    }

    /// Best-effort cache write with the entity TTL
    fn write_entry<E: Entity>(&self, key: &CacheKey, set: &RecordSet<E>) {
        let ttl_secs = codec::ttl_seconds::<E>();
        let outcome = codec::serialize(set).and_then(|blob| {
            self.cache
                .set_with_expiry(key.as_str(), &blob, ttl_secs)
                .map_err(ExError::from)
        });
        if let Err(err) = outcome {
            warn!(
                event = EVENT_CACHE_WRITE_FAILED,
                entity = E::NAME,
                cache_key = key.as_str(),
                ttl_secs,
                err_code = err.code(),
                error = %err,
                "cache write skipped"
            );
        }
    }

    fn instrumented<E: Entity, T>(
        &self,
        op: &'static str,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let started = Instant::now();
        log_op_start!(op, entity = E::NAME);
        let result = f();
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(op, duration_ms = duration_ms, entity = E::NAME);
            }
            Err(err) => {
                log_op_error!(op, err.clone(), duration_ms = duration_ms, entity = E::NAME);
            }
        }
        result
    }
}

/// Assign every option whose value differs; returns whether anything changed
fn apply_changes<E: Entity>(record: &mut E, options: &Changes<E::Attr>) -> Result<bool> {
    let mut dirty = false;
    for (field, value) in options.iter() {
        let current = record.attr_value(*field);
        if !same_value(*field, &current, value) {
            record.set_attr(*field, value.clone())?;
            dirty = true;
        }
    }
    Ok(dirty)
}

fn same_value<A: Field>(field: A, current: &FieldValue, new: &FieldValue) -> bool {
    match (field.precision(), current.as_f64(), new.as_f64()) {
        (Some(places), Some(a), Some(b)) => rounded_eq(a, b, places),
        _ => current == new,
    }
}

fn unresolved<E: Entity>(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_entity(E::NAME)
        .with_message("write policy produced no record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryCache, ManualClock};
    use crate::entities::{
        AdapterDetails, AppLogin, Counter, CounterAttr, CounterKey, Product, ProductAttr,
        ProductKey,
    };
    use crate::store::MemoryRecordStore;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    type Access = CachedRecordAccess<MemoryRecordStore, InMemoryCache>;

    fn access() -> Access {
        CachedRecordAccess::new(MemoryRecordStore::new(), InMemoryCache::new())
    }

    fn user(id: i64) -> Filter<CounterKey> {
        Filter::new().with(CounterKey::UserId, id)
    }

    fn count(n: i64) -> Changes<CounterAttr> {
        Changes::new().with(CounterAttr::Count, n)
    }

    fn product_filter() -> Filter<ProductKey> {
        Filter::new()
            .with(ProductKey::EnterpriseId, "ent-1")
            .with(ProductKey::ProductId, 7i64)
    }

    fn seed_product(access: &Access, price: f64) -> Product {
        let options = Changes::new()
            .with(ProductAttr::Name, "lamp")
            .with(ProductAttr::Price, price);
        access
            .find_or_create::<Product>(&product_filter(), &options)
            .unwrap()
            .into_single()
            .unwrap()
    }

    #[test]
    fn test_negative_result_is_not_cached() {
        let access = access();
        let key = codec::derive_key::<Counter>(&user(1));

        assert!(access.get_cached::<Counter>(&user(1)).unwrap().is_none());
        assert!(!access.cache().contains(key.as_str()));
        assert!(access.get_cached::<Counter>(&user(1)).unwrap().is_none());
        assert_eq!(access.store().reads(), 2);
    }

    #[test]
    fn test_miss_populates_then_hit_skips_store() {
        let access = access();
        let mut row = Counter { id: None, user_id: 3, count: 9 };
        access.store().insert(&mut row).unwrap();

        let first = access.get_cached::<Counter>(&user(3)).unwrap().unwrap();
        let second = access.get_cached::<Counter>(&user(3)).unwrap().unwrap();
        assert_eq!(first, RecordSet::One(row));
        assert_eq!(first, second);
        assert_eq!(access.store().reads(), 1);

        let key = codec::derive_key::<Counter>(&user(3));
        let ttl = access.cache().ttl_remaining(key.as_str());
        assert!(matches!(ttl, Some(299..=300)), "unexpected ttl {:?}", ttl);
    }

    #[test]
    fn test_multiple_rows_cached_as_set() {
        let access = access();
        for minute in 0..3 {
            let mut login = AppLogin {
                id: None,
                userid: 5,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, minute, 0).unwrap(),
            };
            access.store().insert(&mut login).unwrap();
        }
        let filter = Filter::new().with(crate::entities::AppLoginKey::Userid, 5i64);

        let set = access.get_cached::<AppLogin>(&filter).unwrap().unwrap();
        assert!(matches!(set, RecordSet::Many(ref rows) if rows.len() == 3));
        let cached = access.get_cached::<AppLogin>(&filter).unwrap().unwrap();
        assert_eq!(set, cached);
        assert_eq!(access.store().reads(), 1);
    }

    #[test]
    fn test_find_or_create_creates_once() {
        let access = access();
        let created = access.find_or_create::<Counter>(&user(1), &count(0)).unwrap();
        let again = access.find_or_create::<Counter>(&user(1), &count(42)).unwrap();

        assert_eq!(created, again);
        assert_eq!(again.single().unwrap().count, 0);
        assert_eq!(access.store().writes(), 1);
        assert!(access
            .cache()
            .contains(codec::derive_key::<Counter>(&user(1)).as_str()));
    }

    #[test]
    fn test_find_or_create_persistence_failure_leaves_cache_untouched() {
        let access = access();
        access.store().reject_writes(true);

        let err = access.find_or_create::<Counter>(&user(1), &count(0)).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert!(access.cache().is_empty());
    }

    #[test]
    fn test_update_is_idempotent() {
        let access = access();
        access.find_or_create::<Counter>(&user(1), &count(0)).unwrap();
        let writes_before = access.store().writes();

        let first = access.find_or_create_or_update::<Counter>(&user(1), &count(5)).unwrap();
        let second = access.find_or_create_or_update::<Counter>(&user(1), &count(5)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.count, 5);
        assert_eq!(access.store().writes() - writes_before, 1);
    }

    #[test]
    fn test_update_refreshes_cache_entry() {
        let access = access();
        access.find_or_create::<Counter>(&user(1), &count(0)).unwrap();
        access.find_or_create_or_update::<Counter>(&user(1), &count(8)).unwrap();

        access.store().reject_writes(true);
        let cached = access.get_cached::<Counter>(&user(1)).unwrap().unwrap();
        assert_eq!(cached.single().unwrap().count, 8);
    }

    #[test]
    fn test_price_within_rounding_is_unchanged() {
        let access = access();
        seed_product(&access, 19.99);
        let writes_before = access.store().writes();

        let options = Changes::new().with(ProductAttr::Price, 19.995);
        let product = access
            .find_or_create_or_update::<Product>(&product_filter(), &options)
            .unwrap();

        assert_eq!(product.price, 19.99);
        assert_eq!(access.store().writes(), writes_before);
    }

    #[test]
    fn test_price_outside_rounding_updates() {
        let access = access();
        seed_product(&access, 19.99);
        let writes_before = access.store().writes();

        let options = Changes::new().with(ProductAttr::Price, 19.90);
        let product = access
            .find_or_create_or_update::<Product>(&product_filter(), &options)
            .unwrap();

        assert_eq!(product.price, 19.90);
        assert_eq!(access.store().writes(), writes_before + 1);
    }

    #[test]
    fn test_update_creates_when_missing() {
        let access = access();
        let product = access
            .find_or_create_or_update::<Product>(
                &product_filter(),
                &Changes::new()
                    .with(ProductAttr::Name, "desk")
                    .with(ProductAttr::Price, 120.0),
            )
            .unwrap();
        assert_eq!(product.id, Some(1));
        assert_eq!(product.name, "desk");
        assert_eq!(access.store().writes(), 1);
    }

    #[test]
    fn test_update_against_many_matches_is_ambiguous() {
        let access = access();
        for i in 0..2 {
            let mut p = Product {
                id: None,
                enterprise_id: "ent-1".to_string(),
                product_id: i,
                name: "x".to_string(),
                price: 1.0,
            };
            access.store().insert(&mut p).unwrap();
        }
        let filter = Filter::new().with(ProductKey::EnterpriseId, "ent-1");
        let err = access
            .find_or_create_or_update::<Product>(&filter, &Changes::new().with(ProductAttr::Price, 2.0))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AmbiguousMatch);
        assert_eq!(access.store().writes(), 2);
    }

    #[test]
    fn test_mistyped_option_is_invalid_input() {
        let access = access();
        access.find_or_create::<Counter>(&user(1), &count(0)).unwrap();
        let err = access
            .find_or_create_or_update::<Counter>(
                &user(1),
                &Changes::new().with(CounterAttr::Count, "five"),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_fail_open_when_cache_unavailable() {
        let access = access();
        let mut row = Counter { id: None, user_id: 2, count: 11 };
        access.store().insert(&mut row).unwrap();
        access.cache().set_available(false);

        let found = access.get_cached::<Counter>(&user(2)).unwrap().unwrap();
        assert_eq!(found, RecordSet::One(row));

        let created = access.find_or_create::<Counter>(&user(3), &count(1)).unwrap();
        assert_eq!(created.single().unwrap().user_id, 3);
    }

    #[test]
    fn test_corrupt_entry_falls_back_to_store() {
        let access = access();
        access.find_or_create::<Counter>(&user(1), &count(4)).unwrap();
        let key = codec::derive_key::<Counter>(&user(1));
        access.cache().corrupt(key.as_str(), "garbage");

        let found = access.get_cached::<Counter>(&user(1)).unwrap().unwrap();
        assert_eq!(found.single().unwrap().count, 4);

        let repaired = access.cache().get(key.as_str()).unwrap().unwrap();
        assert!(codec::deserialize::<Counter>(&repaired).is_ok());
    }

    #[test]
    fn test_adjust_creates_then_increments_without_caching() {
        let access = access();
        assert_eq!(access.find_or_create_or_adjust::<Counter>(&user(9), 3).unwrap(), 1);
        assert_eq!(access.find_or_create_or_adjust::<Counter>(&user(9), -1).unwrap(), 1);

        let rows: Vec<Counter> = access.store().find(&user(9)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert!(access.cache().is_empty());
    }

    #[test]
    fn test_recreate_from_enterprise_identity() {
        let access = access();
        let lamp = seed_product(&access, 5.0);

        let found = access.recreate_from::<Product, _>(&lamp).unwrap().unwrap();
        assert_eq!(found.single(), Some(&lamp));
    }

    #[test]
    fn test_recreate_from_unsupported_key_shape() {
        let access = access();
        let lamp = seed_product(&access, 5.0);

        let err = access
            .recreate_from::<AdapterDetails, _>(&lamp)
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotImplemented);
        assert!(access.recreate_from::<Counter, _>(&lamp).unwrap().is_none());
    }

    #[test]
    fn test_counter_lifecycle_with_expiry() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        ));
        let access = CachedRecordAccess::new(
            MemoryRecordStore::new(),
            InMemoryCache::with_clock(clock.clone()),
        );

        access.find_or_create::<Counter>(&user(1), &count(0)).unwrap();
        let hit = access.get_cached::<Counter>(&user(1)).unwrap().unwrap();
        assert_eq!(hit.single().unwrap().count, 0);
        assert_eq!(access.store().reads(), 1);

        access.find_or_create_or_update::<Counter>(&user(1), &count(5)).unwrap();
        clock.advance(Duration::minutes(5));

        let reloaded = access.get_cached::<Counter>(&user(1)).unwrap().unwrap();
        assert_eq!(reloaded.single().unwrap().count, 5);
        assert_eq!(access.store().reads(), 2);
    }
}
