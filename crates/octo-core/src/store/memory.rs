//! In-process record store
//!
//! Keeps rows per table in insertion order and counts writes, so tests can
//! assert exactly how many persistence calls an operation made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::RecordStore;
use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{Entity, Field, FieldValue, Filter, Row};

#[derive(Default)]
struct Tables {
    rows: HashMap<&'static str, Vec<Row>>,
    next_id: i64,
}

/// Record store backed by in-memory rows
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    reject_writes: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find` calls served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `insert`, `update` and `adjust` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with a `Persistence` error
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of rows stored for `E`
    pub fn count<E: Entity>(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.rows.get(E::TABLE).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| {
            ExError::new(ExErrorKind::Internal).with_message("record store mutex poisoned")
        })
    }

    fn check_writable<E: Entity>(&self, op: &str) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op(op.to_string())
                .with_entity(E::NAME)
                .with_message("write rejected by store"));
        }
        Ok(())
    }
}

fn matches<K: Field>(row: &Row, filter: &Filter<K>) -> bool {
    filter
        .iter()
        .all(|(field, value)| row.get(field.column()) == Some(value))
}

impl RecordStore for MemoryRecordStore {
    fn find<E: Entity>(&self, filter: &Filter<E::Key>) -> Result<Vec<E>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.lock()?;
        let found = match tables.rows.get(E::TABLE) {
            Some(rows) => rows
                .iter()
                .filter(|row| matches(row, filter))
                .map(E::from_row)
                .collect::<Result<Vec<E>>>()?,
            None => Vec::new(),
        };
        Ok(found)
    }

    fn insert<E: Entity>(&self, record: &mut E) -> Result<()> {
        self.check_writable::<E>("insert")?;
        let mut tables = self.lock()?;
        tables.next_id += 1;
        let id = tables.next_id;
        record.set_id(id);
        tables.rows.entry(E::TABLE).or_default().push(record.to_row());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update<E: Entity>(&self, record: &E) -> Result<()> {
        self.check_writable::<E>("update")?;
        let id = record.id().ok_or_else(|| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("update")
                .with_entity(E::NAME)
                .with_message("record has no identity")
        })?;
        let mut tables = self.lock()?;
        let slot = tables
            .rows
            .get_mut(E::TABLE)
            .and_then(|rows| rows.iter_mut().find(|row| row.id() == Some(id)))
            .ok_or_else(|| {
                ExError::new(ExErrorKind::Persistence)
                    .with_op("update")
                    .with_entity(E::NAME)
                    .with_message(format!("no row with id {}", id))
            })?;
        *slot = record.to_row();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn adjust<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        field: E::Attr,
        delta: i64,
    ) -> Result<usize> {
        self.check_writable::<E>("adjust")?;
        let column = field.column();
        let mut tables = self.lock()?;
        let mut touched = 0;
        if let Some(rows) = tables.rows.get_mut(E::TABLE) {
            for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                let current = row.int_or(column, 0)?;
                row.push(column, FieldValue::Int(current + delta));
                touched += 1;
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(touched)
    }
}
