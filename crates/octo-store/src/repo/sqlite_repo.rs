//! SQLite repository implementation
//!
//! Implements the relational store behind `CachedRecordAccess`. SQL is built
//! from the static column names each entity declares; values are always
//! bound as parameters.

use chrono::SecondsFormat;
use octo_core::errors::{ExError, ExErrorKind};
use octo_core::model::{Entity, Field, FieldValue, Filter, Row};
use octo_core::store::RecordStore;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use crate::db;
use crate::errors::{from_rusqlite, Result};

/// Relational store over one SQLite connection
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Wrap an already configured and migrated connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open, configure and migrate the database at `path`
    ///
    /// # Errors
    ///
    /// `Persistence` when the database cannot be opened or migrated.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        db::open_migrated(path).map(Self::new)
    }

    /// Migrated in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// `Persistence` when migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        crate::migrations::apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

/// `WHERE` clause and parameters for an equality filter
fn where_clause<K: Field>(filter: &Filter<K>) -> (String, Vec<Value>) {
    if filter.is_empty() {
        return (String::new(), Vec::new());
    }
    let clauses: Vec<String> = filter
        .iter()
        .map(|(field, _)| format!("{} IS ?", field.column()))
        .collect();
    let params = filter.iter().map(|(_, value)| to_sql_value(value)).collect();
    (format!(" WHERE {}", clauses.join(" AND ")), params)
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(v) => Value::Integer(i64::from(*v)),
        FieldValue::Int(v) => Value::Integer(*v),
        FieldValue::Float(v) => Value::Real(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::Timestamp(v) => Value::Text(v.to_rfc3339_opts(SecondsFormat::Nanos, true)),
    }
}

fn from_sql_value(column: &str, value: Value) -> Result<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Integer(v) => Ok(FieldValue::Int(v)),
        Value::Real(v) => Ok(FieldValue::Float(v)),
        Value::Text(v) => Ok(FieldValue::Text(v)),
        Value::Blob(_) => Err(ExError::new(ExErrorKind::Persistence)
            .with_op("read_row")
            .with_message(format!("column '{}' holds a blob", column))),
    }
}

fn entity_error<E: Entity>(err: ExError) -> ExError {
    err.with_entity(E::NAME)
}

impl RecordStore for SqliteRecordStore {
    fn find<E: Entity>(&self, filter: &Filter<E::Key>) -> Result<Vec<E>> {
        let columns = E::columns();
        let (clause, params) = where_clause(filter);
        let sql = format!(
            "SELECT id, {} FROM {}{} ORDER BY id",
            columns.join(", "),
            E::TABLE,
            clause
        );
        debug!(entity = E::NAME, sql = %sql, "find");

        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let raw_rows = stmt
            .query_map(params_from_iter(params), |row| {
                let id: i64 = row.get(0)?;
                let values = (1..=columns.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()?;
                Ok((id, values))
            })
            .map_err(from_rusqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(from_rusqlite)?;

        let mut records = Vec::with_capacity(raw_rows.len());
        for (id, values) in raw_rows {
            let mut row = Row::new(Some(id));
            for (&column, value) in columns.iter().zip(values) {
                row.push(column, from_sql_value(column, value)?);
            }
            records.push(E::from_row(&row).map_err(entity_error::<E>)?);
        }
        Ok(records)
    }

    fn insert<E: Entity>(&self, record: &mut E) -> Result<()> {
        let row = record.to_row();
        let columns: Vec<&str> = row.values().iter().map(|(c, _)| *c).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders
        );
        let params = row.values().iter().map(|(_, v)| to_sql_value(v));

        self.conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| entity_error::<E>(from_rusqlite(e).with_op("insert")))?;
        record.set_id(self.conn.last_insert_rowid());
        Ok(())
    }

    fn update<E: Entity>(&self, record: &E) -> Result<()> {
        let id = record.id().ok_or_else(|| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("update")
                .with_entity(E::NAME)
                .with_message("record has no identity")
        })?;
        let row = record.to_row();
        let assignments: Vec<String> = row
            .values()
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            E::TABLE,
            assignments.join(", ")
        );
        let params = row
            .values()
            .iter()
            .map(|(_, v)| to_sql_value(v))
            .chain(std::iter::once(Value::Integer(id)));

        let changed = self
            .conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| entity_error::<E>(from_rusqlite(e).with_op("update")))?;
        if changed == 0 {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("update")
                .with_entity(E::NAME)
                .with_message(format!("no row with id {}", id)));
        }
        Ok(())
    }

    fn adjust<E: Entity>(
        &self,
        filter: &Filter<E::Key>,
        field: E::Attr,
        delta: i64,
    ) -> Result<usize> {
        let column = field.column();
        let (clause, filter_params) = where_clause(filter);
        let sql = format!(
            "UPDATE {} SET {} = {} + ?{}",
            E::TABLE,
            column,
            column,
            clause
        );
        let params = std::iter::once(Value::Integer(delta)).chain(filter_params);

        self.conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| entity_error::<E>(from_rusqlite(e).with_op("adjust")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use octo_core::entities::{
        AdapterDetails, AdapterDetailsKey, AppLogin, AppLoginKey, Counter, CounterAttr,
        CounterKey, Product, ProductKey,
    };

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_assigns_identity_and_find_reads_back() {
        let store = store();
        let mut counter = Counter { id: None, user_id: 4, count: 2 };
        store.insert(&mut counter).unwrap();
        assert!(counter.id.is_some());

        let found: Vec<Counter> = store
            .find(&Filter::new().with(CounterKey::UserId, 4i64))
            .unwrap();
        assert_eq!(found, vec![counter]);
    }

    #[test]
    fn test_find_without_match_is_empty() {
        let found: Vec<Counter> = store()
            .find(&Filter::new().with(CounterKey::UserId, 99i64))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_bool_timestamp_and_null_columns() {
        let store = store();
        let mut adapter = AdapterDetails {
            id: None,
            enterprise_id: "ent".to_string(),
            adapter_id: 3,
            enable: true,
            settings: None,
        };
        store.insert(&mut adapter).unwrap();
        let found: Vec<AdapterDetails> = store
            .find(
                &Filter::new()
                    .with(AdapterDetailsKey::EnterpriseId, "ent")
                    .with(AdapterDetailsKey::Enable, true),
            )
            .unwrap();
        assert_eq!(found, vec![adapter]);

        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let mut login = AppLogin { id: None, userid: 1, created_at: at };
        store.insert(&mut login).unwrap();
        let found: Vec<AppLogin> = store
            .find(&Filter::new().with(AppLoginKey::Userid, 1i64))
            .unwrap();
        assert_eq!(found[0].created_at, at);
    }

    #[test]
    fn test_unique_natural_key_is_persistence_error() {
        let store = store();
        let product = || Product {
            id: None,
            enterprise_id: "ent".to_string(),
            product_id: 1,
            name: "a".to_string(),
            price: 1.0,
        };
        store.insert(&mut product()).unwrap();

        let err = store.insert(&mut product()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert_eq!(err.entity(), Some("Product"));
        assert!(err.message().contains("UNIQUE"));
    }

    #[test]
    fn test_update_by_identity() {
        let store = store();
        let mut product = Product {
            id: None,
            enterprise_id: "ent".to_string(),
            product_id: 2,
            name: "old".to_string(),
            price: 3.5,
        };
        store.insert(&mut product).unwrap();
        product.name = "new".to_string();
        store.update(&product).unwrap();

        let found: Vec<Product> = store
            .find(&Filter::new().with(ProductKey::ProductId, 2i64))
            .unwrap();
        assert_eq!(found[0].name, "new");
    }

    #[test]
    fn test_update_missing_row_fails() {
        let product = Product {
            id: Some(41),
            enterprise_id: "ent".to_string(),
            product_id: 2,
            name: "ghost".to_string(),
            price: 0.0,
        };
        let err = store().update(&product).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }

    #[test]
    fn test_adjust_counter_in_place() {
        let store = store();
        let filter = Filter::new().with(CounterKey::UserId, 8i64);
        store
            .insert(&mut Counter { id: None, user_id: 8, count: 10 })
            .unwrap();

        assert_eq!(store.adjust::<Counter>(&filter, CounterAttr::Count, -3).unwrap(), 1);
        let found: Vec<Counter> = store.find(&filter).unwrap();
        assert_eq!(found[0].count, 7);
    }
}
