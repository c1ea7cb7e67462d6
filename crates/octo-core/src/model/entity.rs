use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use super::field::Field;
use super::filter::{Changes, Filter};
use super::row::Row;
use super::value::FieldValue;
use crate::errors::Result;

/// Column name that marks an enterprise-scoped key
pub const ENTERPRISE_ID_COLUMN: &str = "enterprise_id";

/// A typed record kind served through the cached access layer
///
/// Identity for caching purposes is defined by the key fields a caller puts
/// in a filter; `id` is the store-generated identity used for updates.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Natural-key fields, usable in filters
    type Key: Field;
    /// Mutable payload fields, usable in changes
    type Attr: Field;

    /// Entity name, first token of every cache key
    const NAME: &'static str;
    /// Backing table in the relational store
    const TABLE: &'static str;
    /// Cache TTL in minutes; `None` selects the default
    const TTL_MINUTES: Option<u64> = None;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    fn key_value(&self, field: Self::Key) -> FieldValue;

    fn attr_value(&self, field: Self::Attr) -> FieldValue;

    /// Assign one attribute. Fails with `InvalidInput` on a value of the wrong type.
    fn set_attr(&mut self, field: Self::Attr, value: FieldValue) -> Result<()>;

    /// Materialize a record from store columns
    fn from_row(row: &Row) -> Result<Self>;

    /// Key columns followed by attribute columns
    fn columns() -> Vec<&'static str> {
        Self::Key::ALL
            .iter()
            .map(|f| f.column())
            .chain(Self::Attr::ALL.iter().map(|f| f.column()))
            .collect()
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new(self.id());
        for field in Self::Key::ALL {
            row.push(field.column(), self.key_value(*field));
        }
        for field in Self::Attr::ALL {
            row.push(field.column(), self.attr_value(*field));
        }
        row
    }

    /// Construct an unsaved record from `filter ∪ changes`
    fn build(filter: &Filter<Self::Key>, changes: &Changes<Self::Attr>) -> Result<Self> {
        let mut row = Row::new(None);
        for (field, value) in filter.iter() {
            row.push(field.column(), value.clone());
        }
        for (field, value) in changes.iter() {
            row.push(field.column(), value.clone());
        }
        Self::from_row(&row)
    }
}

/// Entity whose rows are counters adjusted in place by the store
pub trait CounterEntity: Entity {
    /// The attribute incremented by `find_or_create_or_adjust`
    const COUNTER: Self::Attr;
}

/// Source of an enterprise-scoped identity for `recreate_from`
pub trait IdentitySource {
    fn enterprise_id(&self) -> FieldValue;

    fn uid(&self) -> FieldValue;
}
