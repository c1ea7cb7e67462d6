use serde::{Deserialize, Serialize};

use super::int_value;
use crate::errors::Result;
use crate::model::{CounterEntity, Entity, FieldValue, Row};

crate::entity_fields! {
    pub enum CounterKey {
        UserId => "user_id",
    }
}

crate::entity_fields! {
    pub enum CounterAttr {
        Count => "count",
    }
}

/// Per-user counter row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub id: Option<i64>,
    pub user_id: i64,
    pub count: i64,
}

impl Entity for Counter {
    type Key = CounterKey;
    type Attr = CounterAttr;

    const NAME: &'static str = "Counter";
    const TABLE: &'static str = "counters";
    const TTL_MINUTES: Option<u64> = Some(5);

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn key_value(&self, field: CounterKey) -> FieldValue {
        match field {
            CounterKey::UserId => self.user_id.into(),
        }
    }

    fn attr_value(&self, field: CounterAttr) -> FieldValue {
        match field {
            CounterAttr::Count => self.count.into(),
        }
    }

    fn set_attr(&mut self, field: CounterAttr, value: FieldValue) -> Result<()> {
        match field {
            CounterAttr::Count => self.count = int_value(Self::NAME, "count", &value)?,
        }
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.id(),
            user_id: row.int("user_id")?,
            count: row.int_or("count", 0)?,
        })
    }
}

impl CounterEntity for Counter {
    const COUNTER: CounterAttr = CounterAttr::Count;
}
