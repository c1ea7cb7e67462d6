use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp_value;
use crate::errors::Result;
use crate::model::{Entity, FieldValue, Row};

crate::entity_fields! {
    pub enum AppLoginKey {
        Userid => "userid",
    }
}

crate::entity_fields! {
    pub enum AppLoginAttr {
        CreatedAt => "created_at",
    }
}

/// Login event of an application user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppLogin {
    pub id: Option<i64>,
    pub userid: i64,
    pub created_at: DateTime<Utc>,
}

impl Entity for AppLogin {
    type Key = AppLoginKey;
    type Attr = AppLoginAttr;

    const NAME: &'static str = "AppLogin";
    const TABLE: &'static str = "app_login";
    const TTL_MINUTES: Option<u64> = Some(10);

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn key_value(&self, field: AppLoginKey) -> FieldValue {
        match field {
            AppLoginKey::Userid => self.userid.into(),
        }
    }

    fn attr_value(&self, field: AppLoginAttr) -> FieldValue {
        match field {
            AppLoginAttr::CreatedAt => self.created_at.into(),
        }
    }

    fn set_attr(&mut self, field: AppLoginAttr, value: FieldValue) -> Result<()> {
        match field {
            AppLoginAttr::CreatedAt => {
                self.created_at = timestamp_value(Self::NAME, "created_at", &value)?
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.id(),
            userid: row.int("userid")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}
