use serde::{Deserialize, Serialize};

use super::opt_text_value;
use crate::errors::Result;
use crate::model::{Entity, FieldValue, Row};

crate::entity_fields! {
    pub enum AdapterDetailsKey {
        EnterpriseId => "enterprise_id",
        AdapterId => "adapter_id",
        Enable => "enable",
    }
}

crate::entity_fields! {
    pub enum AdapterDetailsAttr {
        Settings => "settings",
    }
}

/// Adapter configuration of an enterprise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDetails {
    pub id: Option<i64>,
    pub enterprise_id: String,
    pub adapter_id: i64,
    pub enable: bool,
    pub settings: Option<String>,
}

impl Entity for AdapterDetails {
    type Key = AdapterDetailsKey;
    type Attr = AdapterDetailsAttr;

    const NAME: &'static str = "AdapterDetails";
    const TABLE: &'static str = "adapter_details";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn key_value(&self, field: AdapterDetailsKey) -> FieldValue {
        match field {
            AdapterDetailsKey::EnterpriseId => self.enterprise_id.clone().into(),
            AdapterDetailsKey::AdapterId => self.adapter_id.into(),
            AdapterDetailsKey::Enable => self.enable.into(),
        }
    }

    fn attr_value(&self, field: AdapterDetailsAttr) -> FieldValue {
        match field {
            AdapterDetailsAttr::Settings => self.settings.clone().into(),
        }
    }

    fn set_attr(&mut self, field: AdapterDetailsAttr, value: FieldValue) -> Result<()> {
        match field {
            AdapterDetailsAttr::Settings => {
                self.settings = opt_text_value(Self::NAME, "settings", &value)?
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.id(),
            enterprise_id: row.text("enterprise_id")?,
            adapter_id: row.int("adapter_id")?,
            enable: row.bool("enable")?,
            settings: row.opt_text("settings")?,
        })
    }
}
