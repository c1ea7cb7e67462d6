use serde::{Deserialize, Serialize};

use super::{float_value, text_value};
use crate::errors::Result;
use crate::model::{Entity, FieldValue, IdentitySource, Row};

crate::entity_fields! {
    pub enum ProductKey {
        EnterpriseId => "enterprise_id",
        ProductId => "product_id",
    }
}

crate::entity_fields! {
    pub enum ProductAttr {
        Name => "name",
        Price => "price" (round 2),
    }
}

/// Product in an enterprise catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub enterprise_id: String,
    pub product_id: i64,
    pub name: String,
    pub price: f64,
}

impl Entity for Product {
    type Key = ProductKey;
    type Attr = ProductAttr;

    const NAME: &'static str = "Product";
    const TABLE: &'static str = "products";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn key_value(&self, field: ProductKey) -> FieldValue {
        match field {
            ProductKey::EnterpriseId => self.enterprise_id.clone().into(),
            ProductKey::ProductId => self.product_id.into(),
        }
    }

    fn attr_value(&self, field: ProductAttr) -> FieldValue {
        match field {
            ProductAttr::Name => self.name.clone().into(),
            ProductAttr::Price => self.price.into(),
        }
    }

    fn set_attr(&mut self, field: ProductAttr, value: FieldValue) -> Result<()> {
        match field {
            ProductAttr::Name => self.name = text_value(Self::NAME, "name", &value)?,
            ProductAttr::Price => self.price = float_value(Self::NAME, "price", &value)?,
        }
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.id(),
            enterprise_id: row.text("enterprise_id")?,
            product_id: row.int("product_id")?,
            name: row.text("name")?,
            price: row.float("price")?,
        })
    }
}

/// A product doubles as the identity source for records keyed by
/// `(enterprise_id, product_id)`.
impl IdentitySource for Product {
    fn enterprise_id(&self) -> FieldValue {
        self.enterprise_id.clone().into()
    }

    fn uid(&self) -> FieldValue {
        self.product_id.into()
    }
}
