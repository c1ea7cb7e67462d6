//! Representative entities of the analytics schema
//!
//! Each one mirrors a table created by the `octo-store` migrations.

mod adapter_details;
mod app_login;
mod counter;
mod product;

pub use adapter_details::{AdapterDetails, AdapterDetailsAttr, AdapterDetailsKey};
pub use app_login::{AppLogin, AppLoginAttr, AppLoginKey};
pub use counter::{Counter, CounterAttr, CounterKey};
pub use product::{Product, ProductAttr, ProductKey};

use chrono::{DateTime, Utc};

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::FieldValue;

fn mismatch(entity: &str, column: &str, expected: &str, value: &FieldValue) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("set_attr")
        .with_entity(entity)
        .with_message(format!(
            "column '{}' expects {}, got {}",
            column,
            expected,
            value.type_name()
        ))
}

fn int_value(entity: &str, column: &str, value: &FieldValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| mismatch(entity, column, "int", value))
}

fn float_value(entity: &str, column: &str, value: &FieldValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| mismatch(entity, column, "float", value))
}

fn text_value(entity: &str, column: &str, value: &FieldValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(entity, column, "text", value))
}

fn opt_text_value(entity: &str, column: &str, value: &FieldValue) -> Result<Option<String>> {
    match value {
        FieldValue::Null => Ok(None),
        other => text_value(entity, column, other).map(Some),
    }
}

fn timestamp_value(entity: &str, column: &str, value: &FieldValue) -> Result<DateTime<Utc>> {
    value
        .as_timestamp()
        .ok_or_else(|| mismatch(entity, column, "timestamp", value))
}
