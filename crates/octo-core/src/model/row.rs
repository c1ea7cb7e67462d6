use chrono::{DateTime, Utc};

use super::value::FieldValue;
use crate::errors::{ExError, ExErrorKind, Result};

/// Column values of one stored record, plus its generated identity
///
/// This is the shape records take on their way into and out of a
/// `RecordStore`. Typed accessors turn a missing or mistyped column into an
/// `InvalidInput` error naming the column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    id: Option<i64>,
    values: Vec<(&'static str, FieldValue)>,
}

impl Row {
    pub fn new(id: Option<i64>) -> Self {
        Self {
            id,
            values: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn push(&mut self, column: &'static str, value: FieldValue) {
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn values(&self) -> &[(&'static str, FieldValue)] {
        &self.values
    }

    pub fn int(&self, column: &str) -> Result<i64> {
        let value = self.require(column)?;
        value.as_i64().ok_or_else(|| mistyped(column, "int", value))
    }

    /// Integer column that falls back to `default` when absent or null
    pub fn int_or(&self, column: &str, default: i64) -> Result<i64> {
        match self.get(column) {
            None | Some(FieldValue::Null) => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| mistyped(column, "int", value)),
        }
    }

    pub fn float(&self, column: &str) -> Result<f64> {
        let value = self.require(column)?;
        value.as_f64().ok_or_else(|| mistyped(column, "float", value))
    }

    pub fn bool(&self, column: &str) -> Result<bool> {
        let value = self.require(column)?;
        value.as_bool().ok_or_else(|| mistyped(column, "bool", value))
    }

    pub fn text(&self, column: &str) -> Result<String> {
        let value = self.require(column)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mistyped(column, "text", value))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.get(column) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| mistyped(column, "text", value)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>> {
        let value = self.require(column)?;
        value
            .as_timestamp()
            .ok_or_else(|| mistyped(column, "timestamp", value))
    }

    fn require(&self, column: &str) -> Result<&FieldValue> {
        match self.get(column) {
            Some(FieldValue::Null) | None => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("read_row")
                .with_message(format!("missing value for column '{}'", column))),
            Some(value) => Ok(value),
        }
    }
}

fn mistyped(column: &str, expected: &str, actual: &FieldValue) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("read_row")
        .with_message(format!(
            "column '{}' expects {}, got {}",
            column,
            expected,
            actual.type_name()
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut row = Row::new(Some(7));
        row.push("count", FieldValue::Int(3));
        row.push("enable", FieldValue::Int(1));
        row.push("name", FieldValue::from("widget"));

        assert_eq!(row.id(), Some(7));
        assert_eq!(row.int("count").unwrap(), 3);
        assert!(row.bool("enable").unwrap());
        assert_eq!(row.text("name").unwrap(), "widget");
        assert_eq!(row.opt_text("settings").unwrap(), None);
        assert_eq!(row.int_or("missing", 9).unwrap(), 9);
    }

    #[test]
    fn test_missing_and_mistyped_columns() {
        let mut row = Row::new(None);
        row.push("name", FieldValue::Int(1));

        let err = row.int("count").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.message().contains("count"));

        let err = row.text("name").unwrap_err();
        assert!(err.message().contains("expects text"));
    }
}
