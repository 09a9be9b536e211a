use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StorageError};

/// One row as seen by a backend: column name → JSON value
pub type Record = Map<String, Value>;

/// Conjunction of column equality tests
///
/// An empty filter matches every row. A `null` expected value matches rows
/// where the column is absent or null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-column filter
    pub fn by(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().eq(column, value)
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.conditions
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            match record.get(column) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            }
        })
    }
}

/// Serialize an entity into a backend record
pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Internal(format!(
            "Expected an object when building a record, got {}",
            other
        ))),
    }
}

/// Deserialize a backend record back into an entity
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
