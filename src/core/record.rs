use crate::core::{CsvError, DataType, Result, Schema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

const SCHEMA_KEY: &str = "schema";
const LINE_KEY: &str = "line";

/// A decoded row: field name to typed value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub data: HashMap<String, Value>,
    pub metadata: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_data(data: HashMap<String, Value>) -> Self {
        Self {
            data,
            metadata: HashMap::new(),
        }
    }

    pub(crate) fn for_schema(schema: &Schema, line: u64) -> Self {
        let mut record = Self {
            data: HashMap::with_capacity(schema.fields.len()),
            metadata: HashMap::new(),
        };
        record.set_metadata(SCHEMA_KEY.to_string(), schema.name.clone());
        record.set_metadata(LINE_KEY.to_string(), line.to_string());
        record
    }

    /// Builds an untagged record from any value serializing to a map.
    pub fn from_item<T: Serialize>(item: &T) -> Result<Self> {
        match serde_json::to_value(item)? {
            Value::Object(map) => Ok(Self::with_data(map.into_iter().collect())),
            other => Err(CsvError::WriterType {
                item: other.to_string(),
                expected: "a record".to_string(),
            }),
        }
    }

    pub fn set_field(&mut self, name: String, value: Value) {
        self.data.insert(name, value);
    }

    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn set_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Name of the schema this record was decoded with, if any.
    pub fn schema_name(&self) -> Option<&str> {
        self.get_metadata(SCHEMA_KEY)
    }

    pub fn line(&self) -> Option<u64> {
        self.get_metadata(LINE_KEY).and_then(|l| l.parse().ok())
    }

    /// Named construction of a typed record from the decoded values.
    pub fn into_typed<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        let map: Map<String, Value> = self.data.into_iter().collect();
        serde_json::from_value(Value::Object(map))
    }

    /// Returns the first reason this record does not have exactly the shape
    /// of `schema`.
    pub fn validate_against_schema(&self, schema: &Schema) -> std::result::Result<(), String> {
        for field in &schema.fields {
            match self.data.get(&field.name) {
                None if !field.init => {}
                None => return Err(format!("missing field '{}'", field.name)),
                Some(value) if !is_value_compatible_with_type(value, &field.data_type) => {
                    return Err(format!(
                        "field '{}' is not compatible with {}",
                        field.name, field.data_type
                    ));
                }
                Some(_) => {}
            }
        }

        if let Some(extra) = self.data.keys().find(|key| schema.get_field(key).is_none()) {
            return Err(format!("unexpected field '{}'", extra));
        }
        Ok(())
    }
}

fn is_value_compatible_with_type(value: &Value, expected_type: &DataType) -> bool {
    match (value, expected_type) {
        (Value::Null, DataType::Optional(_)) => true,
        (_, DataType::Optional(inner)) => is_value_compatible_with_type(value, inner),
        (Value::String(_), DataType::String) => true,
        (Value::Number(n), DataType::Integer) => n.is_i64(),
        (Value::Number(_), DataType::Float) => true,
        (Value::Bool(_), DataType::Boolean) => true,
        (Value::String(_), DataType::Date | DataType::DateTime) => true,
        (_, DataType::Custom(_)) => true,
        _ => false,
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// One physical row as handed over by the tokenizer, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u64,
    pub entries: Vec<(String, Option<String>)>,
}

impl RawRow {
    pub fn new(line: u64, entries: Vec<(String, Option<String>)>) -> Self {
        Self { line, entries }
    }

    /// Exact key lookup. The outer `Option` tells whether the column exists.
    /// When a header repeats, the last column wins.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .rev()
            .find(|(header, _)| header == key)
            .map(|(_, value)| value.as_deref())
    }

    /// First column whose header, once trimmed, equals `key`.
    pub fn get_trimmed(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(header, _)| header.trim() == key)
            .map(|(_, value)| value.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(header, _)| header.as_str())
    }
}
