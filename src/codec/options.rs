//! Per-field option lookup.
//!
//! A field's own metadata wins; otherwise the schema-wide annotation of the
//! same name applies.

use crate::core::{ACCEPT_WHITESPACES, DATE_FORMAT, Field, SchemaOptions};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct OptionResolver<'a> {
    schema: &'a SchemaOptions,
}

impl<'a> OptionResolver<'a> {
    pub fn new(schema: &'a SchemaOptions) -> Self {
        Self { schema }
    }

    pub fn get(&self, field: &Field, key: &str) -> Option<Value> {
        if let Some(value) = field.metadata.get(key) {
            return Some(value.clone());
        }
        match key {
            DATE_FORMAT => self.schema.date_format.clone().map(Value::String),
            ACCEPT_WHITESPACES => self.schema.accept_whitespaces.map(Value::Bool),
            _ => None,
        }
    }

    pub fn date_format(&self, field: &Field) -> Option<String> {
        match self.get(field, DATE_FORMAT)? {
            Value::String(format) => Some(format),
            _ => None,
        }
    }

    pub fn accepts_whitespaces(&self, field: &Field) -> bool {
        self.get(field, ACCEPT_WHITESPACES)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}
