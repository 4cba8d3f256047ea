use crate::core::Schema;
use std::collections::HashMap;

/// Field name to external header name. Fields without an entry use their own name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    entries: HashMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, header: impl Into<String>) {
        self.entries.insert(field.into(), header.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    pub fn header_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.get(field).unwrap_or(field)
    }

    /// Field currently emitted under `header`, if any.
    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, mapped)| mapped.as_str() == header)
            .map(|(field, _)| field.as_str())
    }

    /// Header row for `schema`: field names in declared order, remapped.
    pub fn headers(&self, schema: &Schema) -> Vec<String> {
        schema
            .fields
            .iter()
            .map(|field| self.header_for(&field.name).to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pending mapping for one field, completed with [`FieldMapper::to`].
#[must_use = "the mapping is only recorded once `to` is called"]
pub struct FieldMapper<'a> {
    mapping: &'a mut FieldMapping,
    field: String,
}

impl<'a> FieldMapper<'a> {
    pub(crate) fn new(mapping: &'a mut FieldMapping, field: impl Into<String>) -> Self {
        Self {
            mapping,
            field: field.into(),
        }
    }

    pub fn to(self, header: impl Into<String>) {
        self.mapping.insert(self.field, header);
    }
}
