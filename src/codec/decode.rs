use crate::codec::coerce::{FieldContext, coerce};
use crate::codec::options::OptionResolver;
use crate::codec::resolve::{Resolved, resolve};
use crate::codec::{FieldMapper, FieldMapping};
use crate::core::{CsvError, DataType, FieldError, RawRow, Record, Result, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// Decodes raw rows against one schema and one field mapping.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    schema: Schema,
    mapping: FieldMapping,
}

impl RowDecoder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            mapping: FieldMapping::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn map_field(&mut self, field: &str) -> FieldMapper<'_> {
        FieldMapper::new(&mut self.mapping, field)
    }

    pub fn decode(&self, row: &RawRow) -> Result<Record> {
        decode_row(&self.schema, &self.mapping, row)
    }

    pub fn decode_into<T: DeserializeOwned>(&self, row: &RawRow) -> Result<T> {
        let record = self.decode(row)?;
        record.into_typed().map_err(|e| CsvError::Row {
            line: row.line,
            source: FieldError::Construction(e),
        })
    }
}

/// Decodes one row. The whole row fails on the first field error, which is
/// reported with the row's line number.
pub fn decode_row(schema: &Schema, mapping: &FieldMapping, row: &RawRow) -> Result<Record> {
    match decode_fields(schema, mapping, row) {
        Ok(record) => {
            trace!(line = row.line, schema = %schema.name, "decoded row");
            Ok(record)
        }
        Err(source) => {
            debug!(line = row.line, error = %source, "rejected row");
            Err(CsvError::Row {
                line: row.line,
                source,
            })
        }
    }
}

fn decode_fields(
    schema: &Schema,
    mapping: &FieldMapping,
    row: &RawRow,
) -> std::result::Result<Record, FieldError> {
    let options = OptionResolver::new(&schema.options);
    let mut record = Record::for_schema(schema, row.line);

    for field in &schema.fields {
        if !field.init {
            if let Some(default) = &field.default {
                record.set_field(field.name.clone(), default.value());
            }
            continue;
        }

        let date_format = options.date_format(field);
        let ctx = FieldContext::new(field)
            .with_date_format(date_format.as_deref())
            .with_accept_whitespaces(options.accepts_whitespaces(field));
        let target = field.data_type.effective();

        let value = match resolve(field, row, mapping)? {
            Resolved::Default(Value::Null) => Value::Null,
            // String defaults of non-string fields still go through coercion.
            Resolved::Default(Value::String(raw)) if *target != DataType::String => {
                coerce(target, &Value::String(raw), &ctx)?
            }
            Resolved::Default(default) => default,
            Resolved::Raw(raw) => coerce(target, &Value::String(raw.to_string()), &ctx)?,
        };
        record.set_field(field.name.clone(), value);
    }

    Ok(record)
}
