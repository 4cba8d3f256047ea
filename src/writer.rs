use crate::codec::{FieldMapper, FieldMapping, encode, encode_item, header_row};
use crate::core::{Dialect, Record, Result, RowSink, Schema};
use crate::sink::CsvSink;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    pub dialect: Dialect,
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Writes records of one schema, one row at a time.
pub struct Writer<K> {
    sink: K,
    schema: Schema,
    mapping: FieldMapping,
}

impl<W: Write> Writer<CsvSink<W>> {
    pub fn from_writer(wtr: W, schema: Schema, options: WriterOptions) -> Result<Self> {
        Self::new(CsvSink::from_writer(wtr, options.dialect), schema)
    }

    /// Flushes and hands the underlying writer back.
    pub fn into_inner(self) -> Result<W> {
        self.sink.into_inner()
    }
}

impl Writer<CsvSink<File>> {
    pub fn from_path<P: AsRef<Path>>(file_path: P, schema: Schema, options: WriterOptions) -> Result<Self> {
        let sink = CsvSink::from_path(file_path, options.dialect)?;
        Self::new(sink, schema)
    }
}

impl<K: RowSink> Writer<K> {
    pub fn new(sink: K, schema: Schema) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            sink,
            schema,
            mapping: FieldMapping::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Emits `property` under the header given to the returned mapper's `to`.
    pub fn map_property(&mut self, property: &str) -> FieldMapper<'_> {
        if self.schema.get_field(property).is_none() {
            warn!(property, schema = %self.schema.name, "mapping a property the schema does not declare");
        }
        FieldMapper::new(&mut self.mapping, property)
    }

    pub fn headers(&self) -> Vec<String> {
        header_row(&self.schema, &self.mapping)
    }

    /// Writes the header (unless skipped) and one row per item. Stops at the
    /// first item that does not match the schema.
    pub fn write<I, T>(&mut self, items: I, skip_header: bool) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.write_header(skip_header)?;
        let mut written = 0usize;
        for item in items {
            let row = encode_item(&self.schema, &item)?;
            self.sink.write_row(&row)?;
            written += 1;
        }
        debug!(schema = %self.schema.name, rows = written, "wrote rows");
        self.sink.flush()
    }

    /// Same as [`Writer::write`] for dynamic records.
    pub fn write_records<I>(&mut self, records: I, skip_header: bool) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        self.write_header(skip_header)?;
        let mut written = 0usize;
        for record in records {
            let row = encode(&self.schema, &record)?;
            self.sink.write_row(&row)?;
            written += 1;
        }
        debug!(schema = %self.schema.name, rows = written, "wrote records");
        self.sink.flush()
    }

    fn write_header(&mut self, skip_header: bool) -> Result<()> {
        if skip_header {
            return Ok(());
        }
        for field in &self.schema.fields {
            if self.mapping.get(&field.name).is_some() {
                continue;
            }
            if let Some(other) = self.mapping.field_for(&field.name) {
                warn!(header = %field.name, field = other, "header is emitted by two fields");
            }
        }
        let headers = self.headers();
        self.sink.write_row(&headers)
    }
}
