use crate::codec::{FieldMapper, RowDecoder};
use crate::core::{CsvError, Dialect, Record, Result, RowSource, Schema};
use crate::source::CsvSource;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Header names to use instead of the first line, which then holds data.
    pub fieldnames: Option<Vec<String>>,
    pub rest_key: Option<String>,
    pub rest_value: Option<String>,
    pub dialect: Dialect,
    /// Reject headers with duplicate column names.
    pub validate_header: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            fieldnames: None,
            rest_key: None,
            rest_value: None,
            dialect: Dialect::default(),
            validate_header: true,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fieldnames<I, S>(mut self, fieldnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fieldnames = Some(fieldnames.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rest_key(mut self, rest_key: impl Into<String>) -> Self {
        self.rest_key = Some(rest_key.into());
        self
    }

    pub fn with_rest_value(mut self, rest_value: impl Into<String>) -> Self {
        self.rest_value = Some(rest_value.into());
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_validate_header(mut self, validate_header: bool) -> Self {
        self.validate_header = validate_header;
        self
    }
}

/// Decodes the rows of a source into records of one schema.
///
/// Field mappings are registered with [`Reader::map_field`] before iteration;
/// iterating consumes the reader, so the mapping is fixed for every row.
pub struct Reader<S> {
    source: S,
    decoder: RowDecoder,
}

impl<R: Read> Reader<CsvSource<R>> {
    pub fn from_reader(rdr: R, schema: Schema, options: ReaderOptions) -> Result<Self> {
        let source = CsvSource::from_reader(rdr, options.dialect, options.fieldnames)?
            .with_rest_key(options.rest_key)
            .with_rest_value(options.rest_value);
        Self::new(source, schema, options.validate_header)
    }
}

impl Reader<CsvSource<File>> {
    pub fn from_path<P: AsRef<Path>>(file_path: P, schema: Schema, options: ReaderOptions) -> Result<Self> {
        let source = CsvSource::from_path(file_path, options.dialect, options.fieldnames)?
            .with_rest_key(options.rest_key)
            .with_rest_value(options.rest_value);
        Self::new(source, schema, options.validate_header)
    }
}

impl<S: RowSource> Reader<S> {
    pub fn new(source: S, schema: Schema, validate_header: bool) -> Result<Self> {
        schema.validate()?;
        if validate_header {
            check_unique_headers(source.headers())?;
        }
        debug!(
            schema = %schema.name,
            columns = source.headers().len(),
            "created reader"
        );

        Ok(Self {
            source,
            decoder: RowDecoder::new(schema),
        })
    }

    pub fn headers(&self) -> &[String] {
        self.source.headers()
    }

    pub fn schema(&self) -> &Schema {
        self.decoder.schema()
    }

    /// Reads `field` from the column named by the returned mapper's `to`.
    pub fn map_field(&mut self, field: &str) -> FieldMapper<'_> {
        if self.decoder.schema().get_field(field).is_none() {
            warn!(field, schema = %self.decoder.schema().name, "mapping a field the schema does not declare");
        }
        self.decoder.map_field(field)
    }

    pub fn records(self) -> Records<S> {
        Records {
            source: self.source,
            decoder: self.decoder,
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self) -> DeserializeRecords<S, T> {
        DeserializeRecords {
            source: self.source,
            decoder: self.decoder,
            _marker: PhantomData,
        }
    }
}

impl<S: RowSource> IntoIterator for Reader<S> {
    type Item = Result<Record>;
    type IntoIter = Records<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.records()
    }
}

fn check_unique_headers(headers: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for header in headers {
        if !seen.insert(header.as_str()) && !duplicates.contains(header) {
            duplicates.push(header.clone());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(CsvError::DuplicateHeader { columns: duplicates })
    }
}

/// Iterator over dynamic records. A failed row yields an `Err` and iteration
/// can continue with the next row.
pub struct Records<S> {
    source: S,
    decoder: RowDecoder,
}

impl<S> Records<S> {
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RowSource> Iterator for Records<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.source.next_row()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(self.decoder.decode(&row))
    }
}

/// Iterator over records built into `T` by named construction.
pub struct DeserializeRecords<S, T> {
    source: S,
    decoder: RowDecoder,
    _marker: PhantomData<fn() -> T>,
}

impl<S, T> DeserializeRecords<S, T> {
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RowSource, T: DeserializeOwned> Iterator for DeserializeRecords<S, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.source.next_row()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(self.decoder.decode_into(&row))
    }
}
