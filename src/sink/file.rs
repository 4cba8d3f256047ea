use crate::core::{Dialect, Result, RowSink};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Row sink backed by the `csv` writer.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn from_path<P: AsRef<Path>>(file_path: P, dialect: Dialect) -> Result<Self> {
        let file = File::create(file_path.as_ref())?;
        Ok(Self::from_writer(file, dialect))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(wtr: W, dialect: Dialect) -> Self {
        Self {
            writer: dialect.writer_builder().from_writer(wtr),
        }
    }

    /// Flushes pending output and hands the underlying writer back.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, values: &[String]) -> Result<()> {
        self.writer.write_record(values)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
