use crate::core::{RawRow, Result};

/// Tokenizer side of a reader: yields header-keyed raw rows one at a time.
pub trait RowSource {
    fn headers(&self) -> &[String];

    fn next_row(&mut self) -> Option<Result<RawRow>>;
}

/// Serializer side of a writer: accepts one ordered row of strings at a time.
pub trait RowSink {
    fn write_row(&mut self, values: &[String]) -> Result<()>;

    fn write_batch(&mut self, rows: &[Vec<String>]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
