use crate::core::CsvError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named CSV formatting conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Comma separated, CRLF line endings.
    #[default]
    Excel,
    /// Tab separated, CRLF line endings.
    ExcelTab,
    /// Comma separated, LF line endings, every field quoted.
    Unix,
}

impl Dialect {
    pub const fn delimiter(&self) -> u8 {
        match self {
            Dialect::ExcelTab => b'\t',
            Dialect::Excel | Dialect::Unix => b',',
        }
    }

    pub fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(self.delimiter()).flexible(true);
        builder
    }

    pub fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter()).flexible(true);
        match self {
            Dialect::Excel | Dialect::ExcelTab => {
                builder.terminator(csv::Terminator::CRLF);
            }
            Dialect::Unix => {
                builder
                    .terminator(csv::Terminator::Any(b'\n'))
                    .quote_style(csv::QuoteStyle::Always);
            }
        }
        builder
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::Excel => "excel",
            Dialect::ExcelTab => "excel-tab",
            Dialect::Unix => "unix",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excel" => Ok(Dialect::Excel),
            "excel-tab" => Ok(Dialect::ExcelTab),
            "unix" => Ok(Dialect::Unix),
            other => Err(CsvError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}
