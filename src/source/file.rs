use crate::core::{Dialect, RawRow, Result, RowSource};
use csv::StringRecord;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// A run of consecutive line terminator bytes in the input. `\r\n` counts
/// as one line break, as do lone `\r` and `\n`.
#[derive(Debug)]
struct TerminatorRun {
    start: u64,
    end: u64,
    newlines: u64,
}

/// Records where line terminators occur in the bytes handed to the
/// tokenizer, so a record's byte offset can be turned into a 1-based line
/// number whatever the line ending style.
struct LineTracker<R> {
    inner: R,
    offset: u64,
    runs: VecDeque<TerminatorRun>,
    passed_newlines: u64,
    after_cr: bool,
}

impl<R> LineTracker<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            runs: VecDeque::new(),
            passed_newlines: 0,
            after_cr: false,
        }
    }

    /// Line on which the record starting at `byte` has its content. A record
    /// may start on the terminator that ended the previous one, so the run at
    /// `byte` counts as passed too. Offsets must not decrease between calls.
    fn line_at(&mut self, byte: u64) -> u64 {
        while let Some(run) = self.runs.front() {
            if run.start > byte {
                break;
            }
            self.passed_newlines += run.newlines;
            self.runs.pop_front();
        }
        self.passed_newlines + 1
    }

    fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for (i, byte) in buf[..n].iter().enumerate() {
            let after_cr = std::mem::replace(&mut self.after_cr, *byte == b'\r');
            if *byte != b'\n' && *byte != b'\r' {
                continue;
            }
            let pos = self.offset + i as u64;
            let newline = u64::from(!(*byte == b'\n' && after_cr));
            match self.runs.back_mut() {
                Some(run) if run.end == pos => {
                    run.end += 1;
                    run.newlines += newline;
                }
                _ => self.runs.push_back(TerminatorRun {
                    start: pos,
                    end: pos + 1,
                    newlines: newline,
                }),
            }
        }
        self.offset += n as u64;
        Ok(n)
    }
}

/// Row source backed by the `csv` tokenizer.
pub struct CsvSource<R> {
    reader: csv::Reader<LineTracker<R>>,
    headers: Vec<String>,
    delimiter: u8,
    rest_key: Option<String>,
    rest_value: Option<String>,
    record: StringRecord,
}

impl CsvSource<File> {
    pub fn from_path<P: AsRef<Path>>(
        file_path: P,
        dialect: Dialect,
        fieldnames: Option<Vec<String>>,
    ) -> Result<Self> {
        let file = File::open(file_path.as_ref())?;
        Self::from_reader(file, dialect, fieldnames)
    }
}

impl<R: Read> CsvSource<R> {
    /// Reads the header line unless `fieldnames` is given, in which case the
    /// first line is data.
    pub fn from_reader(rdr: R, dialect: Dialect, fieldnames: Option<Vec<String>>) -> Result<Self> {
        let has_header = fieldnames.is_none();
        let mut reader = dialect
            .reader_builder()
            .has_headers(has_header)
            .from_reader(LineTracker::new(rdr));

        let headers = match fieldnames {
            Some(names) => names,
            None => reader.headers()?.iter().map(str::to_string).collect(),
        };
        debug!(dialect = %dialect, columns = headers.len(), "opened csv source");

        Ok(Self {
            reader,
            headers,
            delimiter: dialect.delimiter(),
            rest_key: None,
            rest_value: None,
            record: StringRecord::new(),
        })
    }

    /// Extra values of long rows are joined under this key.
    pub fn with_rest_key(mut self, rest_key: Option<String>) -> Self {
        self.rest_key = rest_key;
        self
    }

    /// Value given to the missing trailing columns of short rows.
    pub fn with_rest_value(mut self, rest_value: Option<String>) -> Self {
        self.rest_value = rest_value;
        self
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }

    fn build_row(&self, line: u64) -> RawRow {
        let mut entries: Vec<(String, Option<String>)> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = self
                    .record
                    .get(i)
                    .map(str::to_string)
                    .or_else(|| self.rest_value.clone());
                (header.clone(), value)
            })
            .collect();

        if self.record.len() > self.headers.len() {
            if let Some(rest_key) = &self.rest_key {
                let delimiter = (self.delimiter as char).to_string();
                let rest: Vec<&str> = self.record.iter().skip(self.headers.len()).collect();
                entries.push((rest_key.clone(), Some(rest.join(&delimiter))));
            }
        }

        RawRow::new(line, entries)
    }
}

impl<R: Read> RowSource for CsvSource<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Option<Result<RawRow>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let start = self.record.position().map_or(0, |p| p.byte());
                let line = self.reader.get_mut().line_at(start);
                Some(Ok(self.build_row(line)))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}
