pub mod file;

pub use self::file::CsvSink;
