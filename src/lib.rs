//! Maps CSV rows into typed records and back.
//!
//! A [`Schema`] describes the record: ordered fields with a [`DataType`],
//! optional defaults and per-field metadata. A [`Reader`] decodes each row
//! against it, resolving columns by name (or through an explicit mapping),
//! coercing values and reporting failures with the offending line number.
//! A [`Writer`] encodes records back into rows under the same header names.
//!
//! ```no_run
//! use serde::Deserialize;
//! use typedcsv::{DataType, Field, Reader, ReaderOptions, Schema};
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//!     email: String,
//!     age: Option<i64>,
//! }
//!
//! let schema = Schema::new(
//!     "User",
//!     vec![
//!         Field::new("name", DataType::String),
//!         Field::new("email", DataType::String),
//!         Field::new("age", DataType::optional(DataType::Integer)).with_default(serde_json::Value::Null),
//!     ],
//! );
//!
//! let mut reader = Reader::from_path("users.csv", schema, ReaderOptions::default())?;
//! reader.map_field("email").to("e-mail");
//! for user in reader.deserialize::<User>() {
//!     let user = user?;
//!     println!("{} <{}>", user.name, user.email);
//! }
//! # Ok::<(), typedcsv::CsvError>(())
//! ```

pub mod codec;
pub mod core;
pub mod reader;
pub mod sink;
pub mod source;
pub mod writer;

pub use crate::codec::{FieldMapper, FieldMapping, RowDecoder};
pub use crate::core::*;
pub use crate::reader::{DeserializeRecords, Reader, ReaderOptions, Records};
pub use crate::writer::{Writer, WriterOptions};
