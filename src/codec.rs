//! Row decoding and record encoding.

pub mod coerce;
pub mod decode;
pub mod encode;
pub mod mapping;
pub mod options;
pub mod resolve;

pub use self::decode::{RowDecoder, decode_row};
pub use self::encode::{encode, encode_item, header_row};
pub use self::mapping::{FieldMapper, FieldMapping};
pub use self::options::OptionResolver;
