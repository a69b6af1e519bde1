//! `.resources` container reader implementation
//!
//! This crate parses the binary resource container format: a header naming
//! the reader, a table of user type names, a hash-sorted name table and a
//! data section of type-coded values. Records are decoded lazily, one at a
//! time, from any `Read + Seek` source. A matching writer produces version 2
//! containers.

pub mod encoding;
pub mod error;
pub mod header;
pub mod reader;
pub mod stream;
pub mod value;
pub mod writer;

pub use encoding::hash_name;
pub use error::{FormatError, FormatResult};
pub use header::{Header, is_resources};
pub use reader::{RawRecord, Records, ResourceReader};
pub use value::{DateTime, DateTimeKind, Decimal, ResourceValue, TimeSpan, TypeCode};
pub use writer::ResourceWriter;
