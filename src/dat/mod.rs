//! Fixed binary layout of the database file.
//!
//! ```text
//! 0..4                 dictStart  (u32 LE, relative to the data origin)
//! 4..8                 dictEnd    (u32 LE, relative to the data origin)
//! 8..8+dictStart       records, 108 bytes each
//! 8+dictStart..8+dictEnd   dictionary blob of `a|b|c|d|e|f|g` strings
//! ```
//!
//! The data origin is the first byte after the header. Record address
//! offsets share that origin, so subtracting `dictStart` yields a position
//! inside the dictionary blob.

mod header;
mod record;
mod writer;

pub use header::{read_dictionary, Header, HEADER_LEN};
pub use record::{FixedField, RawRecord, RecordReader, FIELD_LEN, RECORD_LEN};
pub use writer::{DatWriter, RecordFields};
