//! Load-phase error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that abort loading a database. None of these occur at query time.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header: {0}")]
    Header(String),

    #[error("dictionary window [{start}, {end}) exceeds file length {file_len}")]
    DictionaryOutOfBounds { start: u64, end: u64, file_len: u64 },

    #[error("record {record}: address slice {offset}+{len} outside dictionary of {dict_len} bytes")]
    AddressOutOfBounds {
        record: usize,
        offset: u32,
        len: u32,
        dict_len: usize,
    },

    #[error("range index not sorted: {violations} records have max below their predecessor (first at record {first})")]
    UnsortedRanges { violations: usize, first: usize },

    #[error("loader task failed: {0}")]
    Task(String),
}
