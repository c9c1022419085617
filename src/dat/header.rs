//! Header and dictionary decoding.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use super::RECORD_LEN;
use crate::error::{LoadError, Result};

/// Size of the header; records start right after it.
pub const HEADER_LEN: u64 = 8;

/// The two offsets stored at the start of every database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub dict_start: u32,
    pub dict_end: u32,
}

impl Header {
    /// Decode the header. A short or failed read is fatal.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let dict_start = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| LoadError::Header(format!("cannot read dictStart: {}", e)))?;
        let dict_end = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| LoadError::Header(format!("cannot read dictEnd: {}", e)))?;

        if dict_end < dict_start {
            return Err(LoadError::Header(format!(
                "dictEnd {} precedes dictStart {}",
                dict_end, dict_start
            )));
        }

        Ok(Self {
            dict_start,
            dict_end,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<LittleEndian>(self.dict_start)?;
        writer.write_u32::<LittleEndian>(self.dict_end)
    }

    /// Number of whole records in the record region.
    pub fn record_count(&self) -> usize {
        self.dict_start as usize / RECORD_LEN
    }

    pub fn dict_len(&self) -> usize {
        (self.dict_end - self.dict_start) as usize
    }

    /// Absolute file position of the dictionary blob.
    pub fn dict_position(&self) -> u64 {
        HEADER_LEN + u64::from(self.dict_start)
    }
}

/// Load the dictionary blob into memory, then rewind to the first record.
pub fn read_dictionary<R: Read + Seek>(reader: &mut R, header: &Header) -> Result<Vec<u8>> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let start = header.dict_position();
    let end = start + header.dict_len() as u64;

    if end > file_len {
        return Err(LoadError::DictionaryOutOfBounds {
            start,
            end,
            file_len,
        });
    }

    reader.seek(SeekFrom::Start(start))?;
    let mut dict = vec![0u8; header.dict_len()];
    reader.read_exact(&mut dict)?;
    debug!("Loaded {} byte dictionary at offset {}", dict.len(), start);

    reader.seek(SeekFrom::Start(HEADER_LEN))?;
    Ok(dict)
}
