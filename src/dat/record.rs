//! Fixed 108-byte record layout.

use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

pub const RECORD_LEN: usize = 108;
pub const FIELD_LEN: usize = 12;

/// A NUL-padded 12-byte ASCII field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedField([u8; FIELD_LEN]);

impl FixedField {
    pub fn new(bytes: [u8; FIELD_LEN]) -> Self {
        Self(bytes)
    }

    /// Pad `text` with NUL bytes. Text longer than the field is truncated.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [0u8; FIELD_LEN];
        let len = text.len().min(FIELD_LEN);
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_LEN] {
        &self.0
    }

    /// Strip NUL padding and decode as text.
    pub fn to_trimmed_string(&self) -> String {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(FIELD_LEN);
        let end = self.0.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
        String::from_utf8_lossy(&self.0[start..end]).into_owned()
    }

    fn read(buf: &[u8]) -> Self {
        let mut bytes = [0u8; FIELD_LEN];
        bytes.copy_from_slice(&buf[..FIELD_LEN]);
        Self(bytes)
    }
}

/// One undecoded record as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub min: u32,
    pub max: u32,
    pub addr_offset: u32,
    pub addr_len: u32,
    pub owner_offset: u32,
    pub owner_len: u32,
    pub bd_lon: FixedField,
    pub bd_lat: FixedField,
    pub wgs_lon: FixedField,
    pub wgs_lat: FixedField,
    pub radius: FixedField,
    pub scene: FixedField,
    pub accuracy: FixedField,
}

impl RawRecord {
    pub fn decode(buf: &[u8; RECORD_LEN]) -> Self {
        let field = |i: usize| FixedField::read(&buf[24 + i * FIELD_LEN..]);
        Self {
            min: LittleEndian::read_u32(&buf[0..4]),
            max: LittleEndian::read_u32(&buf[4..8]),
            addr_offset: LittleEndian::read_u32(&buf[8..12]),
            addr_len: LittleEndian::read_u32(&buf[12..16]),
            owner_offset: LittleEndian::read_u32(&buf[16..20]),
            owner_len: LittleEndian::read_u32(&buf[20..24]),
            bd_lon: field(0),
            bd_lat: field(1),
            wgs_lon: field(2),
            wgs_lat: field(3),
            radius: field(4),
            scene: field(5),
            accuracy: field(6),
        }
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        LittleEndian::write_u32(&mut buf[0..4], self.min);
        LittleEndian::write_u32(&mut buf[4..8], self.max);
        LittleEndian::write_u32(&mut buf[8..12], self.addr_offset);
        LittleEndian::write_u32(&mut buf[12..16], self.addr_len);
        LittleEndian::write_u32(&mut buf[16..20], self.owner_offset);
        LittleEndian::write_u32(&mut buf[20..24], self.owner_len);

        let fields = [
            &self.bd_lon,
            &self.bd_lat,
            &self.wgs_lon,
            &self.wgs_lat,
            &self.radius,
            &self.scene,
            &self.accuracy,
        ];
        for (i, field) in fields.iter().enumerate() {
            let at = 24 + i * FIELD_LEN;
            buf[at..at + FIELD_LEN].copy_from_slice(field.as_bytes());
        }
        buf
    }
}

/// Sequential record decoder over the record region.
///
/// Yields at most `count` records. A short read ends the stream and the
/// partial trailing record is dropped.
pub struct RecordReader<R> {
    reader: R,
    remaining: usize,
    read: usize,
}

impl<R: Read> RecordReader<R> {
    /// `reader` must be positioned at the first record.
    pub fn new(reader: R, count: usize) -> Self {
        Self {
            reader,
            remaining: count,
            read: 0,
        }
    }

    /// Records decoded so far.
    pub fn records_read(&self) -> usize {
        self.read
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        if self.remaining == 0 {
            return None;
        }

        let mut buf = [0u8; RECORD_LEN];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.remaining -= 1;
                self.read += 1;
                Some(RawRecord::decode(&buf))
            }
            Err(e) => {
                if e.kind() == ErrorKind::UnexpectedEof {
                    warn!(
                        "Record region truncated after {} records ({} missing)",
                        self.read, self.remaining
                    );
                } else {
                    warn!("Record read failed after {} records: {}", self.read, e);
                }
                self.remaining = 0;
                None
            }
        }
    }
}
