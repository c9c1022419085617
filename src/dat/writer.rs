//! Database image writer for fixtures and tooling.
//!
//! The served database is never written; this only produces files in the
//! layout the loader reads.

use std::io::Write;

use hashbrown::HashMap;

use super::{FixedField, Header, RawRecord, RECORD_LEN};

/// Text fields of a record, before padding.
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub bd_lon: String,
    pub bd_lat: String,
    pub wgs_lon: String,
    pub wgs_lat: String,
    pub radius: String,
    pub scene: String,
    pub accuracy: String,
}

impl RecordFields {
    /// Fields with only the WGS84 position set.
    pub fn at(lat: &str, lng: &str) -> Self {
        Self {
            wgs_lat: lat.to_string(),
            wgs_lon: lng.to_string(),
            ..Default::default()
        }
    }
}

struct PendingRecord {
    min: u32,
    max: u32,
    /// Position of the address text inside the dictionary blob
    dict_pos: u32,
    dict_len: u32,
    fields: RecordFields,
}

/// Builds a database image record by record.
#[derive(Default)]
pub struct DatWriter {
    records: Vec<PendingRecord>,
    dict: Vec<u8>,
    shared: HashMap<String, (u32, u32)>,
}

impl DatWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record with its own dictionary entry, even when the same
    /// address text was written before.
    pub fn push(&mut self, min: u32, max: u32, address: &str, fields: RecordFields) -> &mut Self {
        let (dict_pos, dict_len) = self.append_text(address);
        self.shared
            .entry(address.to_string())
            .or_insert((dict_pos, dict_len));
        self.records.push(PendingRecord {
            min,
            max,
            dict_pos,
            dict_len,
            fields,
        });
        self
    }

    /// Append a record that points at the first dictionary entry holding
    /// `address`, writing one if none exists yet.
    pub fn push_shared(
        &mut self,
        min: u32,
        max: u32,
        address: &str,
        fields: RecordFields,
    ) -> &mut Self {
        let (dict_pos, dict_len) = match self.shared.get(address) {
            Some(&slot) => slot,
            None => {
                let slot = self.append_text(address);
                self.shared.insert(address.to_string(), slot);
                slot
            }
        };
        self.records.push(PendingRecord {
            min,
            max,
            dict_pos,
            dict_len,
            fields,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn append_text(&mut self, text: &str) -> (u32, u32) {
        let pos = self.dict.len() as u32;
        self.dict.extend_from_slice(text.as_bytes());
        (pos, text.len() as u32)
    }

    pub fn header(&self) -> Header {
        let dict_start = (self.records.len() * RECORD_LEN) as u32;
        Header {
            dict_start,
            dict_end: dict_start + self.dict.len() as u32,
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let header = self.header();
        header.write(&mut writer)?;

        for pending in &self.records {
            let record = RawRecord {
                min: pending.min,
                max: pending.max,
                addr_offset: header.dict_start + pending.dict_pos,
                addr_len: pending.dict_len,
                owner_offset: 0,
                owner_len: 0,
                bd_lon: FixedField::from_text(&pending.fields.bd_lon),
                bd_lat: FixedField::from_text(&pending.fields.bd_lat),
                wgs_lon: FixedField::from_text(&pending.fields.wgs_lon),
                wgs_lat: FixedField::from_text(&pending.fields.wgs_lat),
                radius: FixedField::from_text(&pending.fields.radius),
                scene: FixedField::from_text(&pending.fields.scene),
                accuracy: FixedField::from_text(&pending.fields.accuracy),
            };
            writer.write_all(&record.encode())?;
        }

        writer.write_all(&self.dict)?;
        writer.flush()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.records.len() * RECORD_LEN + self.dict.len());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }
}
