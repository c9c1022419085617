//! Single ordered pass from raw records to both indexes.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{GeoDatabase, LoadOptions, LoadStats};
use crate::dat::{Header, RawRecord};
use crate::error::{LoadError, Result};
use crate::index::{RangeIndex, SpatialIndex};
use crate::models::{AddressInterner, GeoItem};

pub(crate) struct IndexBuilder {
    header: Header,
    dict: Vec<u8>,
    interner: AddressInterner,
    items: Vec<Arc<GeoItem>>,
    points: Vec<Arc<GeoItem>>,
    country_filter: String,
    strict_order: bool,
    coordinate_fallbacks: usize,
    started: Instant,
}

impl IndexBuilder {
    pub(crate) fn new(header: Header, dict: Vec<u8>, options: &LoadOptions) -> Self {
        Self {
            header,
            dict,
            interner: AddressInterner::new(),
            items: Vec::with_capacity(header.record_count()),
            points: Vec::new(),
            country_filter: options.country_filter.clone(),
            strict_order: options.strict_order,
            coordinate_fallbacks: 0,
            started: Instant::now(),
        }
    }

    /// Materialize one record. Records must arrive in file order.
    pub(crate) fn push(&mut self, raw: RawRecord) -> Result<()> {
        let record = self.items.len();
        let key = raw.addr_offset;

        // Only the first record at an offset contributes a spatial point.
        let first_seen = !self.interner.contains(key);

        let text = address_slice(&self.dict, self.header.dict_start, record, &raw)?;
        let address = self.interner.resolve(key, text);

        let (item, parse) = GeoItem::materialize(&raw, address);
        if parse.is_fallback() {
            self.coordinate_fallbacks += 1;
            debug!(
                "Record {}: unparseable coordinates {:?}, using 0.0",
                record,
                item.wgs()
            );
        }

        let item = Arc::new(item);
        let matches_filter = item
            .address()
            .is_some_and(|a| a.code == self.country_filter);
        if first_seen && matches_filter {
            self.points.push(Arc::clone(&item));
        }

        self.items.push(item);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<GeoDatabase> {
        let expected = self.header.record_count();
        let loaded = self.items.len();
        if loaded < expected {
            warn!("Loaded {} of {} records", loaded, expected);
        }

        let range = RangeIndex::new(self.items);
        let order_violations = match range.order_violations() {
            Some(v) if self.strict_order => {
                return Err(LoadError::UnsortedRanges {
                    violations: v.count,
                    first: v.first,
                })
            }
            Some(v) => {
                warn!(
                    "{} records have a max below their predecessor (first at record {}); IP lookups near them may be wrong",
                    v.count, v.first
                );
                v.count
            }
            None => 0,
        };

        if self.coordinate_fallbacks > 0 {
            warn!(
                "{} records had unparseable coordinates and were placed at 0,0",
                self.coordinate_fallbacks
            );
        }
        if self.interner.malformed() > 0 {
            warn!(
                "{} records reference malformed dictionary entries",
                self.interner.malformed()
            );
        }

        info!(
            "{:?} loaded {} records, {} unique {} points",
            self.started.elapsed(),
            loaded,
            self.points.len(),
            self.country_filter
        );

        let spatial = SpatialIndex::build(self.points);

        let stats = LoadStats {
            expected_records: expected,
            records: loaded,
            unique_addresses: self.interner.len(),
            malformed_addresses: self.interner.malformed(),
            coordinate_fallbacks: self.coordinate_fallbacks,
            order_violations,
            spatial_points: spatial.len(),
        };

        Ok(GeoDatabase {
            range,
            spatial,
            stats,
            country_filter: self.country_filter,
        })
    }
}

/// The dictionary bytes a record points at.
fn address_slice<'a>(
    dict: &'a [u8],
    dict_start: u32,
    record: usize,
    raw: &RawRecord,
) -> Result<&'a [u8]> {
    let out_of_bounds = || LoadError::AddressOutOfBounds {
        record,
        offset: raw.addr_offset,
        len: raw.addr_len,
        dict_len: dict.len(),
    };

    let start = raw
        .addr_offset
        .checked_sub(dict_start)
        .ok_or_else(out_of_bounds)? as usize;
    let end = start
        .checked_add(raw.addr_len as usize)
        .ok_or_else(out_of_bounds)?;

    dict.get(start..end).ok_or_else(out_of_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_slice_translates_offset() {
        let dict = b"xxAS|CN|||||";
        let raw = RawRecord {
            addr_offset: 1002,
            addr_len: 10,
            ..Default::default()
        };
        assert_eq!(address_slice(dict, 1000, 0, &raw).unwrap(), b"AS|CN|||||");
    }

    #[test]
    fn test_address_slice_before_dictionary() {
        let raw = RawRecord {
            addr_offset: 10,
            addr_len: 1,
            ..Default::default()
        };
        assert!(matches!(
            address_slice(b"abc", 100, 4, &raw),
            Err(LoadError::AddressOutOfBounds { record: 4, .. })
        ));
    }

    #[test]
    fn test_address_slice_past_end() {
        let raw = RawRecord {
            addr_offset: 101,
            addr_len: 3,
            ..Default::default()
        };
        assert!(address_slice(b"abc", 100, 0, &raw).is_err());
    }
}
