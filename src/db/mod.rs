//! Loaded database: both indexes plus load statistics.
//!
//! Built once at startup and then shared read-only between request handlers.

mod builder;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

use crate::dat::{read_dictionary, Header, RawRecord, RecordReader};
use crate::error::{LoadError, Result};
use crate::index::{RangeIndex, SpatialIndex};
use crate::models::GeoItem;
use builder::IndexBuilder;

/// Records buffered between the decoding thread and the indexer.
pub const PIPELINE_DEPTH: usize = 128;

pub const DEFAULT_COUNTRY_FILTER: &str = "CN";

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Only addresses with this ISO code get a spatial point
    pub country_filter: String,
    /// Fail instead of warn when `max` decreases between records
    pub strict_order: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            country_filter: DEFAULT_COUNTRY_FILTER.to_string(),
            strict_order: false,
        }
    }
}

/// Counters gathered while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Records announced by the header
    pub expected_records: usize,
    pub records: usize,
    pub unique_addresses: usize,
    pub malformed_addresses: usize,
    pub coordinate_fallbacks: usize,
    pub order_violations: usize,
    pub spatial_points: usize,
}

pub struct GeoDatabase {
    range: RangeIndex,
    spatial: SpatialIndex,
    stats: LoadStats,
    country_filter: String,
}

impl GeoDatabase {
    /// Load a database file, decoding records on a blocking thread while
    /// the indexes are built on the caller's task.
    pub async fn load(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Loading database from {}", path.display());

        let (header, dict, reader) = task::spawn_blocking(move || -> Result<_> {
            let mut reader = BufReader::new(File::open(&path)?);
            let header = Header::read(&mut reader)?;
            let dict = read_dictionary(&mut reader, &header)?;
            Ok((header, dict, reader))
        })
        .await
        .map_err(|e| LoadError::Task(e.to_string()))??;
        log_header(&header);

        let (tx, mut rx) = mpsc::channel::<RawRecord>(PIPELINE_DEPTH);
        let producer = task::spawn_blocking(move || {
            for record in RecordReader::new(reader, header.record_count()) {
                if tx.blocking_send(record).is_err() {
                    break;
                }
            }
        });

        let mut builder = IndexBuilder::new(header, dict, &options);
        while let Some(raw) = rx.recv().await {
            builder.push(raw)?;
        }
        producer
            .await
            .map_err(|e| LoadError::Task(e.to_string()))?;

        task::spawn_blocking(move || builder.finish())
            .await
            .map_err(|e| LoadError::Task(e.to_string()))?
    }

    /// Load a database file on the current thread.
    pub fn open(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading database from {}", path.display());
        Self::from_reader(BufReader::new(File::open(path)?), options)
    }

    /// Load from any seekable source in one synchronous pass.
    pub fn from_reader<R: Read + Seek>(mut reader: R, options: LoadOptions) -> Result<Self> {
        let header = Header::read(&mut reader)?;
        let dict = read_dictionary(&mut reader, &header)?;
        log_header(&header);

        let mut builder = IndexBuilder::new(header, dict, &options);
        for raw in RecordReader::new(&mut reader, header.record_count()) {
            builder.push(raw)?;
        }
        builder.finish()
    }

    /// The item whose IP interval contains `ip` (host-order value of the
    /// big-endian address).
    pub fn lookup_ip(&self, ip: u32) -> Option<&GeoItem> {
        self.range.lookup(ip).map(Arc::as_ref)
    }

    /// The indexed item nearest to the position by haversine distance.
    pub fn lookup_nearest(&self, lat: f64, lng: f64) -> Option<&GeoItem> {
        self.spatial.nearest(lat, lng).map(Arc::as_ref)
    }

    /// Up to `k` nearest items with distances in kilometers.
    pub fn nearest_k(&self, lat: f64, lng: f64, k: usize) -> Vec<(&GeoItem, f64)> {
        self.spatial
            .nearest_k(lat, lng, k)
            .into_iter()
            .map(|(item, distance)| (item.as_ref(), distance))
            .collect()
    }

    pub fn range_index(&self) -> &RangeIndex {
        &self.range
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    pub fn country_filter(&self) -> &str {
        &self.country_filter
    }
}

fn log_header(header: &Header) {
    info!(
        "Header: dictStart={} dictEnd={} ({} records, {} byte dictionary)",
        header.dict_start,
        header.dict_end,
        header.record_count(),
        header.dict_len()
    );
}
