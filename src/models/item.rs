//! Materialized database entries.

use std::sync::Arc;

use serde::Serialize;

use super::Address;
use crate::dat::RawRecord;

/// A WGS84 position used as a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Outcome of parsing the WGS84 text fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateParse {
    pub lat_ok: bool,
    pub lng_ok: bool,
}

impl CoordinateParse {
    /// True when at least one axis fell back to 0.0.
    pub fn is_fallback(&self) -> bool {
        !(self.lat_ok && self.lng_ok)
    }
}

/// A query-ready record: IP interval, position and shared address metadata.
///
/// Serializes with the keys the HTTP API has always returned; the numeric
/// position and interval bounds are internal.
#[derive(Debug, Clone, Serialize)]
pub struct GeoItem {
    #[serde(flatten)]
    address: Option<Arc<Address>>,

    /// "lat,lng" as stored, WGS84
    #[serde(skip_serializing_if = "String::is_empty")]
    wgs: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    radius: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    scene: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    accuracy: String,

    #[serde(skip)]
    lat: f64,
    #[serde(skip)]
    lng: f64,
    #[serde(skip)]
    min: u32,
    #[serde(skip)]
    max: u32,
}

impl GeoItem {
    /// Convert a raw record and its resolved address into an item.
    ///
    /// Unparseable coordinates become 0.0. The item is still indexed, so
    /// callers should count the fallbacks reported in the returned
    /// [`CoordinateParse`].
    pub fn materialize(raw: &RawRecord, address: Option<Arc<Address>>) -> (Self, CoordinateParse) {
        let wgs_lat = raw.wgs_lat.to_trimmed_string();
        let wgs_lon = raw.wgs_lon.to_trimmed_string();

        let lat = wgs_lat.parse::<f64>().ok();
        let lng = wgs_lon.parse::<f64>().ok();
        let parse = CoordinateParse {
            lat_ok: lat.is_some(),
            lng_ok: lng.is_some(),
        };

        let item = Self {
            address,
            wgs: format!("{},{}", wgs_lat, wgs_lon),
            radius: raw.radius.to_trimmed_string(),
            scene: raw.scene.to_trimmed_string(),
            accuracy: raw.accuracy.to_trimmed_string(),
            lat: lat.unwrap_or(0.0),
            lng: lng.unwrap_or(0.0),
            min: raw.min,
            max: raw.max,
        };

        (item, parse)
    }

    pub fn address(&self) -> Option<&Arc<Address>> {
        self.address.as_ref()
    }

    /// ISO country code, empty when the record has no address.
    pub fn country_code(&self) -> &str {
        self.address.as_deref().map_or("", |a| a.code.as_str())
    }

    pub fn wgs(&self) -> &str {
        &self.wgs
    }

    pub fn radius(&self) -> &str {
        &self.radius
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn accuracy(&self) -> &str {
        &self.accuracy
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether `ip` falls inside the inclusive interval.
    pub fn contains(&self, ip: u32) -> bool {
        self.min <= ip && ip <= self.max
    }
}
