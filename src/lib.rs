//! ipix - IPv4 region lookup and nearest-place search over a static binary database.
//!
//! The library loads the database once, builds a range index over IP intervals
//! and a k-d tree over de-duplicated coordinates, and serves both queries from
//! immutable state. The `query` binary exposes them over HTTP.

pub mod api;
pub mod config;
pub mod dat;
pub mod db;
pub mod error;
pub mod index;
pub mod models;

pub use db::{GeoDatabase, LoadOptions, LoadStats};
pub use error::{LoadError, Result};
pub use models::{Address, GeoItem};
