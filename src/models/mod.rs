//! Query-ready data model.

pub mod address;
pub mod interner;
pub mod item;

pub use address::Address;
pub use interner::AddressInterner;
pub use item::{CoordinateParse, GeoItem, GeoPoint};
