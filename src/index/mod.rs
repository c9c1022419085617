//! Read-only query structures built once at load time.

pub mod geodesic;
pub mod kdtree;
pub mod range;
pub mod spatial;

pub use kdtree::{KdPoint, KdTree, Neighbor};
pub use range::RangeIndex;
pub use spatial::SpatialIndex;
