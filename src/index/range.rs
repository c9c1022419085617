//! IPv4 interval lookup by binary search.

use std::sync::Arc;

use crate::models::GeoItem;

/// Items in file order, searched by upper bound.
///
/// Lookups are only correct when `max` never decreases along the sequence.
/// The index does not sort; [`RangeIndex::order_violations`] reports
/// inputs that break this.
pub struct RangeIndex {
    items: Vec<Arc<GeoItem>>,
}

/// Adjacent pairs whose `max` decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderViolations {
    pub count: usize,
    /// Index of the first item whose `max` is below its predecessor's
    pub first: usize,
}

impl RangeIndex {
    pub fn new(items: Vec<Arc<GeoItem>>) -> Self {
        Self { items }
    }

    /// The item whose interval contains `ip`, if any.
    pub fn lookup(&self, ip: u32) -> Option<&Arc<GeoItem>> {
        let idx = self.items.partition_point(|item| item.max() < ip);
        self.items.get(idx).filter(|item| item.min() <= ip)
    }

    pub fn order_violations(&self) -> Option<OrderViolations> {
        let mut report: Option<OrderViolations> = None;
        for (i, pair) in self.items.windows(2).enumerate() {
            if pair[1].max() < pair[0].max() {
                let entry = report.get_or_insert(OrderViolations {
                    count: 0,
                    first: i + 1,
                });
                entry.count += 1;
            }
        }
        report
    }

    pub fn get(&self, index: usize) -> Option<&Arc<GeoItem>> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<GeoItem>> {
        self.items.iter()
    }
}
