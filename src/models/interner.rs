//! One shared [`Address`] per dictionary offset.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;

use super::Address;

/// Caches parsed addresses keyed by the record's stored address offset.
///
/// Only written while loading. Identity is purely offset-keyed: two offsets
/// holding identical text produce two distinct instances.
#[derive(Debug, Default)]
pub struct AddressInterner {
    cache: HashMap<u32, Arc<Address>>,
    malformed: usize,
}

impl AddressInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `offset` already produced an address.
    pub fn contains(&self, offset: u32) -> bool {
        self.cache.contains_key(&offset)
    }

    /// Return the cached address for `offset`, parsing `text` on first use.
    ///
    /// Malformed text is not cached, so later records at the same offset
    /// parse it again and fail again.
    pub fn resolve(&mut self, offset: u32, text: &[u8]) -> Option<Arc<Address>> {
        if let Some(address) = self.cache.get(&offset) {
            return Some(Arc::clone(address));
        }

        let text = String::from_utf8_lossy(text);
        match Address::parse(&text) {
            Some(address) => {
                let address = Arc::new(address);
                self.cache.insert(offset, Arc::clone(&address));
                Some(address)
            }
            None => {
                self.malformed += 1;
                debug!("Malformed dictionary entry at offset {}: {:?}", offset, text);
                None
            }
        }
    }

    /// Distinct offsets interned so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Failed resolutions, counted per attempt.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}
