//! Size-accounted LRU cache of decoded thumbnails: the memory tier of the
//! two-tier image cache.
//!
//! Entries are decoded, display-scaled images keyed by the local image id.
//! The cache is bounded by a byte budget, accounted in decoded RGBA size,
//! and evicts least-recently-used entries to make room.  Writes are
//! first-write-wins: inserting under an existing key leaves the cached
//! entry untouched.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, trace};

use causerie_shared::media;

pub struct ImageCache {
    budget: usize,
    used: usize,
    entries: HashMap<i64, Arc<DynamicImage>>,
    /// Recency queue, least recently used at the front.  Holds exactly the
    /// keys of `entries`.
    order: VecDeque<i64>,
}

impl ImageCache {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: 0,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Insert if absent, evicting LRU entries until the new one fits.
    ///
    /// An image larger than the whole budget is not cached at all; callers
    /// still hold their own `Arc` to it.
    pub fn insert(&mut self, key: i64, image: Arc<DynamicImage>) {
        if self.entries.contains_key(&key) {
            return;
        }

        let size = media::byte_size(&image);
        if size > self.budget {
            debug!(key, size, budget = self.budget, "image exceeds cache budget");
            return;
        }

        while self.used + size > self.budget {
            if !self.evict_lru() {
                break;
            }
        }

        self.used += size;
        self.entries.insert(key, image);
        self.order.push_back(key);
    }

    /// Fetch and mark as most recently used.
    pub fn get(&mut self, key: i64) -> Option<Arc<DynamicImage>> {
        let image = self.entries.get(&key)?.clone();
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
            self.order.push_back(key);
        }
        Some(image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently accounted against the budget.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    fn evict_lru(&mut self) -> bool {
        let Some(key) = self.order.pop_front() else {
            return false;
        };
        if let Some(image) = self.entries.remove(&key) {
            self.used -= media::byte_size(&image);
            trace!(key, "evicted decoded image");
        }
        true
    }
}
