//! Bounded caches owned by a pipeline instance
//!
//! Replaces process-wide memo tables: each cache lives exactly as long as
//! the `SelectionPipeline` that owns it and can be cleared explicitly.

use crate::model::OwnerRecord;
use crate::owner::format_owner_info;
use crate::service::LayerHandle;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Default entry limit for the layer handle cache.
pub const LAYER_CACHE_CAPACITY: usize = 16;

/// Default entry limit for the owner format cache.
pub const FORMAT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Entries<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

/// Map with a fixed capacity; the oldest insertion is evicted first.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: Mutex<Entries<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.map.insert(key.clone(), value).is_none() {
            entries.order.push_back(key);
        }
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
            }
        }
    }

    /// Cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.map.clear();
        entries.order.clear();
    }
}

/// Validated layer handles by data source id.
pub type LayerCache = BoundedCache<String, LayerHandle>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FormatKey {
    owner: OwnerRecord,
    mask_pii: bool,
    unknown_text: String,
}

/// Memoizing front for [`format_owner_info`].
#[derive(Debug)]
pub struct FormatCache {
    cache: BoundedCache<FormatKey, String>,
}

impl FormatCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
        }
    }

    pub fn format(&self, owner: &OwnerRecord, mask_pii: bool, unknown_text: &str) -> String {
        let key = FormatKey {
            owner: owner.clone(),
            mask_pii,
            unknown_text: unknown_text.to_string(),
        };
        self.cache
            .get_or_insert_with(key, || format_owner_info(owner, mask_pii, unknown_text))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl Default for FormatCache {
    fn default() -> Self {
        Self::new(FORMAT_CACHE_CAPACITY)
    }
}
