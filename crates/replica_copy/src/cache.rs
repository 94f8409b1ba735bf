//! Compiled-copier cache

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::copier::CompiledCopier;
use crate::options::CopierKey;

/// Unbounded map from [`CopierKey`] to its compiled copier.
///
/// Entries are never evicted. When two threads race to insert the same
/// key, the first entry is kept and handed to both.
#[derive(Default)]
pub struct CopierCache {
    copiers: RwLock<HashMap<CopierKey, Arc<CompiledCopier>>>,
}

impl CopierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CopierKey) -> Option<Arc<CompiledCopier>> {
        self.copiers.read().get(key).cloned()
    }

    /// Store `copier` unless `key` is already present; returns the stored entry
    pub fn insert(&self, key: CopierKey, copier: Arc<CompiledCopier>) -> Arc<CompiledCopier> {
        let mut copiers = self.copiers.write();
        if !copiers.contains_key(&key) {
            log::debug!("Cached copier {}", key);
        }
        copiers.entry(key).or_insert(copier).clone()
    }

    pub fn contains(&self, key: &CopierKey) -> bool {
        self.copiers.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.copiers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.copiers.read().is_empty()
    }
}

impl core::fmt::Debug for CopierCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CopierCache")
            .field("copiers", &self.len())
            .finish()
    }
}
