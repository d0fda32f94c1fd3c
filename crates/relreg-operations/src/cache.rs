use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use relreg_registry::{CanonicalId, PackageRecord, Result};

type CacheKey = (String, String);

/// Package versions loaded during one build, keyed by package and version.
///
/// Owned by the build context and dropped with it. Failed loads are not
/// cached.
#[derive(Debug, Default)]
pub struct PackageCache {
    entries: RwLock<HashMap<CacheKey, Arc<PackageRecord>>>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached record or loads and caches it.
    ///
    /// Two threads asking for the same missing entry may both run `load`; the
    /// first inserted record wins and both get it back.
    pub fn get_or_load<F>(&self, id: &CanonicalId, version: &str, load: F) -> Result<Arc<PackageRecord>>
    where
        F: FnOnce() -> Result<PackageRecord>,
    {
        let key = (id.url_path(), version.to_string());

        if let Some(record) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(record));
        }

        let record = Arc::new(load()?);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(record)))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
