//! The per-run import cache.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use mockgen_core::PackageTypes;

/// Import path to materialized package types, populated lazily.
///
/// The cache only grows. Once a path is present, every later lookup returns
/// the same `Arc`, so no two package values ever exist for one import path
/// within a run.
#[derive(Debug, Default)]
pub struct ImportCache {
    packages: IndexMap<String, Arc<PackageTypes>>,
    resolving: IndexSet<String>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Arc<PackageTypes>> {
        self.packages.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.packages.contains_key(path)
    }

    /// Stores a package, returning the cached value when the path is already
    /// present.
    pub fn insert(&mut self, path: &str, package: PackageTypes) -> Arc<PackageTypes> {
        if let Some(existing) = self.packages.get(path) {
            return Arc::clone(existing);
        }
        let package = Arc::new(package);
        self.packages.insert(path.to_string(), Arc::clone(&package));
        package
    }

    /// Marks `path` as being resolved. Returns false if it already was,
    /// which means the export files form a cycle.
    pub fn begin(&mut self, path: &str) -> bool {
        self.resolving.insert(path.to_string())
    }

    pub fn finish(&mut self, path: &str) {
        self.resolving.shift_remove(path);
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Cached packages in insertion order.
    pub fn packages(&self) -> impl Iterator<Item = &Arc<PackageTypes>> {
        self.packages.values()
    }
}
