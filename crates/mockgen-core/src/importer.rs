use std::sync::Arc;

use crate::error::ImportError;
use crate::package::PackageTypes;

/// Supplies the type information of packages referenced by checked code.
///
/// The type checker never reads archives or dependency sources itself; every
/// extern crate it meets is resolved through an importer.
pub trait Importer {
    /// Maps a crate name used in source (`extern crate`, `use foo::...`) to
    /// the import path of the package it denotes, if this importer knows it.
    fn import_path_for_crate(&self, crate_name: &str) -> Option<String>;

    /// Returns the package registered under `path`. Repeated calls for the
    /// same path return the same `Arc`.
    fn import(&mut self, path: &str) -> Result<Arc<PackageTypes>, ImportError>;

    /// Every package imported so far, in first-import order.
    fn imported(&self) -> Vec<Arc<PackageTypes>>;
}
