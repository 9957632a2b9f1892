//! Resolution of import paths to export files.
//!
//! Lookup order for an import path:
//!
//! 1. the import cache;
//! 2. the archive references supplied on the command line, keyed by their
//!    import map;
//! 3. for standard-library paths (see [`is_stdlib_import`]), the export file
//!    `<stdlib_root>/<import_path>.mexp`.
//!
//! Every import path listed by a decoded export is resolved recursively and
//! cached before the package itself is returned.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use mockgen_core::import_path::STDLIB_EXPORT_EXTENSION;
use mockgen_core::{crate_name_for, is_stdlib_import, ArchiveRef, ImportError, Importer, PackageTypes};

use crate::cache::ImportCache;
use crate::codec;

/// The registered mapping from import paths to export files.
#[derive(Debug, Clone, Default)]
pub struct ArchiveResolver {
    archives: IndexMap<String, PathBuf>,
    stdlib_root: Option<PathBuf>,
}

impl ArchiveResolver {
    /// Builds the mapping. A later reference for the same import map
    /// replaces an earlier one.
    pub fn new(archives: &[ArchiveRef], stdlib_root: Option<PathBuf>) -> Self {
        let archives = archives
            .iter()
            .map(|a| (a.import_map.clone(), a.file.clone()))
            .collect();
        ArchiveResolver {
            archives,
            stdlib_root,
        }
    }

    /// Registered import paths in the order they were supplied.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.archives.keys().map(String::as_str)
    }

    /// The stdlib export file that would back `path`, if `path` is a
    /// standard-library import and a stdlib root is configured.
    pub fn stdlib_file(&self, path: &str) -> Option<PathBuf> {
        if !is_stdlib_import(path) {
            return None;
        }
        self.stdlib_root
            .as_ref()
            .map(|root| root.join(format!("{path}.{STDLIB_EXPORT_EXTENSION}")))
    }

    /// Resolves `path` through `cache`, reading its export file on a miss.
    pub fn resolve(
        &self,
        path: &str,
        cache: &mut ImportCache,
    ) -> Result<Arc<PackageTypes>, ImportError> {
        if let Some(hit) = cache.get(path) {
            return Ok(hit);
        }
        let file = self.locate(path)?;
        if !cache.begin(path) {
            return Err(ImportError::Cycle {
                path: path.to_string(),
            });
        }
        let result = self.materialize(path, &file, cache);
        cache.finish(path);
        result
    }

    fn locate(&self, path: &str) -> Result<PathBuf, ImportError> {
        if let Some(file) = self.archives.get(path) {
            return Ok(file.clone());
        }
        match self.stdlib_file(path) {
            Some(file) if file.is_file() => Ok(file),
            searched => Err(ImportError::NotFound {
                path: path.to_string(),
                searched,
            }),
        }
    }

    fn materialize(
        &self,
        path: &str,
        file: &Path,
        cache: &mut ImportCache,
    ) -> Result<Arc<PackageTypes>, ImportError> {
        tracing::debug!(path, file = %file.display(), "reading export data");
        let bytes = fs::read(file).map_err(|source| ImportError::Read {
            path: path.to_string(),
            file: file.to_path_buf(),
            source,
        })?;
        let mut package = codec::decode(&bytes).map_err(|e| ImportError::Decode {
            path: path.to_string(),
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;

        if package.path != path {
            let declared = package.path.clone();
            tracing::debug!(declared = %declared, registered = path, "rebasing export");
            package.rebase(&declared, path);
        }

        for import in package.imports.clone() {
            if import != path {
                self.resolve(&import, cache)?;
            }
        }
        Ok(cache.insert(path, package))
    }
}

/// An [`Importer`] backed by export files, owning the run's import cache.
#[derive(Debug, Default)]
pub struct ArchiveImporter {
    resolver: ArchiveResolver,
    cache: ImportCache,
}

impl ArchiveImporter {
    pub fn new(resolver: ArchiveResolver) -> Self {
        ArchiveImporter {
            resolver,
            cache: ImportCache::new(),
        }
    }

    pub fn resolver(&self) -> &ArchiveResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &ImportCache {
        &self.cache
    }
}

impl Importer for ArchiveImporter {
    /// A crate name maps to the registered archive whose import path derives
    /// that name; otherwise the name itself is taken as a (standard-library)
    /// import path.
    fn import_path_for_crate(&self, crate_name: &str) -> Option<String> {
        let registered = self
            .resolver
            .registered()
            .find(|path| crate_name_for(path) == crate_name)
            .map(str::to_string);
        registered.or_else(|| Some(crate_name.to_string()))
    }

    fn import(&mut self, path: &str) -> Result<Arc<PackageTypes>, ImportError> {
        self.resolver.resolve(path, &mut self.cache)
    }

    fn imported(&self) -> Vec<Arc<PackageTypes>> {
        self.cache.packages().cloned().collect()
    }
}
