//! Package loading.
//!
//! A [`LoadStrategy`] is chosen once per generation request:
//!
//! - [`LoadStrategy::Archive`] when the build system supplies export files.
//!   The given sources form one crate, checked against the archives.
//! - [`LoadStrategy::Workspace`] otherwise. Import paths are package names
//!   of a Cargo workspace; dependencies are loaded from their sources.

mod archive;
mod workspace;

use std::path::PathBuf;
use std::sync::Arc;

use mockgen_core::{ArchiveRef, PackageTypes};

use crate::error::LoadError;
use crate::typecheck::CheckError;

/// A resolved compilation unit.
#[derive(Debug, Clone)]
pub struct Package {
    pub import_path: String,
    /// Source files, in parse order. Empty for archive-only packages.
    pub sources: Vec<PathBuf>,
    pub syntax: Vec<syn::File>,
    pub types: Arc<PackageTypes>,
    /// Every package imported while checking this one.
    pub imports: Vec<Arc<PackageTypes>>,
}

impl Package {
    /// Finds the types of `path`: this package or one of its imports.
    pub fn package_types(&self, path: &str) -> Option<&Arc<PackageTypes>> {
        if self.types.path == path {
            return Some(&self.types);
        }
        self.imports.iter().find(|p| p.path == path)
    }
}

#[derive(Debug, Clone)]
pub enum LoadStrategy {
    Archive {
        archives: Vec<ArchiveRef>,
        sources: Vec<PathBuf>,
        stdlib_root: Option<PathBuf>,
    },
    Workspace {
        /// `Cargo.toml` of the workspace; the current directory's when unset.
        manifest_path: Option<PathBuf>,
    },
}

impl LoadStrategy {
    /// The archive strategy when any archive is supplied, the workspace
    /// strategy otherwise.
    pub fn select(
        archives: Vec<ArchiveRef>,
        sources: Vec<PathBuf>,
        stdlib_root: Option<PathBuf>,
        manifest_path: Option<PathBuf>,
    ) -> Self {
        if archives.is_empty() {
            LoadStrategy::Workspace { manifest_path }
        } else {
            LoadStrategy::Archive {
                archives,
                sources,
                stdlib_root,
            }
        }
    }
}

/// Loads the packages named by `import_paths`.
pub fn load(import_paths: &[String], strategy: &LoadStrategy) -> Result<Vec<Package>, LoadError> {
    let packages = match strategy {
        LoadStrategy::Archive {
            archives,
            sources,
            stdlib_root,
        } => archive::load(import_paths, archives, sources, stdlib_root.as_deref())?,
        LoadStrategy::Workspace { manifest_path } => {
            workspace::load(import_paths, manifest_path.as_deref())?
        }
    };
    if packages.is_empty() {
        return Err(LoadError::NoPackagesFound {
            patterns: import_paths.to_vec(),
        });
    }
    for package in &packages {
        tracing::debug!(
            path = %package.import_path,
            files = package.sources.len(),
            imports = package.imports.len(),
            "loaded package"
        );
    }
    Ok(packages)
}

fn type_check_error(path: &str, err: CheckError) -> LoadError {
    match err {
        CheckError::Diagnostic(diagnostic) => LoadError::TypeCheck {
            path: path.to_string(),
            diagnostic,
        },
        CheckError::Import(err) => LoadError::Import(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archives_select_the_archive_strategy() {
        let archive = ArchiveRef {
            import_map: "example.com/dep".into(),
            file: PathBuf::from("dep.mexp"),
        };
        let strategy = LoadStrategy::select(vec![archive], vec![PathBuf::from("lib.rs")], None, None);
        assert!(matches!(strategy, LoadStrategy::Archive { ref sources, .. } if sources.len() == 1));

        let strategy = LoadStrategy::select(Vec::new(), Vec::new(), None, Some("Cargo.toml".into()));
        assert!(matches!(strategy, LoadStrategy::Workspace { manifest_path: Some(_) }));
    }

    #[test]
    fn no_import_paths_is_no_packages() {
        let strategy = LoadStrategy::Archive {
            archives: Vec::new(),
            sources: Vec::new(),
            stdlib_root: None,
        };
        let err = load(&[], &strategy).unwrap_err();
        assert!(matches!(err, LoadError::NoPackagesFound { .. }));
    }
}
