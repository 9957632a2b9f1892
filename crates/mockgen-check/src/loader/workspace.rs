//! The workspace strategy: Cargo packages loaded from source.
//!
//! The import path of a package is its Cargo package name. Extern crate names
//! are mapped through the resolved dependency graph of the package that
//! writes them, and dependencies are parsed and checked leniently the first
//! time a signature refers to them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cargo_metadata::{DependencyKind, Metadata, MetadataCommand, PackageId};
use indexmap::IndexMap;

use mockgen_archive::ImportCache;
use mockgen_core::{ImportError, Importer, PackageTypes};

use super::{type_check_error, Package};
use crate::error::LoadError;
use crate::parse::parse_crate;
use crate::typecheck::{check_package, CheckError, CheckMode};

pub(super) fn load(import_paths: &[String], manifest_path: Option<&Path>) -> Result<Vec<Package>, LoadError> {
    let mut command = MetadataCommand::new();
    if let Some(manifest) = manifest_path {
        command.manifest_path(manifest);
    }
    let metadata = command.exec()?;
    let mut state = WorkspaceState::from_metadata(&metadata);
    tracing::debug!(packages = state.packages.len(), "read workspace metadata");

    let mut packages = Vec::with_capacity(import_paths.len());
    for path in import_paths {
        packages.push(state.load_requested(path)?);
    }
    Ok(packages)
}

#[derive(Debug, Clone)]
struct PackageInfo {
    crate_name: String,
    /// Root file of the library target.
    lib: Option<PathBuf>,
    /// Root file of the first target, for packages without a library.
    first: Option<PathBuf>,
    /// Extern crate name to dependency package name, normal dependencies only.
    deps: IndexMap<String, String>,
}

/// Every package of the dependency graph plus the types loaded so far.
#[derive(Debug, Default)]
pub(crate) struct WorkspaceState {
    packages: IndexMap<String, PackageInfo>,
    cache: ImportCache,
}

impl WorkspaceState {
    fn from_metadata(metadata: &Metadata) -> Self {
        let names: HashMap<&PackageId, &str> = metadata
            .packages
            .iter()
            .map(|p| (&p.id, p.name.as_str()))
            .collect();
        let mut deps: HashMap<&PackageId, IndexMap<String, String>> = HashMap::new();
        if let Some(resolve) = &metadata.resolve {
            for node in &resolve.nodes {
                let entry = deps.entry(&node.id).or_default();
                for dep in &node.deps {
                    let normal = dep.dep_kinds.is_empty()
                        || dep.dep_kinds.iter().any(|k| k.kind == DependencyKind::Normal);
                    if let (true, Some(name)) = (normal, names.get(&dep.pkg)) {
                        entry.insert(dep.name.clone(), name.to_string());
                    }
                }
            }
        }

        let mut state = WorkspaceState::default();
        // Members first so that a member shadows a same-named registry package.
        let mut ordered: Vec<_> = metadata.packages.iter().collect();
        ordered.sort_by_key(|p| !metadata.workspace_members.contains(&p.id));
        for package in ordered {
            if state.packages.contains_key(&package.name) {
                continue;
            }
            let lib = package
                .targets
                .iter()
                .find(|t| t.kind.iter().any(|k| k == "lib" || k == "rlib"));
            let crate_name = lib
                .or_else(|| package.targets.first())
                .map(|t| t.name.replace('-', "_"))
                .unwrap_or_else(|| package.name.replace('-', "_"));
            state.packages.insert(
                package.name.clone(),
                PackageInfo {
                    crate_name,
                    lib: lib.map(|t| t.src_path.clone().into_std_path_buf()),
                    first: package
                        .targets
                        .first()
                        .map(|t| t.src_path.clone().into_std_path_buf()),
                    deps: deps.remove(&package.id).unwrap_or_default(),
                },
            );
        }
        state
    }

    /// Loads a requested package, strictly checked.
    fn load_requested(&mut self, path: &str) -> Result<Package, LoadError> {
        let Some(info) = self.packages.get(path).cloned() else {
            return Err(LoadError::PackageNotFound {
                path: path.to_string(),
            });
        };
        let Some(root) = info.lib.or(info.first) else {
            return Err(LoadError::NoPackagesFound {
                patterns: vec![path.to_string()],
            });
        };

        let files = parse_crate(&root, false)?;
        let mut importer = ScopedImporter {
            state: self,
            package: path.to_string(),
        };
        let types = check_package(path, &info.crate_name, &files, &mut importer, CheckMode::Strict)
            .map_err(|err| type_check_error(path, err))?;

        let imports = self
            .cache
            .packages()
            .filter(|p| p.path != path)
            .cloned()
            .collect();
        let sources = files.iter().map(|f| f.path.clone()).collect();
        let syntax = files.into_iter().map(|f| f.ast).collect();
        Ok(Package {
            import_path: path.to_string(),
            sources,
            syntax,
            types: Arc::new(types),
            imports,
        })
    }

    /// Loads a dependency, once per run. Packages without a library target
    /// are opaque.
    fn load_dependency(&mut self, path: &str) -> Result<Arc<PackageTypes>, ImportError> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(hit);
        }
        let Some(info) = self.packages.get(path).cloned() else {
            return Err(ImportError::NotFound {
                path: path.to_string(),
                searched: None,
            });
        };
        let Some(root) = info.lib else {
            tracing::debug!(path, "dependency has no library target, treating as opaque");
            return Ok(self
                .cache
                .insert(path, PackageTypes::opaque(path, info.crate_name)));
        };
        if !self.cache.begin(path) {
            return Err(ImportError::Cycle {
                path: path.to_string(),
            });
        }
        let result = self.check_dependency(path, &info.crate_name, &root);
        self.cache.finish(path);
        Ok(self.cache.insert(path, result?))
    }

    fn check_dependency(&mut self, path: &str, crate_name: &str, root: &Path) -> Result<PackageTypes, ImportError> {
        tracing::debug!(path, root = %root.display(), "loading dependency from source");
        let source_error = |reason: String| ImportError::Source {
            path: path.to_string(),
            reason,
        };
        let files = parse_crate(root, true).map_err(|err| source_error(err.to_string()))?;
        let mut importer = ScopedImporter {
            state: self,
            package: path.to_string(),
        };
        match check_package(path, crate_name, &files, &mut importer, CheckMode::Lenient) {
            Ok(types) => Ok(types),
            Err(CheckError::Import(err)) => Err(err),
            Err(CheckError::Diagnostic(d)) => Err(source_error(d.to_string())),
        }
    }
}

/// Resolves extern crates as seen from one package of the graph.
pub(crate) struct ScopedImporter<'w> {
    state: &'w mut WorkspaceState,
    package: String,
}

impl Importer for ScopedImporter<'_> {
    fn import_path_for_crate(&self, crate_name: &str) -> Option<String> {
        self.state
            .packages
            .get(&self.package)
            .and_then(|info| info.deps.get(crate_name))
            .cloned()
    }

    fn import(&mut self, path: &str) -> Result<Arc<PackageTypes>, ImportError> {
        self.state.load_dependency(path)
    }

    fn imported(&self) -> Vec<Arc<PackageTypes>> {
        self.state.cache.packages().cloned().collect()
    }
}
