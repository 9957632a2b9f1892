//! The archive strategy: explicit sources checked against export files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mockgen_archive::{ArchiveImporter, ArchiveResolver};
use mockgen_core::{crate_name_for, ArchiveRef, Importer};

use super::{type_check_error, Package};
use crate::error::LoadError;
use crate::parse::parse_sources;
use crate::typecheck::{check_package, CheckMode};

/// Loads one package keyed to the first import path. Without sources the
/// package comes straight from its archive.
pub(super) fn load(
    import_paths: &[String],
    archives: &[ArchiveRef],
    sources: &[PathBuf],
    stdlib_root: Option<&Path>,
) -> Result<Vec<Package>, LoadError> {
    let Some(path) = import_paths.first() else {
        return Ok(Vec::new());
    };
    let resolver = ArchiveResolver::new(archives, stdlib_root.map(Path::to_path_buf));
    let mut importer = ArchiveImporter::new(resolver);

    if sources.is_empty() {
        tracing::debug!(path = %path, "loading package from its archive");
        let types = importer.import(path)?;
        return Ok(vec![package(path, Vec::new(), Vec::new(), types, &importer)]);
    }

    let files = parse_sources(sources)?;
    let crate_name = crate_name_for(path);
    let types = check_package(path, &crate_name, &files, &mut importer, CheckMode::Strict)
        .map_err(|err| type_check_error(path, err))?;
    let syntax = files.into_iter().map(|f| f.ast).collect();
    Ok(vec![package(
        path,
        sources.to_vec(),
        syntax,
        Arc::new(types),
        &importer,
    )])
}

fn package(
    path: &str,
    sources: Vec<PathBuf>,
    syntax: Vec<syn::File>,
    types: Arc<mockgen_core::PackageTypes>,
    importer: &ArchiveImporter,
) -> Package {
    let imports = importer
        .imported()
        .into_iter()
        .filter(|p| p.path != path)
        .collect();
    Package {
        import_path: path.to_string(),
        sources,
        syntax,
        types,
        imports,
    }
}
