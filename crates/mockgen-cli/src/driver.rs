//! The `generate`, `export` and `inspect` runs.

use std::path::PathBuf;

use indexmap::IndexSet;

use mockgen_check::{extract, load, LoadStrategy, Package};
use mockgen_codegen::{generate_with, Progress};
use mockgen_core::InterfaceDescriptor;

use crate::args::{ExportArgs, GenerateArgs, InspectArgs};
use crate::config::{self, PackageOptions, RunOptions};
use crate::error::DriverError;
use crate::sink::ProgressSink;

/// Resolves the options of a `generate` invocation, from its config file
/// when one is given.
pub fn generate_options(args: &GenerateArgs) -> Result<Vec<RunOptions>, DriverError> {
    let all = match &args.config {
        Some(path) => config::load_config(path, args)?,
        None => vec![RunOptions::from_args(args)?],
    };
    config::validate(&all)?;
    Ok(all)
}

/// Loads every package named by any group once, then extracts and writes
/// the mocks of each group in turn. Returns the written files.
///
/// The loading strategy is taken from the first package of the first group.
pub fn generate(all: &[RunOptions], sink: &mut dyn ProgressSink) -> Result<Vec<PathBuf>, DriverError> {
    let Some(first) = all.first().and_then(|o| o.packages.first()) else {
        return Err(DriverError::config("no mock groups configured"));
    };
    let groups = all.iter().flat_map(|o| o.packages.iter());
    let packages = load_packages(groups, &first.strategy(), sink)?;

    let mut written = Vec::new();
    for options in all {
        let requests: Vec<_> = options.packages.iter().map(PackageOptions::request).collect();
        let interfaces = extract(&packages, &requests)?;
        tracing::info!(
            interfaces = interfaces.len(),
            dir = %options.output.output_dir.display(),
            "generating mocks"
        );
        let files = generate_with(&interfaces, &options.output, &mut |progress| match progress {
            Progress::Interface(name) => sink.report(&format!("generating code for interface '{name}'")),
            Progress::Writing(path) => sink.report(&format!("writing to '{}'", path.display())),
        })?;
        written.extend(files);
    }
    Ok(written)
}

/// Extracts the interfaces `args` select without generating anything.
pub fn inspect(args: &InspectArgs, sink: &mut dyn ProgressSink) -> Result<Vec<InterfaceDescriptor>, DriverError> {
    let package = PackageOptions::from_args(&args.packages)?;
    config::validate(&[RunOptions {
        packages: vec![package.clone()],
        output: Default::default(),
    }])?;
    let packages = load_packages([&package], &package.strategy(), sink)?;
    Ok(extract(&packages, &[package.request()])?)
}

/// Renders descriptors for `inspect`.
pub fn inspect_json(interfaces: &[InterfaceDescriptor], compact: bool) -> Result<String, DriverError> {
    let json = if compact {
        serde_json::to_string(interfaces)?
    } else {
        serde_json::to_string_pretty(interfaces)?
    };
    Ok(json)
}

/// Checks the package `args` names against its dependencies' export files
/// and writes its own.
pub fn export(args: &ExportArgs, sink: &mut dyn ProgressSink) -> Result<PathBuf, DriverError> {
    let package = PackageOptions {
        import_paths: vec![args.import_path.clone()],
        archives: config::parse_archives(&args.archives)?,
        sources: args.sources.clone(),
        stdlib_root: args.stdlib_root.clone(),
        ..Default::default()
    };
    // Export always checks sources live, even without dependency archives.
    let strategy = LoadStrategy::Archive {
        archives: package.archives.clone(),
        sources: package.sources.clone(),
        stdlib_root: package.stdlib_root.clone(),
    };
    let packages = load_packages([&package], &strategy, sink)?;
    let Some(loaded) = packages.first() else {
        return Err(DriverError::config(format!("no package loaded for {}", args.import_path)));
    };

    sink.report(&format!("writing to '{}'", args.output.display()));
    mockgen_archive::write_export_file(&args.output, &loaded.types).map_err(|source| {
        DriverError::Export {
            path: args.output.clone(),
            source,
        }
    })?;
    tracing::info!(path = %loaded.import_path, file = %args.output.display(), "wrote export file");
    Ok(args.output.clone())
}

fn load_packages<'a>(
    groups: impl IntoIterator<Item = &'a PackageOptions>,
    strategy: &LoadStrategy,
    sink: &mut dyn ProgressSink,
) -> Result<Vec<Package>, DriverError> {
    let import_paths: IndexSet<String> = groups
        .into_iter()
        .flat_map(|p| p.import_paths.iter().cloned())
        .collect();
    let import_paths: Vec<String> = import_paths.into_iter().collect();

    sink.report(&format!("loading data for {} packages", import_paths.len()));
    load(&import_paths, strategy).map_err(|source| DriverError::Load {
        paths: import_paths.clone(),
        source,
    })
}
