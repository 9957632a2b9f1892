//! Resolved run options, from flags or a `mockgen.yaml` file.
//!
//! A config file lists output groups under `mocks:`. Top-level `force`,
//! `disable-formatting`, `rustfmt`, `for-test` and `file-prefix` apply to
//! every group that does not set them itself. Relative paths are resolved
//! against the directory of the config file.
//!
//! ```yaml
//! force: true
//! mocks:
//!   - path: example.com/app
//!     interfaces: [Store, Clock]
//!     dirname: src/mocks
//!     filename: mocks.rs
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use mockgen_check::{InterfaceRequest, LoadStrategy};
use mockgen_codegen::GenerateOptions;
use mockgen_core::{parse_archive, ArchiveRef};

use crate::args::{GenerateArgs, PackageArgs};
use crate::error::DriverError;

/// The packages of one request and how to load them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageOptions {
    pub import_paths: Vec<String>,
    pub interfaces: Vec<String>,
    pub exclude: Vec<String>,
    pub prefix: Option<String>,
    pub archives: Vec<ArchiveRef>,
    pub sources: Vec<PathBuf>,
    pub stdlib_root: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

impl PackageOptions {
    pub fn from_args(args: &PackageArgs) -> Result<Self, DriverError> {
        Ok(PackageOptions {
            import_paths: args.import_paths.clone(),
            interfaces: args.interfaces.clone(),
            exclude: args.exclude.clone(),
            prefix: args.prefix.clone(),
            archives: parse_archives(&args.archives)?,
            sources: args.sources.clone(),
            stdlib_root: args.stdlib_root.clone(),
            manifest_path: args.manifest_path.clone(),
        })
    }

    pub fn request(&self) -> InterfaceRequest {
        InterfaceRequest {
            import_paths: self.import_paths.clone(),
            interfaces: self.interfaces.clone(),
            exclude: self.exclude.clone(),
            prefix: self.prefix.clone(),
        }
    }

    pub fn strategy(&self) -> LoadStrategy {
        LoadStrategy::select(
            self.archives.clone(),
            self.sources.clone(),
            self.stdlib_root.clone(),
            self.manifest_path.clone(),
        )
    }
}

/// One output group: the packages it mocks and where the mocks go.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub packages: Vec<PackageOptions>,
    pub output: GenerateOptions,
}

impl RunOptions {
    pub fn from_args(args: &GenerateArgs) -> Result<Self, DriverError> {
        let mut output = GenerateOptions {
            output_filename: args.filename.clone(),
            package: args.package.clone(),
            force: args.force,
            disable_formatting: args.disable_formatting,
            for_test: args.for_test,
            output_import_path: args.output_import_path.clone(),
            file_prefix: args.file_prefix.clone(),
            ..GenerateOptions::default()
        };
        if let Some(dir) = &args.dirname {
            output.output_dir = dir.clone();
        }
        if let Some(rustfmt) = &args.rustfmt {
            output.rustfmt = rustfmt.clone();
        }
        Ok(RunOptions {
            packages: vec![PackageOptions::from_args(&args.packages)?],
            output,
        })
    }
}

/// Top level of a `mockgen.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub disable_formatting: bool,
    pub rustfmt: Option<String>,
    #[serde(default)]
    pub for_test: bool,
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub mocks: Vec<MockGroup>,
}

/// One entry of `mocks:`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MockGroup {
    /// Shorthand for a single entry of `paths`.
    pub path: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub prefix: Option<String>,
    pub dirname: Option<PathBuf>,
    pub filename: Option<String>,
    pub package: Option<String>,
    pub output_import_path: Option<String>,
    pub force: Option<bool>,
    pub disable_formatting: Option<bool>,
    pub rustfmt: Option<String>,
    pub for_test: Option<bool>,
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub archives: Vec<String>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    pub stdlib_root: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

/// Reads and resolves a config file. `--force`, `--disable-formatting`,
/// `--for-test` and `--rustfmt` on the command line apply to every group;
/// `--file-prefix` replaces the top-level prefix.
pub fn load_config(path: &Path, overrides: &GenerateArgs) -> Result<Vec<RunOptions>, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file: ConfigFile = serde_yaml::from_str(&text).map_err(|source| DriverError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    if overrides.file_prefix.is_some() {
        file.file_prefix = overrides.file_prefix.clone();
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    tracing::debug!(config = %path.display(), groups = file.mocks.len(), "read config");
    let mut all = resolve(&file, base)?;
    for options in &mut all {
        let output = &mut options.output;
        output.force |= overrides.force;
        output.disable_formatting |= overrides.disable_formatting;
        output.for_test |= overrides.for_test;
        if let Some(rustfmt) = &overrides.rustfmt {
            output.rustfmt = rustfmt.clone();
        }
    }
    Ok(all)
}

/// Turns a parsed config into run options, resolving paths against `base`.
pub fn resolve(file: &ConfigFile, base: &Path) -> Result<Vec<RunOptions>, DriverError> {
    file.mocks
        .iter()
        .map(|group| {
            let mut import_paths: Vec<String> = group.path.iter().cloned().collect();
            import_paths.extend(group.paths.iter().cloned());

            let mut archives = parse_archives(&group.archives)?;
            for archive in &mut archives {
                archive.file = rebase(base, &archive.file);
            }
            let package = PackageOptions {
                import_paths,
                interfaces: group.interfaces.clone(),
                exclude: group.exclude.clone(),
                prefix: group.prefix.clone(),
                archives,
                sources: group.sources.iter().map(|s| rebase(base, s)).collect(),
                stdlib_root: group.stdlib_root.as_deref().map(|p| rebase(base, p)),
                manifest_path: group.manifest_path.as_deref().map(|p| rebase(base, p)),
            };

            let defaults = GenerateOptions::default();
            let output = GenerateOptions {
                output_dir: rebase(base, group.dirname.as_deref().unwrap_or(defaults.output_dir.as_path())),
                output_filename: group.filename.clone(),
                package: group.package.clone(),
                force: group.force.unwrap_or(file.force),
                disable_formatting: group.disable_formatting.unwrap_or(file.disable_formatting),
                rustfmt: group
                    .rustfmt
                    .clone()
                    .or_else(|| file.rustfmt.clone())
                    .unwrap_or(defaults.rustfmt),
                for_test: group.for_test.unwrap_or(file.for_test),
                output_import_path: group.output_import_path.clone(),
                file_prefix: group.file_prefix.clone().or_else(|| file.file_prefix.clone()),
            };
            Ok(RunOptions {
                packages: vec![package],
                output,
            })
        })
        .collect()
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub(crate) fn parse_archives(references: &[String]) -> Result<Vec<ArchiveRef>, DriverError> {
    references
        .iter()
        .map(|r| parse_archive(r).map_err(DriverError::from))
        .collect()
}

/// Rejects option sets the core would misinterpret.
pub fn validate(all: &[RunOptions]) -> Result<(), DriverError> {
    if all.is_empty() {
        return Err(DriverError::config("no mock groups configured")
            .with_hint("pass import paths on the command line or list groups under `mocks:`"));
    }
    for options in all {
        for package in &options.packages {
            if package.import_paths.is_empty() {
                return Err(DriverError::config("no import paths supplied")
                    .with_hint("pass at least one import path"));
            }
            if !package.sources.is_empty() && package.archives.is_empty() {
                return Err(DriverError::config("--sources is only used together with --archives")
                    .with_hint("supply the dependencies of the sources with --archives")
                    .with_hint("drop --sources to load the package from the Cargo workspace"));
            }
            if let Some(prefix) = &package.prefix {
                check_identifier("prefix", prefix)?;
            }
        }

        let output = &options.output;
        if let Some(package) = &output.package {
            check_identifier("package", package)?;
        }
        if let Some(filename) = &output.output_filename {
            let name = Path::new(filename);
            if name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true) {
                return Err(DriverError::config(format!("filename {filename:?} is not a plain file name"))
                    .with_hint("put the directory part in --dirname"));
            }
            if name.extension().map(|e| e != "rs").unwrap_or(true) {
                return Err(DriverError::config(format!("filename {filename:?} must end in .rs")));
            }
        }
        if output.rustfmt.trim().is_empty() && !output.disable_formatting {
            return Err(DriverError::config("--rustfmt is empty")
                .with_hint("pass --disable-formatting to skip formatting"));
        }
    }
    Ok(())
}

fn check_identifier(what: &str, value: &str) -> Result<(), DriverError> {
    let mut chars = value.chars();
    let valid = chars
        .next()
        .map(|c| c == '_' || c.is_ascii_alphabetic())
        .unwrap_or(false)
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(DriverError::config(format!("{what} {value:?} is not a valid identifier")))
    }
}
