//! Loader and extractor error types.
//!
//! [`LoadError`] covers everything that can go wrong between import paths and
//! resolved packages: unreadable or unparsable sources, type-check
//! diagnostics, import failures and workspace metadata. [`ExtractError`]
//! covers selection and flattening of the requested interfaces.

use std::fmt;
use std::path::PathBuf;

use mockgen_core::{ImportError, Solvable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A positioned type-check message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// Errors produced while loading packages.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A source file failed to parse.
    #[error("{}:{line}:{column}: syntax error: {message}", .file.display())]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// A source file could not be read.
    #[error("failed to read {}: {source}", .file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `mod name;` declaration has no backing file.
    #[error("file not found for module `{module}` declared in {}", .declared_in.display())]
    ModuleFile {
        module: String,
        declared_in: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// The package failed to type check. Only the first diagnostic is kept.
    #[error("failed to type check {path}: {diagnostic}")]
    TypeCheck { path: String, diagnostic: Diagnostic },

    /// An imported package could not be materialized.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// None of the requested import paths produced a package.
    #[error("no packages found for import paths {}", .patterns.join(", "))]
    NoPackagesFound { patterns: Vec<String> },

    /// A requested import path is not a package of the workspace graph.
    #[error("package {path:?} not found in workspace metadata")]
    PackageNotFound { path: String },

    /// `cargo metadata` failed.
    #[error("failed to read workspace metadata: {0}")]
    Metadata(#[from] cargo_metadata::Error),
}

impl Solvable for LoadError {
    fn solutions(&self) -> Vec<String> {
        match self {
            LoadError::Import(ImportError::NotFound { path, searched }) => {
                let mut out = vec![format!(
                    "pass an archive for {path:?} with --archives=IMPORTPATHS=IMPORTMAP=FILE=EXPORT"
                )];
                if let Some(file) = searched {
                    out.push(format!("create {} with `mockgen export`", file.display()));
                } else {
                    out.push("set --stdlib-root to a directory of stdlib export files".into());
                }
                out
            }
            LoadError::PackageNotFound { .. } | LoadError::NoPackagesFound { .. } => vec![
                "check the import path against the package names in Cargo.toml".into(),
                "point --manifest-path at the workspace that contains the package".into(),
            ],
            _ => Vec::new(),
        }
    }
}

/// Errors produced while extracting interfaces from loaded packages.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A requested interface name matched no trait of the requested packages.
    #[error("type '{name}' not found in supplied import paths")]
    InterfaceNotFound { name: String },

    /// Two traits with the same name matched one request.
    #[error("interface '{name}' is declared by both {first} and {second}")]
    DuplicateInterface {
        name: String,
        first: String,
        second: String,
    },

    /// The trait (or one of its supertraits) has a shape mocks cannot express.
    #[error("interface '{name}' is not supported: {reason}")]
    UnsupportedInterface { name: String, reason: String },

    /// Two different supertraits contribute a method of the same name.
    #[error("interface '{interface}' has conflicting method '{method}' from {first} and {second}")]
    ConflictingMethod {
        interface: String,
        method: String,
        first: String,
        second: String,
    },

    /// A supertrait's declaration is not available.
    #[error("interface '{interface}' requires unresolvable supertrait {supertrait}")]
    UnresolvedSupertrait {
        interface: String,
        supertrait: String,
    },

    /// A request names an import path that was not loaded.
    #[error("package {path:?} was not loaded")]
    PackageNotLoaded { path: String },
}

impl Solvable for ExtractError {
    fn solutions(&self) -> Vec<String> {
        match self {
            ExtractError::InterfaceNotFound { name } => vec![
                format!("check the spelling of '{name}' in --interfaces"),
                "make sure the import path of the declaring package is supplied".into(),
            ],
            ExtractError::DuplicateInterface { .. } => vec![
                "request the packages in separate mock groups".into(),
                "exclude one of the traits with --exclude".into(),
            ],
            ExtractError::UnsupportedInterface { name, .. } => {
                vec![format!("exclude '{name}' with --exclude")]
            }
            ExtractError::ConflictingMethod { .. } => {
                vec!["rename one of the methods so each name is declared once".into()]
            }
            ExtractError::UnresolvedSupertrait { .. } => vec![
                "supply the package declaring the supertrait through --archives or the workspace"
                    .into(),
            ],
            ExtractError::PackageNotLoaded { .. } => Vec::new(),
        }
    }
}
