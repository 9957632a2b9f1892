//! Core error types for mockgen-core.
//!
//! Uses `thiserror` for structured, matchable error variants. [`CoreError`]
//! covers malformed user input parsed by the core itself; [`ImportError`] is
//! the failure type shared by every [`Importer`](crate::Importer)
//! implementation so that the type checker can propagate import failures
//! without knowing which loading strategy produced them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while parsing core input values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An archive reference string did not split into exactly four `=`-delimited fields.
    #[error("expected 4 elements, got {got}")]
    ArchiveFieldCount { got: usize },

    /// An archive reference had an empty import map or file field.
    #[error("archive reference '{reference}' has an empty {field} field")]
    EmptyArchiveField {
        reference: String,
        field: &'static str,
    },
}

/// Failure to materialize the type information of an imported package.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No archive is registered for the path and no stdlib export file exists.
    #[error("package {path:?} not found in read archives")]
    NotFound {
        path: String,
        /// The stdlib export file that was searched, when the path looked like a
        /// standard-library import.
        searched: Option<PathBuf>,
    },

    /// The backing export file could not be read.
    #[error("failed to read archive {file} for {path:?}: {source}")]
    Read {
        path: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing export file was read but could not be decoded.
    #[error("failed to decode archive {file} for {path:?}: {reason}")]
    Decode {
        path: String,
        file: PathBuf,
        reason: String,
    },

    /// Export files reference each other in a cycle.
    #[error("import cycle detected while resolving {path:?}")]
    Cycle { path: String },

    /// A source-backed dependency could not be loaded.
    #[error("failed to load dependency {path:?}: {reason}")]
    Source { path: String, reason: String },
}

impl ImportError {
    /// The import path that failed to resolve.
    pub fn path(&self) -> &str {
        match self {
            ImportError::NotFound { path, .. }
            | ImportError::Read { path, .. }
            | ImportError::Decode { path, .. }
            | ImportError::Cycle { path }
            | ImportError::Source { path, .. } => path,
        }
    }
}
