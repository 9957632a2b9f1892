//! Check failures and their positioned diagnostics.

use mockgen_core::ImportError;
use thiserror::Error;

use crate::error::Diagnostic;
use crate::parse::SourceFile;

use super::resolve::ResolveError;

/// Why a package failed to check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The first unresolvable name of a strictly checked package.
    #[error("{0}")]
    Diagnostic(Diagnostic),

    /// An import failed hard: unreadable or corrupt export data, or a cycle.
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Positions a resolution failure inside the file it was found in.
pub(crate) fn diagnostic(files: &[SourceFile], item_file: usize, err: &ResolveError) -> Diagnostic {
    let (span, file) = match err {
        ResolveError::Unresolved { span, file, .. } => (Some(*span), file.unwrap_or(item_file)),
        _ => (None, item_file),
    };
    let (line, column) = span
        .map(|s| {
            let start = s.start();
            (start.line, start.column + 1)
        })
        .unwrap_or((1, 1));
    Diagnostic {
        file: files
            .get(file)
            .map(|f| f.path.clone())
            .unwrap_or_default(),
        line,
        column,
        message: err.message(),
    }
}
