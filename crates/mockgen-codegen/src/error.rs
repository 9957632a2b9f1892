//! Codegen error types covering rendering, output and formatting failures.

use std::path::PathBuf;

use mockgen_core::Solvable;

/// Errors that can occur while synthesizing and writing mocks.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A signature type has no owned form mocks can record or return.
    #[error("cannot mock {interface}.{method}: unsupported type `{ty}`")]
    UnsupportedType {
        interface: String,
        method: String,
        ty: String,
    },

    /// The synthesized tokens did not form a valid file.
    #[error("failed to render mocks for {}: {reason}", .file.display())]
    Render { file: PathBuf, reason: String },

    /// An output file already exists and `force` was not given.
    #[error("filename {} already exists, overwrite with --force", .path.display())]
    OutputConflict { path: PathBuf },

    /// The external formatter could not be run or rejected the file.
    #[error("failed to format {}: {reason}", .file.display())]
    Formatter {
        file: PathBuf,
        binary: String,
        reason: String,
    },

    /// Filesystem I/O error.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Solvable for CodegenError {
    fn solutions(&self) -> Vec<String> {
        match self {
            CodegenError::OutputConflict { .. } => vec![
                "pass --force to overwrite existing files".into(),
                "choose another output with --dirname or --filename".into(),
            ],
            CodegenError::Formatter { binary, .. } => vec![
                format!("make sure `{binary}` is installed (`rustup component add rustfmt`)"),
                "point --rustfmt at a working formatter binary".into(),
                "skip formatting with --disable-formatting".into(),
            ],
            CodegenError::UnsupportedType { interface, .. } => {
                vec![format!("exclude '{interface}' with --exclude")]
            }
            CodegenError::Render { .. } | CodegenError::Io { .. } => Vec::new(),
        }
    }
}
