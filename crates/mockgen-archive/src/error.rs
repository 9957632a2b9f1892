//! Export-file error types for mockgen-archive.

use thiserror::Error;

/// Errors produced while encoding or decoding an export file.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file is shorter than the fixed header.
    #[error("export data truncated: {len} bytes, header needs {needed}")]
    Truncated { len: usize, needed: usize },

    /// The file does not start with the export magic.
    #[error("not a mockgen export file (bad magic)")]
    BadMagic,

    /// The file was written by an incompatible format version.
    #[error("unsupported export format version {found}, expected {expected}")]
    UnsupportedVersion { found: u16, expected: u16 },

    /// The payload digest does not match the header.
    #[error("export payload digest mismatch")]
    DigestMismatch,

    /// The payload could not be serialized or deserialized.
    #[error("export payload error: {0}")]
    Payload(#[from] bincode::Error),

    /// Reading or writing the export file failed.
    #[error("export file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
