//! Export files and the archive-backed importer.
//!
//! An export file records the public type surface of one package so that a
//! hermetic build can hand it to `mockgen generate` instead of the package's
//! sources.
//!
//! # Modules
//!
//! - [`codec`]: the framed export format and its file I/O helpers
//! - [`cache`]: the per-run import cache
//! - [`resolver`]: archive/stdlib lookup and the [`ArchiveImporter`]
//! - [`error`]: ArchiveError for framing and payload failures

pub mod cache;
pub mod codec;
pub mod error;
pub mod resolver;

pub use cache::ImportCache;
pub use codec::{decode, encode, read_export_file, write_export_file, FORMAT_VERSION, MAGIC};
pub use error::ArchiveError;
pub use resolver::{ArchiveImporter, ArchiveResolver};
