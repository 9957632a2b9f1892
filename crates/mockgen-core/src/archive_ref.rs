//! Archive references supplied by hermetic build systems.
//!
//! The flag format follows the archive convention used by Bazel rule sets:
//!
//! ```text
//! --archives=IMPORTPATHS=IMPORTMAP=FILE=EXPORT
//! ```
//!
//! Only IMPORTMAP (the import path the archive is indexed under) and FILE
//! (the export file on disk) are used. IMPORTPATHS and EXPORT are accepted
//! and ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A pairing of an import path with the export file that describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    /// The import path this archive is registered under.
    pub import_map: String,
    /// Path to the export-data file.
    pub file: PathBuf,
}

/// Parses an `IMPORTPATHS=IMPORTMAP=FILE=EXPORT` archive reference.
pub fn parse_archive(reference: &str) -> Result<ArchiveRef, CoreError> {
    let fields: Vec<&str> = reference.split('=').collect();
    if fields.len() != 4 {
        return Err(CoreError::ArchiveFieldCount { got: fields.len() });
    }

    let (import_map, file) = (fields[1], fields[2]);
    if import_map.is_empty() {
        return Err(CoreError::EmptyArchiveField {
            reference: reference.to_string(),
            field: "import map",
        });
    }
    if file.is_empty() {
        return Err(CoreError::EmptyArchiveField {
            reference: reference.to_string(),
            field: "file",
        });
    }

    Ok(ArchiveRef {
        import_map: import_map.to_string(),
        file: PathBuf::from(file),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_map_and_file() {
        let archive = parse_archive("foo:bar=foo=archive.a=export.go").unwrap();
        assert_eq!(archive.import_map, "foo");
        assert_eq!(archive.file, PathBuf::from("archive.a"));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_archive("foo=archive.a=export.go").unwrap_err();
        assert!(matches!(err, CoreError::ArchiveFieldCount { got: 3 }));
        assert_eq!(err.to_string(), "expected 4 elements, got 3");

        let err = parse_archive("a=b=c=d=e").unwrap_err();
        assert!(matches!(err, CoreError::ArchiveFieldCount { got: 5 }));
    }

    #[test]
    fn rejects_empty_file() {
        let err = parse_archive("foo=foo==export").unwrap_err();
        assert!(matches!(
            err,
            CoreError::EmptyArchiveField { field: "file", .. }
        ));
    }
}
