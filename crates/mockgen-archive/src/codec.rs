//! The export-file format.
//!
//! ```text
//! MGXP | version: u16 LE | blake3(payload): 32 bytes | payload
//! ```
//!
//! The payload is the bincode encoding of the package's exported
//! [`PackageTypes`]. The digest lets a resolver reject a corrupted or
//! partially written file before attempting to decode it.

use std::fs;
use std::path::Path;

use mockgen_core::PackageTypes;

use crate::error::ArchiveError;

/// Leading bytes of every export file.
pub const MAGIC: &[u8; 4] = b"MGXP";

/// Current export format version.
pub const FORMAT_VERSION: u16 = 1;

const DIGEST_LEN: usize = blake3::OUT_LEN;
const HEADER_LEN: usize = MAGIC.len() + 2 + DIGEST_LEN;

/// Encodes the public surface of a package into export bytes.
pub fn encode(package: &PackageTypes) -> Result<Vec<u8>, ArchiveError> {
    let payload = bincode::serialize(&package.exported())?;
    let digest = blake3::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(digest.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes export bytes, validating the framing first.
pub fn decode(bytes: &[u8]) -> Result<PackageTypes, ArchiveError> {
    if bytes.len() < HEADER_LEN {
        return Err(ArchiveError::Truncated {
            len: bytes.len(),
            needed: HEADER_LEN,
        });
    }
    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(ArchiveError::BadMagic);
    }
    let (version, rest) = rest.split_at(2);
    let found = u16::from_le_bytes([version[0], version[1]]);
    if found != FORMAT_VERSION {
        return Err(ArchiveError::UnsupportedVersion {
            found,
            expected: FORMAT_VERSION,
        });
    }
    let (digest, payload) = rest.split_at(DIGEST_LEN);
    if blake3::hash(payload).as_bytes().as_slice() != digest {
        return Err(ArchiveError::DigestMismatch);
    }
    Ok(bincode::deserialize(payload)?)
}

/// Encodes `package` and writes it to `path`, creating parent directories.
pub fn write_export_file(path: &Path, package: &PackageTypes) -> Result<(), ArchiveError> {
    let bytes = encode(package)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), package = %package.path, "wrote export file");
    Ok(())
}

/// Reads and decodes the export file at `path`.
pub fn read_export_file(path: &Path) -> Result<PackageTypes, ArchiveError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgen_core::{ItemDef, ItemKind, Visibility};

    fn package() -> PackageTypes {
        let mut pkg = PackageTypes::new("github.com/acme/store", "store");
        pkg.insert(ItemDef {
            name: "Widget".into(),
            module: String::new(),
            visibility: Visibility::Public,
            kind: ItemKind::Type,
        });
        pkg.insert(ItemDef {
            name: "Secret".into(),
            module: String::new(),
            visibility: Visibility::Private,
            kind: ItemKind::Type,
        });
        pkg
    }

    #[test]
    fn encode_keeps_only_exported_items() {
        let decoded = decode(&encode(&package()).unwrap()).unwrap();
        assert_eq!(decoded.path, "github.com/acme/store");
        assert!(decoded.get("Widget").is_some());
        assert!(decoded.get("Secret").is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(&package()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(ArchiveError::BadMagic)));
    }

    #[test]
    fn rejects_future_version() {
        let mut bytes = encode(&package()).unwrap();
        bytes[4..6].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(ArchiveError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_corrupted_payload() {
        let mut bytes = encode(&package()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(decode(&bytes), Err(ArchiveError::DigestMismatch)));
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(matches!(
            decode(b"MGXP"),
            Err(ArchiveError::Truncated { len: 4, .. })
        ));
    }
}
