//! Writing rendered files and running the formatter over them.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CodegenError;

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
    /// Declared names of the interfaces the file mocks.
    pub interfaces: Vec<String>,
}

/// `path` relative to the working directory when it lies below it.
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Fails on the first planned file that already exists, unless `force`.
/// Runs before anything is written.
pub fn check_conflicts(files: &[RenderedFile], force: bool) -> Result<(), CodegenError> {
    if force {
        return Ok(());
    }
    match files.iter().find(|f| f.path.exists()) {
        Some(file) => Err(CodegenError::OutputConflict {
            path: relative_to_cwd(&file.path),
        }),
        None => Ok(()),
    }
}

pub fn write_file(file: &RenderedFile) -> Result<(), CodegenError> {
    let io = |source| CodegenError::Io {
        path: file.path.clone(),
        source,
    };
    if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    std::fs::write(&file.path, &file.contents).map_err(io)?;
    tracing::debug!(file = %file.path.display(), "wrote mock file");
    Ok(())
}

/// Runs `<binary> --edition 2021 <path>`, rewriting the file in place.
pub fn format_file(binary: &str, path: &Path) -> Result<(), CodegenError> {
    let failed = |reason: String| CodegenError::Formatter {
        file: relative_to_cwd(path),
        binary: binary.to_string(),
        reason,
    };
    let output = Command::new(binary)
        .args(["--edition", "2021"])
        .arg(path)
        .output()
        .map_err(|err| failed(format!("failed to run {binary}: {err}")))?;

    if output.status.success() {
        tracing::debug!(file = %path.display(), binary, "formatted mock file");
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let code = output.status.code().unwrap_or(-1);
    Err(failed(format!("{binary} exited with code {code}: {stderr}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: PathBuf) -> RenderedFile {
        RenderedFile {
            path,
            contents: "pub struct MockStore;\n".into(),
            interfaces: vec!["Store".into()],
        }
    }

    #[test]
    fn existing_files_conflict_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = file(dir.path().join("fresh_mock.rs"));
        let taken = file(dir.path().join("taken_mock.rs"));
        std::fs::write(&taken.path, "").unwrap();

        let files = vec![fresh.clone(), taken.clone()];
        let err = check_conflicts(&files, false).unwrap_err();
        assert!(matches!(err, CodegenError::OutputConflict { ref path } if path.ends_with("taken_mock.rs")));
        assert!(err.to_string().ends_with("already exists, overwrite with --force"));
        assert!(!fresh.path.exists());
        check_conflicts(&files, true).unwrap();
    }

    #[test]
    fn writes_create_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = file(dir.path().join("nested/mocks/store_mock.rs"));
        write_file(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out.path).unwrap(), out.contents);
    }

    #[test]
    fn missing_formatter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = file(dir.path().join("store_mock.rs"));
        write_file(&out).unwrap();
        let err = format_file("mockgen-no-such-formatter", &out.path).unwrap_err();
        assert!(matches!(err, CodegenError::Formatter { ref binary, .. } if binary == "mockgen-no-such-formatter"));
    }
}
