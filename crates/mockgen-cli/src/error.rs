//! Errors surfaced by the driver.

use std::path::PathBuf;

use thiserror::Error;

use mockgen_archive::ArchiveError;
use mockgen_check::{ExtractError, LoadError};
use mockgen_codegen::CodegenError;
use mockgen_core::{CoreError, Solvable};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Options rejected before anything is loaded.
    #[error("{message}")]
    Config { message: String, hints: Vec<String> },

    #[error(transparent)]
    Archive(#[from] CoreError),

    #[error("could not load packages {} ({source})", .paths.join(","))]
    Load {
        paths: Vec<String>,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("failed to write export file {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to encode interfaces: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverError {
    pub fn config(message: impl Into<String>) -> Self {
        DriverError::Config {
            message: message.into(),
            hints: Vec::new(),
        }
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            DriverError::Config { message, mut hints } => {
                hints.push(hint.into());
                DriverError::Config { message, hints }
            }
            other => other,
        }
    }
}

impl Solvable for DriverError {
    fn solutions(&self) -> Vec<String> {
        match self {
            DriverError::Config { hints, .. } => hints.clone(),
            DriverError::ConfigParse { .. } => {
                vec!["config keys are the kebab-case names of the generate flags".into()]
            }
            DriverError::Load { source, .. } => source.solutions(),
            DriverError::Extract(err) => err.solutions(),
            DriverError::Codegen(err) => err.solutions(),
            DriverError::Archive(_) => {
                vec!["pass archives as --archives=IMPORTPATHS=IMPORTMAP=FILE=EXPORT".into()]
            }
            _ => Vec::new(),
        }
    }
}

/// Renders `err` the way the binary prints it.
pub fn report(err: &DriverError) -> String {
    let mut out = format!("error: {err}\n");
    let solutions = err.solutions();
    if !solutions.is_empty() {
        out.push_str("\nPossible solutions:\n");
        for solution in solutions {
            out.push_str("  - ");
            out.push_str(&solution);
            out.push('\n');
        }
    }
    out
}
