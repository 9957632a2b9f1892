//! Package loading, live type checking and contract extraction.
//!
//! This crate turns import paths into resolved [`Package`]s and resolved
//! packages into the [`InterfaceDescriptor`](mockgen_core::InterfaceDescriptor)s
//! the synthesizer consumes.
//!
//! # Modules
//!
//! - [`parse`] -- source files to syntax trees, module paths and module trees
//! - [`typecheck`] -- name resolution of trait signatures into package types
//! - [`loader`] -- the archive and workspace loading strategies
//! - [`extract`] -- interface selection and supertrait flattening
//! - [`error`] -- LoadError and ExtractError

pub mod error;
pub mod extract;
pub mod loader;
pub mod parse;
pub mod typecheck;

pub use error::{Diagnostic, ExtractError, LoadError};
pub use extract::{extract, InterfaceRequest};
pub use loader::{load, LoadStrategy, Package};
pub use parse::{parse_crate, parse_sources, SourceFile};
pub use typecheck::{check_package, CheckError, CheckMode};
