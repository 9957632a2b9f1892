//! The `mockgen` command-line driver.
//!
//! # Modules
//!
//! - [`args`] -- clap definitions of the `generate`, `export` and `inspect` subcommands
//! - [`config`] -- run options from flags or `mockgen.yaml`, and their validation
//! - [`driver`] -- loading, extraction and generation across output groups
//! - [`sink`] -- where user-facing progress goes
//! - [`error`] -- DriverError and its `error:` / `Possible solutions:` report

pub mod args;
pub mod config;
pub mod driver;
pub mod error;
pub mod sink;

pub use error::{report, DriverError};
pub use sink::{CollectingSink, ProgressSink, SilentSink, StderrSink};
