//! Mock synthesis for extracted trait contracts.
//!
//! This crate turns [`InterfaceDescriptor`]s into Rust source: a holder
//! struct implementing every flattened trait, one recorder per method with
//! hooks, programmed returns and call history, and the call-record types.
//!
//! # Modules
//!
//! - [`error`] -- Error types for synthesis and output failures
//! - [`naming`] -- Title casing, the per-file name allocator, file names
//! - [`imports`] -- Qualification of resolved types in generated code
//! - [`forms`] -- Owned forms, snapshots, produced values and zero values
//! - [`model`] -- Names, types and expressions resolved per interface
//! - [`pipeline`] -- The ordered table of synthesis steps
//! - [`steps`] -- The steps themselves
//! - [`render`] -- Pretty-printing and file headers
//! - [`output`] -- Conflict checks, writing and external formatting

pub mod error;
pub mod forms;
pub mod imports;
pub mod model;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod steps;

pub use error::CodegenError;
pub use output::RenderedFile;

use std::path::{Path, PathBuf};

use quote::{format_ident, quote};
use serde::{Deserialize, Serialize};

use mockgen_core::InterfaceDescriptor;

use crate::forms::FormCx;
use crate::imports::Qualifier;
use crate::model::Model;
use crate::naming::NameAllocator;

/// Name of the module holding the zero-value fallback, before allocation.
const SUPPORT_MODULE: &str = "mockgen_support";

/// Options controlling where and how mocks are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory output files are written to.
    pub output_dir: PathBuf,

    /// Writes every interface into this one file instead of one file per
    /// interface.
    pub output_filename: Option<String>,

    /// Wraps the generated items in `pub mod <package>`.
    pub package: Option<String>,

    /// Overwrite existing files.
    pub force: bool,

    pub disable_formatting: bool,

    /// Formatter binary run over every written file.
    pub rustfmt: String,

    /// Test-only output: `_test` file names and a `cfg(test)` module.
    pub for_test: bool,

    /// Import path of the package the output compiles into. Its items
    /// render as `crate::...`.
    pub output_import_path: Option<String>,

    /// Extra header comment lines.
    pub file_prefix: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            output_dir: PathBuf::from("."),
            output_filename: None,
            package: None,
            force: false,
            disable_formatting: false,
            rustfmt: "rustfmt".to_string(),
            for_test: false,
            output_import_path: None,
            file_prefix: None,
        }
    }
}

/// Progress reported by [`generate_with`].
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    Interface(&'a str),
    Writing(&'a Path),
}

/// Synthesizes the files `options` describe without touching the disk.
pub fn synthesize(
    interfaces: &[InterfaceDescriptor],
    options: &GenerateOptions,
) -> Result<Vec<RenderedFile>, CodegenError> {
    synthesize_with(interfaces, options, &mut |_| {})
}

fn synthesize_with(
    interfaces: &[InterfaceDescriptor],
    options: &GenerateOptions,
    progress: &mut dyn FnMut(Progress<'_>),
) -> Result<Vec<RenderedFile>, CodegenError> {
    if let Some(name) = &options.output_filename {
        let name = if options.for_test {
            naming::test_file_name(name)
        } else {
            name.clone()
        };
        let group: Vec<&InterfaceDescriptor> = interfaces.iter().collect();
        let file = synthesize_file(&group, options.output_dir.join(name), options, progress)?;
        return Ok(vec![file]);
    }

    interfaces
        .iter()
        .map(|interface| {
            let name = naming::interface_file_name(interface.prefix.as_deref(), &interface.name, options.for_test);
            synthesize_file(&[interface], options.output_dir.join(name), options, progress)
        })
        .collect()
}

/// Synthesizes one file holding the mocks of `interfaces`.
pub fn synthesize_file(
    interfaces: &[&InterfaceDescriptor],
    path: PathBuf,
    options: &GenerateOptions,
    progress: &mut dyn FnMut(Progress<'_>),
) -> Result<RenderedFile, CodegenError> {
    let mut names = NameAllocator::new();
    let mut q = Qualifier::new(options.output_import_path.clone());
    let holders: Vec<_> = interfaces
        .iter()
        .map(|interface| model::holder_name(interface, &mut names))
        .collect();
    let support = format_ident!("{}", names.allocate(SUPPORT_MODULE));

    let mut uses_support = false;
    let mut bodies = Vec::with_capacity(interfaces.len());
    for (interface, holder) in interfaces.iter().zip(holders) {
        progress(Progress::Interface(&interface.name));
        tracing::debug!(interface = %interface.trait_ref, holder = %holder, "synthesizing mock");
        let mut cx = FormCx {
            q: &mut q,
            holder: &holder,
            support: &support,
            uses_support: false,
        };
        let model = Model::build(interface, &mut names, &mut cx, holder.clone())?;
        uses_support |= cx.uses_support;
        bodies.push(pipeline::run(&model));
    }

    let uses = q.use_decls();
    let support_module = uses_support.then(|| forms::support_module(&support));
    let mut items = quote! {
        #uses
        #(#bodies)*
        #support_module
    };
    if let Some(package) = &options.package {
        items = render::wrap_module(package, options.for_test, items);
    }

    let header = render::header(options.file_prefix.as_deref());
    let contents = render::render(&path, &header, items)?;
    Ok(RenderedFile {
        path,
        contents,
        interfaces: interfaces.iter().map(|i| i.name.clone()).collect(),
    })
}

/// Synthesizes, writes and formats the mocks of `interfaces`.
pub fn generate(
    interfaces: &[InterfaceDescriptor],
    options: &GenerateOptions,
) -> Result<Vec<PathBuf>, CodegenError> {
    generate_with(interfaces, options, &mut |_| {})
}

/// Like [`generate`], reporting progress as it goes. No file is written
/// if any planned file already exists and `force` is not set.
pub fn generate_with(
    interfaces: &[InterfaceDescriptor],
    options: &GenerateOptions,
    progress: &mut dyn FnMut(Progress<'_>),
) -> Result<Vec<PathBuf>, CodegenError> {
    let files = synthesize_with(interfaces, options, progress)?;
    output::check_conflicts(&files, options.force)?;

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        progress(Progress::Writing(&output::relative_to_cwd(&file.path)));
        output::write_file(file)?;
        if !options.disable_formatting {
            output::format_file(&options.rustfmt, &file.path)?;
        }
        written.push(file.path.clone());
    }
    Ok(written)
}
