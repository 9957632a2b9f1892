//! Source files to syntax trees.
//!
//! Two ways of assembling a crate's files exist. The archive strategy gets
//! an explicit file list from the build system and derives each file's module
//! path from its location relative to the first file ([`parse_sources`]).
//! The workspace strategy starts at a crate root and follows `mod`
//! declarations the way rustc does ([`parse_crate`]).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// A parsed source file and the module it defines.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Module path inside the crate; empty for the crate root.
    pub module: String,
    pub ast: syn::File,
}

/// Parses source text, mapping syntax errors to positioned [`LoadError`]s.
pub fn parse_source(path: &Path, text: &str) -> Result<syn::File, LoadError> {
    syn::parse_file(text).map_err(|err| {
        let start = err.span().start();
        LoadError::Syntax {
            file: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: err.to_string(),
        }
    })
}

pub fn parse_file(path: &Path) -> Result<syn::File, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    parse_source(path, &text)
}

/// Parses an explicit file list. The first file is the crate root; the rest
/// map to module paths relative to the root's directory. Fails on the first
/// syntax error.
pub fn parse_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>, LoadError> {
    let Some(root) = paths.first() else {
        return Ok(Vec::new());
    };
    let root_dir = root.parent().unwrap_or(Path::new(""));

    let mut files = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let module = if i == 0 {
            String::new()
        } else {
            module_path_for(root_dir, path)
        };
        tracing::debug!(file = %path.display(), module = %module, "parsing source");
        files.push(SourceFile {
            path: path.clone(),
            module,
            ast: parse_file(path)?,
        });
    }
    Ok(files)
}

/// The module path a file defines, relative to the crate root directory.
///
/// `a/b.rs` and `a/b/mod.rs` both give `a::b`; `lib.rs` and `main.rs` in the
/// root directory give the root module. Files outside the root directory
/// fall back to their file stem.
pub fn module_path_for(root_dir: &Path, file: &Path) -> String {
    let Ok(relative) = file.strip_prefix(root_dir) else {
        return file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    };

    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last).to_string();
        let is_root_file = segments.is_empty() && (stem == "lib" || stem == "main");
        if stem != "mod" && !is_root_file {
            segments.push(stem);
        }
    }
    segments.join("::")
}

/// Parses a crate by following `mod` declarations from its root file.
///
/// `#[path]` attributes are honoured and `#[cfg(test)]` modules skipped.
/// With `missing_ok`, declared modules without a backing file are skipped
/// instead of failing the load (generated or platform-specific modules of
/// dependency crates).
pub fn parse_crate(root: &Path, missing_ok: bool) -> Result<Vec<SourceFile>, LoadError> {
    let mut walker = ModuleWalker {
        files: Vec::new(),
        missing_ok,
    };
    let dir = root.parent().unwrap_or(Path::new("")).to_path_buf();
    walker.visit_file(root, String::new(), dir)?;
    Ok(walker.files)
}

struct ModuleWalker {
    files: Vec<SourceFile>,
    missing_ok: bool,
}

impl ModuleWalker {
    /// Parses `path` as module `module`, whose child modules live in `dir`.
    fn visit_file(&mut self, path: &Path, module: String, dir: PathBuf) -> Result<(), LoadError> {
        tracing::debug!(file = %path.display(), module = %module, "parsing module");
        let ast = parse_file(path)?;
        let decls = collect_mod_decls(&ast.items, &module, &dir);
        self.files.push(SourceFile {
            path: path.to_path_buf(),
            module,
            ast,
        });
        for decl in decls {
            self.visit_decl(path, decl)?;
        }
        Ok(())
    }

    fn visit_decl(&mut self, declared_in: &Path, decl: ModDecl) -> Result<(), LoadError> {
        let found = decl.candidates.iter().find(|c| c.is_file()).cloned();
        let Some(file) = found else {
            if self.missing_ok {
                tracing::warn!(module = %decl.module, "skipping module without source file");
                return Ok(());
            }
            return Err(LoadError::ModuleFile {
                module: decl.module,
                declared_in: declared_in.to_path_buf(),
                candidates: decl.candidates,
            });
        };

        let is_mod_rs = decl.explicit || file.file_name().is_some_and(|n| n == "mod.rs");
        let child_dir = if is_mod_rs {
            file.parent().unwrap_or(Path::new("")).to_path_buf()
        } else {
            decl.dir.join(&decl.name)
        };
        self.visit_file(&file, decl.module, child_dir)
    }
}

/// A file-backed `mod name;` declaration found while scanning a file.
struct ModDecl {
    name: String,
    module: String,
    /// Directory the declaring module places its children in.
    dir: PathBuf,
    candidates: Vec<PathBuf>,
    /// Set when a `#[path]` attribute chose the file.
    explicit: bool,
}

fn collect_mod_decls(items: &[syn::Item], module: &str, dir: &Path) -> Vec<ModDecl> {
    let mut out = Vec::new();
    for item in items {
        let syn::Item::Mod(m) = item else { continue };
        if is_cfg_test(&m.attrs) {
            continue;
        }
        let name = m.ident.to_string();
        let child = child_module(module, &name);
        match &m.content {
            // Inline modules keep scanning: their `mod x;` children live in
            // a subdirectory named after the inline module.
            Some((_, inner)) => out.extend(collect_mod_decls(inner, &child, &dir.join(&name))),
            None => {
                let (candidates, explicit) = match path_attr(&m.attrs) {
                    Some(p) => (vec![dir.join(p)], true),
                    None => (
                        vec![
                            dir.join(format!("{name}.rs")),
                            dir.join(&name).join("mod.rs"),
                        ],
                        false,
                    ),
                };
                out.push(ModDecl {
                    name,
                    module: child,
                    dir: dir.to_path_buf(),
                    candidates,
                    explicit,
                });
            }
        }
    }
    out
}

pub(crate) fn child_module(parent: &str, name: &str) -> String {
    mockgen_core::package::join_path(parent, name)
}

fn path_attr(attrs: &[syn::Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        if !attr.path().is_ident("path") {
            return None;
        }
        let syn::Meta::NameValue(nv) = &attr.meta else {
            return None;
        };
        match &nv.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) => Some(s.value()),
            _ => None,
        }
    })
}

/// Whether the attributes contain `#[cfg(test)]`.
pub(crate) fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(&attr.meta, syn::Meta::List(list) if list.tokens.to_string() == "test")
    })
}
