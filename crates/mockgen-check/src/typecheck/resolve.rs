//! Path resolution.
//!
//! A path's first segment is looked up in order: `crate`/`self`/`super`,
//! items of the current module, its `use` names, its glob imports, the
//! universe (primitives and the prelude), and finally extern crates through
//! the [`Importer`]. Remaining segments walk into modules, following
//! re-exports across packages.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexSet;
use proc_macro2::Span;

use mockgen_core::package::join_path;
use mockgen_core::types::STD_PACKAGE;
use mockgen_core::{AliasDef, ImportError, Importer, ItemDef, ItemKind, ItemRef, PackageTypes, Primitive};

use super::scope::{LocalItem, LocalKind, Scopes};
use super::universe::{self, UniverseItem};

/// Reexport chains longer than this are treated as unresolvable.
const MAX_REEXPORT_DEPTH: usize = 16;

/// What a path denotes.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    /// A nominal type or trait.
    Item(ItemRef),
    /// A type alias template.
    Alias(AliasDef),
    Module(ModuleLoc),
    Primitive(Primitive),
    /// A path inside an opaque package: a module or an item, unknowable.
    Opaque(ItemRef),
}

#[derive(Debug, Clone)]
pub(crate) enum ModuleLoc {
    Local(String),
    Foreign(Arc<PackageTypes>, String),
}

#[derive(Debug)]
pub(crate) enum ResolveError {
    /// A name that does not resolve. A diagnostic for checked packages.
    Unresolved {
        message: String,
        span: Span,
        /// Declaring file when it differs from the item being checked.
        file: Option<usize>,
    },
    /// A shape mock generation does not support.
    Unsupported(String),
    /// An import failed for a reason other than the package being unknown.
    Import(ImportError),
}

impl ResolveError {
    pub fn unresolved(message: impl Into<String>, span: Span) -> Self {
        ResolveError::Unresolved {
            message: message.into(),
            span,
            file: None,
        }
    }

    pub fn in_file(self, index: usize) -> Self {
        match self {
            ResolveError::Unresolved {
                message,
                span,
                file: None,
            } => ResolveError::Unresolved {
                message,
                span,
                file: Some(index),
            },
            other => other,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ResolveError::Unresolved { message, .. } => message.clone(),
            ResolveError::Unsupported(reason) => reason.clone(),
            ResolveError::Import(err) => err.to_string(),
        }
    }
}

pub(crate) struct Resolver<'s, 'a> {
    pub(super) scopes: &'s Scopes<'a>,
    pub(super) package: String,
    importer: &'s mut dyn Importer,
    std: Arc<PackageTypes>,
    pub(super) imports: IndexSet<String>,
    aliases: HashMap<String, AliasDef>,
    alias_stack: HashSet<String>,
    use_stack: HashSet<(String, String)>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    pub fn new(scopes: &'s Scopes<'a>, package: &str, importer: &'s mut dyn Importer) -> Self {
        Resolver {
            scopes,
            package: package.to_string(),
            importer,
            std: Arc::new(PackageTypes::opaque(STD_PACKAGE, STD_PACKAGE)),
            imports: IndexSet::new(),
            aliases: HashMap::new(),
            alias_stack: HashSet::new(),
            use_stack: HashSet::new(),
        }
    }

    /// Resolves a path written in `module`.
    pub fn resolve_segments(
        &mut self,
        module: &str,
        leading_colon: bool,
        segments: &[String],
        span: Span,
    ) -> Result<Target, ResolveError> {
        let Some((first, rest)) = segments.split_first() else {
            return Err(ResolveError::unresolved("empty path", span));
        };

        let mut target = if leading_colon {
            self.extern_crate(first, span)?
        } else {
            match first.as_str() {
                "crate" => Target::Module(ModuleLoc::Local(String::new())),
                "self" => Target::Module(ModuleLoc::Local(module.to_string())),
                "super" => Target::Module(ModuleLoc::Local(parent_module(module, span)?)),
                _ => self.lookup_name(module, first, span)?,
            }
        };

        let mut walked = first.clone();
        for segment in rest {
            target = self.step(target, segment, &walked, span)?;
            walked = format!("{walked}::{segment}");
        }
        Ok(target)
    }

    pub fn resolve_path(&mut self, module: &str, path: &syn::Path) -> Result<Target, ResolveError> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let span = path
            .segments
            .last()
            .map(|s| s.ident.span())
            .unwrap_or_else(Span::call_site);
        self.resolve_segments(module, path.leading_colon.is_some(), &segments, span)
    }

    fn lookup_name(&mut self, module: &str, name: &str, span: Span) -> Result<Target, ResolveError> {
        if let Some(target) = self.lookup_local(module, name, span)? {
            return Ok(target);
        }
        if let Some(item) = universe::lookup(name) {
            return Ok(match item {
                UniverseItem::Primitive(p) => Target::Primitive(p),
                UniverseItem::Std(item) => Target::Item(item),
            });
        }
        self.extern_crate(name, span)
    }

    /// Looks `name` up among the items, `use` names and glob imports of a
    /// module of the checked package.
    pub fn lookup_local(
        &mut self,
        module: &str,
        name: &str,
        span: Span,
    ) -> Result<Option<Target>, ResolveError> {
        let scopes = self.scopes;
        let Some(scope) = scopes.get(module) else {
            return Ok(None);
        };

        if let Some(item) = scope.items.get(name) {
            return self
                .local_target(&join_path(module, name), *item, span)
                .map(Some);
        }

        if let Some(entry) = scope.uses.get(name) {
            let key = (module.to_string(), name.to_string());
            if !self.use_stack.insert(key.clone()) {
                return Err(ResolveError::unresolved(
                    format!("cyclic import of `{name}`"),
                    entry.span,
                ));
            }
            let result =
                self.resolve_segments(module, entry.leading_colon, &entry.segments, entry.span);
            self.use_stack.remove(&key);
            return result.map(Some);
        }

        for glob in &scope.globs {
            let key = (module.to_string(), format!("*{}", glob.segments.join("::")));
            if !self.use_stack.insert(key.clone()) {
                continue;
            }
            let resolved =
                self.resolve_segments(module, glob.leading_colon, &glob.segments, glob.span);
            // Opaque modules cannot say what they export; they never shadow
            // the prelude.
            let prelude_name = universe::lookup(name).is_some();
            let found = match resolved {
                Ok(Target::Module(ModuleLoc::Foreign(package, _)))
                    if package.opaque && prelude_name =>
                {
                    Ok(None)
                }
                Ok(Target::Module(loc)) => self.lookup_in_module(&loc, name, span),
                Ok(Target::Opaque(item)) if !prelude_name => Ok(Some(Target::Opaque(
                    ItemRef::new(item.package, join_path(&item.path, name)),
                ))),
                Ok(_) => Ok(None),
                Err(ResolveError::Import(err)) => Err(ResolveError::Import(err)),
                // Globs over enums or unknown modules contribute nothing.
                Err(_) => Ok(None),
            };
            self.use_stack.remove(&key);
            if let Some(target) = found? {
                return Ok(Some(target));
            }
        }
        Ok(None)
    }

    fn lookup_in_module(
        &mut self,
        loc: &ModuleLoc,
        name: &str,
        span: Span,
    ) -> Result<Option<Target>, ResolveError> {
        match loc {
            ModuleLoc::Local(module) => self.lookup_local(module, name, span),
            ModuleLoc::Foreign(package, module) => {
                self.foreign_child(&Arc::clone(package), module, name, 0)
            }
        }
    }

    fn step(
        &mut self,
        target: Target,
        segment: &str,
        walked: &str,
        span: Span,
    ) -> Result<Target, ResolveError> {
        let not_found = || {
            ResolveError::unresolved(format!("cannot find `{segment}` in `{walked}`"), span)
        };
        match target {
            Target::Module(ModuleLoc::Local(module)) => {
                if segment == "super" {
                    return Ok(Target::Module(ModuleLoc::Local(parent_module(&module, span)?)));
                }
                self.lookup_local(&module, segment, span)?.ok_or_else(not_found)
            }
            Target::Module(ModuleLoc::Foreign(package, module)) => self
                .foreign_child(&package, &module, segment, 0)?
                .ok_or_else(not_found),
            Target::Opaque(item) => Ok(Target::Opaque(ItemRef::new(
                item.package,
                join_path(&item.path, segment),
            ))),
            Target::Item(_) | Target::Alias(_) | Target::Primitive(_) => Err(
                ResolveError::Unsupported(format!("associated item path `{walked}::{segment}`")),
            ),
        }
    }

    fn foreign_child(
        &mut self,
        package: &Arc<PackageTypes>,
        module: &str,
        name: &str,
        depth: usize,
    ) -> Result<Option<Target>, ResolveError> {
        let full = join_path(module, name);
        match package.get(&full) {
            Some(def) => self.foreign_target(package, &full, def, depth).map(Some),
            None if package.opaque => Ok(Some(Target::Opaque(ItemRef::new(
                package.path.clone(),
                full,
            )))),
            None => Ok(None),
        }
    }

    fn foreign_target(
        &mut self,
        package: &Arc<PackageTypes>,
        full: &str,
        def: &ItemDef,
        depth: usize,
    ) -> Result<Target, ResolveError> {
        Ok(match &def.kind {
            ItemKind::Module => Target::Module(ModuleLoc::Foreign(Arc::clone(package), full.to_string())),
            ItemKind::Trait(_) | ItemKind::Type => {
                Target::Item(ItemRef::new(package.path.clone(), full))
            }
            ItemKind::Alias(alias) => Target::Alias(alias.clone()),
            ItemKind::Reexport(target) => return self.follow_reexport(target, depth + 1),
        })
    }

    /// Follows a recorded re-export to the item it names.
    fn follow_reexport(&mut self, target: &ItemRef, depth: usize) -> Result<Target, ResolveError> {
        let span = Span::call_site();
        if depth > MAX_REEXPORT_DEPTH {
            return Err(ResolveError::unresolved(
                format!("re-export chain through {target} is too deep"),
                span,
            ));
        }
        if universe::is_std_crate(&target.package) {
            return Ok(Target::Opaque(target.clone()));
        }
        if target.package == self.package {
            let mut segments = vec!["crate".to_string()];
            segments.extend(target.segments().map(str::to_string));
            return self.resolve_segments("", false, &segments, span);
        }

        let package = self.import_package(&target.package, span)?;
        if target.path.is_empty() {
            return Ok(Target::Module(ModuleLoc::Foreign(package, String::new())));
        }
        let (module, name) = target
            .path
            .rsplit_once("::")
            .unwrap_or(("", target.path.as_str()));
        self.foreign_child(&package, module, name, depth)?
            .ok_or_else(|| ResolveError::unresolved(format!("re-exported item {target} not found"), span))
    }

    fn local_target(
        &mut self,
        path: &str,
        item: LocalItem<'a>,
        span: Span,
    ) -> Result<Target, ResolveError> {
        Ok(match item.kind {
            LocalKind::Trait(_) | LocalKind::Type => {
                Target::Item(ItemRef::new(self.package.clone(), path))
            }
            LocalKind::Module => Target::Module(ModuleLoc::Local(path.to_string())),
            LocalKind::Alias(alias) => {
                Target::Alias(self.local_alias(path, alias, item.file, span)?)
            }
        })
    }

    /// Lowers a local type alias into a template, once.
    pub fn local_alias(
        &mut self,
        path: &str,
        alias: &syn::ItemType,
        file: usize,
        span: Span,
    ) -> Result<AliasDef, ResolveError> {
        if let Some(def) = self.aliases.get(path) {
            return Ok(def.clone());
        }
        if !self.alias_stack.insert(path.to_string()) {
            return Err(ResolveError::unresolved(
                format!("type alias `{path}` refers to itself"),
                span,
            ));
        }

        let result = self.lower_alias(path, alias).map_err(|e| e.in_file(file));
        self.alias_stack.remove(path);
        let def = result?;
        tracing::trace!(alias = path, target = %def.target, "expanded type alias");
        self.aliases.insert(path.to_string(), def.clone());
        Ok(def)
    }

    fn lower_alias(&mut self, path: &str, alias: &syn::ItemType) -> Result<AliasDef, ResolveError> {
        let mut params = Vec::new();
        for param in &alias.generics.params {
            match param {
                syn::GenericParam::Type(tp) => params.push(tp.ident.to_string()),
                syn::GenericParam::Lifetime(_) => {}
                syn::GenericParam::Const(_) => {
                    return Err(ResolveError::Unsupported(
                        "const generic type aliases".into(),
                    ))
                }
            }
        }
        let module = match path.rfind("::") {
            Some(i) => &path[..i],
            None => "",
        };
        let cx = super::lower::TyCtx {
            module,
            params: &params,
        };
        let target = self.lower_type(&cx, &alias.ty)?;
        Ok(AliasDef { params, target })
    }

    /// Resolves an extern crate name to the root module of its package.
    fn extern_crate(&mut self, name: &str, span: Span) -> Result<Target, ResolveError> {
        if universe::is_std_crate(name) {
            return Ok(Target::Module(ModuleLoc::Foreign(
                Arc::clone(&self.std),
                String::new(),
            )));
        }
        let Some(path) = self.importer.import_path_for_crate(name) else {
            return Err(ResolveError::unresolved(
                format!("unresolved crate or module `{name}`"),
                span,
            ));
        };
        let package = self.import_package(&path, span)?;
        Ok(Target::Module(ModuleLoc::Foreign(package, String::new())))
    }

    fn import_package(&mut self, path: &str, span: Span) -> Result<Arc<PackageTypes>, ResolveError> {
        match self.importer.import(path) {
            Ok(package) => {
                if package.path != self.package {
                    self.imports.insert(package.path.clone());
                }
                Ok(package)
            }
            Err(err @ (ImportError::NotFound { .. } | ImportError::Source { .. })) => Err(
                ResolveError::unresolved(format!("could not import {path}: {err}"), span),
            ),
            Err(err) => Err(ResolveError::Import(err)),
        }
    }

    /// Public members of a module, for expanding `pub use m::*`.
    pub fn module_members(&self, loc: &ModuleLoc) -> Vec<(String, ItemRef)> {
        match loc {
            ModuleLoc::Local(module) => self
                .scopes
                .get(module)
                .map(|scope| {
                    scope
                        .items
                        .iter()
                        .filter(|(_, item)| item.visibility.is_public())
                        .map(|(name, _)| {
                            (
                                name.clone(),
                                ItemRef::new(self.package.clone(), join_path(module, name)),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
            ModuleLoc::Foreign(package, module) => package
                .items
                .iter()
                .filter(|(_, def)| &def.module == module && def.visibility.is_public())
                .map(|(path, def)| (def.name.clone(), ItemRef::new(package.path.clone(), path)))
                .collect(),
        }
    }

    /// How a resolved `pub use` is recorded in the package's item table.
    pub fn reexport_kind(&self, target: Target) -> Option<ItemKind> {
        match settle(target) {
            Target::Item(item) => Some(ItemKind::Reexport(item)),
            Target::Alias(def) => Some(ItemKind::Alias(def)),
            Target::Module(ModuleLoc::Local(module)) => {
                Some(ItemKind::Reexport(ItemRef::new(self.package.clone(), module)))
            }
            Target::Module(ModuleLoc::Foreign(package, module)) => {
                Some(ItemKind::Reexport(ItemRef::new(package.path.clone(), module)))
            }
            Target::Opaque(item) => Some(ItemKind::Reexport(item)),
            Target::Primitive(_) => None,
        }
    }
}

/// Turns an opaque std path into its canonical item or alias.
pub(crate) fn settle(target: Target) -> Target {
    match target {
        Target::Opaque(item) if universe::is_std_crate(&item.package) => {
            match universe::std_alias(universe::canonical_std_path(&item.path)) {
                Some(alias) => Target::Alias(alias),
                None => Target::Item(universe::std_item(&item.path)),
            }
        }
        other => other,
    }
}

fn parent_module(module: &str, span: Span) -> Result<String, ResolveError> {
    if module.is_empty() {
        return Err(ResolveError::unresolved(
            "there are too many leading `super` keywords",
            span,
        ));
    }
    Ok(match module.rfind("::") {
        Some(i) => module[..i].to_string(),
        None => String::new(),
    })
}
