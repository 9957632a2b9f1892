//! Per-module item and `use` tables.
//!
//! Collection is purely syntactic: every module of the crate (file or inline)
//! gets a [`ModuleScope`] listing the type-namespace items it declares and
//! the names its `use` declarations bring in. Nothing is resolved here.

use indexmap::IndexMap;
use proc_macro2::Span;

use mockgen_core::Visibility;

use crate::parse::{child_module, is_cfg_test, SourceFile};

/// A type-namespace item declared in a module.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LocalKind<'a> {
    Trait(&'a syn::ItemTrait),
    /// Struct, enum or union.
    Type,
    Alias(&'a syn::ItemType),
    Module,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalItem<'a> {
    pub kind: LocalKind<'a>,
    pub visibility: Visibility,
    /// Index of the declaring file.
    pub file: usize,
}

/// One name introduced by a `use` (or `extern crate`) declaration.
#[derive(Debug, Clone)]
pub(crate) struct UseEntry {
    pub segments: Vec<String>,
    pub leading_colon: bool,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Default)]
pub(crate) struct ModuleScope<'a> {
    pub items: IndexMap<String, LocalItem<'a>>,
    pub uses: IndexMap<String, UseEntry>,
    pub globs: Vec<UseEntry>,
}

/// Scopes of every module of a crate, in discovery order.
#[derive(Debug, Default)]
pub(crate) struct Scopes<'a> {
    pub modules: IndexMap<String, ModuleScope<'a>>,
}

impl<'a> Scopes<'a> {
    pub fn collect(files: &'a [SourceFile]) -> Self {
        let mut scopes = Scopes::default();
        for (index, file) in files.iter().enumerate() {
            scopes.collect_items(&file.module, &file.ast.items, index);
        }
        scopes
    }

    pub fn get(&self, module: &str) -> Option<&ModuleScope<'a>> {
        self.modules.get(module)
    }

    fn collect_items(&mut self, module: &str, items: &'a [syn::Item], file: usize) {
        self.modules.entry(module.to_string()).or_default();
        for item in items {
            self.collect_item(module, item, file);
        }
    }

    fn collect_item(&mut self, module: &str, item: &'a syn::Item, file: usize) {
        let (name, visibility, kind) = match item {
            syn::Item::Trait(t) => {
                if is_cfg_test(&t.attrs) {
                    return;
                }
                (t.ident.to_string(), visibility_of(&t.vis), LocalKind::Trait(t))
            }
            syn::Item::Struct(s) if !is_cfg_test(&s.attrs) => {
                (s.ident.to_string(), visibility_of(&s.vis), LocalKind::Type)
            }
            syn::Item::Enum(e) if !is_cfg_test(&e.attrs) => {
                (e.ident.to_string(), visibility_of(&e.vis), LocalKind::Type)
            }
            syn::Item::Union(u) if !is_cfg_test(&u.attrs) => {
                (u.ident.to_string(), visibility_of(&u.vis), LocalKind::Type)
            }
            syn::Item::Type(t) if !is_cfg_test(&t.attrs) => {
                (t.ident.to_string(), visibility_of(&t.vis), LocalKind::Alias(t))
            }
            syn::Item::Mod(m) if !is_cfg_test(&m.attrs) => {
                let name = m.ident.to_string();
                if let Some((_, inner)) = &m.content {
                    self.collect_items(&child_module(module, &name), inner, file);
                }
                (name, visibility_of(&m.vis), LocalKind::Module)
            }
            syn::Item::Use(u) if !is_cfg_test(&u.attrs) => {
                let scope = self.modules.entry(module.to_string()).or_default();
                let visibility = visibility_of(&u.vis);
                let mut prefix = Vec::new();
                flatten_use_tree(
                    &u.tree,
                    &mut prefix,
                    u.leading_colon.is_some(),
                    visibility,
                    scope,
                );
                return;
            }
            syn::Item::ExternCrate(e) if !is_cfg_test(&e.attrs) => {
                let crate_name = e.ident.to_string();
                if crate_name == "self" {
                    return;
                }
                let alias = e
                    .rename
                    .as_ref()
                    .map(|(_, ident)| ident.to_string())
                    .unwrap_or_else(|| crate_name.clone());
                let scope = self.modules.entry(module.to_string()).or_default();
                scope.uses.insert(
                    alias,
                    UseEntry {
                        segments: vec![crate_name],
                        leading_colon: true,
                        visibility: visibility_of(&e.vis),
                        span: e.ident.span(),
                    },
                );
                return;
            }
            _ => return,
        };

        let scope = self.modules.entry(module.to_string()).or_default();
        scope.items.insert(
            name,
            LocalItem {
                kind,
                visibility,
                file,
            },
        );
    }
}

/// Flattens a use tree into one entry per introduced name.
fn flatten_use_tree(
    tree: &syn::UseTree,
    prefix: &mut Vec<String>,
    leading_colon: bool,
    visibility: Visibility,
    scope: &mut ModuleScope<'_>,
) {
    match tree {
        syn::UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            flatten_use_tree(&p.tree, prefix, leading_colon, visibility, scope);
            prefix.pop();
        }
        syn::UseTree::Name(n) => {
            let ident = n.ident.to_string();
            // `use a::b::{self}` names the module `b`.
            let (alias, segments) = if ident == "self" {
                match prefix.last() {
                    Some(last) => (last.clone(), prefix.clone()),
                    None => return,
                }
            } else {
                let mut segments = prefix.clone();
                segments.push(ident.clone());
                (ident, segments)
            };
            scope.uses.insert(
                alias,
                UseEntry {
                    segments,
                    leading_colon,
                    visibility,
                    span: n.ident.span(),
                },
            );
        }
        syn::UseTree::Rename(r) => {
            let alias = r.rename.to_string();
            if alias == "_" {
                return;
            }
            let ident = r.ident.to_string();
            let segments = if ident == "self" {
                prefix.clone()
            } else {
                let mut segments = prefix.clone();
                segments.push(ident);
                segments
            };
            scope.uses.insert(
                alias,
                UseEntry {
                    segments,
                    leading_colon,
                    visibility,
                    span: r.ident.span(),
                },
            );
        }
        syn::UseTree::Glob(g) => scope.globs.push(UseEntry {
            segments: prefix.clone(),
            leading_colon,
            visibility,
            span: g.star_token.spans[0],
        }),
        syn::UseTree::Group(g) => {
            for item in &g.items {
                flatten_use_tree(item, prefix, leading_colon, visibility, scope);
            }
        }
    }
}

pub(crate) fn visibility_of(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(_) => Visibility::Restricted,
        syn::Visibility::Inherited => Visibility::Private,
    }
}
