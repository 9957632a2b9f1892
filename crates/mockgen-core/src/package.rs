//! Static type information of one package.
//!
//! [`PackageTypes`] is what the type checker produces for a package and what
//! an export file stores: a table of every item declared by the package,
//! keyed by its path inside the package, with trait signatures fully
//! resolved into [`TypeDescriptor`]s.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{ItemRef, TypeDescriptor};

/// Visibility of a declared item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// `pub`.
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in path)`.
    Restricted,
    /// No visibility qualifier.
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A lifetime parameter of a method, without the leading `'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifetimeParam {
    pub name: String,
    /// Outlives bounds (`'a: 'b` gives `["b"]`).
    pub bounds: Vec<String>,
}

/// The receiver of a trait method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Receiver {
    /// `&self` / `&'a self`.
    Ref { lifetime: Option<String> },
    /// `&mut self` / `&'a mut self`.
    RefMut { lifetime: Option<String> },
}

impl Receiver {
    pub fn is_mut(&self) -> bool {
        matches!(self, Receiver::RefMut { .. })
    }

    pub fn lifetime(&self) -> Option<&str> {
        match self {
            Receiver::Ref { lifetime } | Receiver::RefMut { lifetime } => lifetime.as_deref(),
        }
    }
}

/// One declared parameter of a trait method (receiver excluded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamSig {
    /// The binding name when the pattern was a plain identifier.
    pub name: Option<String>,
    pub ty: TypeDescriptor,
}

/// A resolved trait method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub receiver: Receiver,
    pub lifetimes: Vec<LifetimeParam>,
    pub params: Vec<ParamSig>,
    /// The declared return type; unit when omitted.
    pub output: TypeDescriptor,
    pub is_unsafe: bool,
}

/// A resolved trait declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDef {
    pub name: String,
    pub is_unsafe: bool,
    /// Trait supertraits in declared order. Lifetime bounds are dropped.
    pub supertraits: Vec<ItemRef>,
    /// Methods in declaration order.
    pub methods: Vec<MethodSig>,
    /// Why a mock cannot be generated for this trait, if it cannot.
    pub unsupported: Option<String>,
}

/// A type alias template, `type Name<P..> = target;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDef {
    pub params: Vec<String>,
    pub target: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Trait(TraitDef),
    /// A struct, enum or union. Its shape is irrelevant to mock generation.
    Type,
    Alias(AliasDef),
    /// A `pub use` re-export of an item declared elsewhere.
    Reexport(ItemRef),
    Module,
}

/// An item declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    /// Path of the enclosing module inside the package; empty at the root.
    pub module: String,
    pub visibility: Visibility,
    pub kind: ItemKind,
}

impl ItemDef {
    /// The item's full path inside its package.
    pub fn path(&self) -> String {
        join_path(&self.module, &self.name)
    }

    pub fn as_trait(&self) -> Option<&TraitDef> {
        match &self.kind {
            ItemKind::Trait(def) => Some(def),
            _ => None,
        }
    }
}

/// Joins a module path and an item name with `::`.
pub fn join_path(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{module}::{name}")
    }
}

/// Resolved static type information of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTypes {
    /// The import path identifying the package.
    pub path: String,
    /// The name source code uses to refer to the package.
    pub crate_name: String,
    /// Set for packages whose items are not known (std, crates without
    /// sources). Lookups into an opaque package succeed by name.
    pub opaque: bool,
    /// Items keyed by their full path inside the package, in declaration order.
    pub items: IndexMap<String, ItemDef>,
    /// Import paths of packages referenced by this package's signatures.
    pub imports: Vec<String>,
}

impl PackageTypes {
    pub fn new(path: impl Into<String>, crate_name: impl Into<String>) -> Self {
        PackageTypes {
            path: path.into(),
            crate_name: crate_name.into(),
            opaque: false,
            items: IndexMap::new(),
            imports: Vec::new(),
        }
    }

    pub fn opaque(path: impl Into<String>, crate_name: impl Into<String>) -> Self {
        PackageTypes {
            opaque: true,
            ..PackageTypes::new(path, crate_name)
        }
    }

    pub fn insert(&mut self, item: ItemDef) {
        self.items.insert(item.path(), item);
    }

    pub fn get(&self, path: &str) -> Option<&ItemDef> {
        self.items.get(path)
    }

    /// Traits in declaration order, paired with their full paths.
    pub fn traits(&self) -> impl Iterator<Item = (&str, &ItemDef, &TraitDef)> {
        self.items
            .iter()
            .filter_map(|(path, item)| item.as_trait().map(|def| (path.as_str(), item, def)))
    }

    /// Whether an item is nameable from outside the package: it is public and
    /// so is every module enclosing it.
    pub fn is_reachable(&self, path: &str) -> bool {
        let Some(item) = self.items.get(path) else {
            return false;
        };
        if !item.visibility.is_public() {
            return false;
        }
        let mut module = item.module.as_str();
        while !module.is_empty() {
            match self.items.get(module) {
                Some(m) if m.visibility.is_public() => {}
                _ => return false,
            }
            module = match module.rfind("::") {
                Some(i) => &module[..i],
                None => "",
            };
        }
        true
    }

    /// The public surface of the package, as recorded in export files.
    pub fn exported(&self) -> PackageTypes {
        let items = self
            .items
            .iter()
            .filter(|(path, _)| self.is_reachable(path))
            .map(|(path, item)| (path.clone(), item.clone()))
            .collect();
        PackageTypes {
            path: self.path.clone(),
            crate_name: self.crate_name.clone(),
            opaque: self.opaque,
            items,
            imports: self.imports.clone(),
        }
    }

    /// Rewrites every reference to package `from` (including the package's
    /// own path) so that it names `to`.
    pub fn rebase(&mut self, from: &str, to: &str) {
        let mut rewrite = |package: &mut String| {
            if package == from {
                *package = to.to_string();
            }
        };
        rewrite(&mut self.path);
        for import in &mut self.imports {
            rewrite(import);
        }
        for item in self.items.values_mut() {
            match &mut item.kind {
                ItemKind::Trait(def) => {
                    for sup in &mut def.supertraits {
                        rewrite(&mut sup.package);
                    }
                    for method in &mut def.methods {
                        for param in &mut method.params {
                            param.ty.map_packages(&mut rewrite);
                        }
                        method.output.map_packages(&mut rewrite);
                    }
                }
                ItemKind::Alias(alias) => alias.target.map_packages(&mut rewrite),
                ItemKind::Reexport(target) => rewrite(&mut target.package),
                ItemKind::Type | ItemKind::Module => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;

    fn item(name: &str, module: &str, visibility: Visibility, kind: ItemKind) -> ItemDef {
        ItemDef {
            name: name.into(),
            module: module.into(),
            visibility,
            kind,
        }
    }

    fn empty_trait(name: &str) -> ItemKind {
        ItemKind::Trait(TraitDef {
            name: name.into(),
            is_unsafe: false,
            supertraits: vec![],
            methods: vec![],
            unsupported: None,
        })
    }

    fn sample() -> PackageTypes {
        let mut pkg = PackageTypes::new("github.com/acme/store", "store");
        pkg.insert(item("api", "", Visibility::Public, ItemKind::Module));
        pkg.insert(item("internal", "", Visibility::Private, ItemKind::Module));
        pkg.insert(item("Store", "api", Visibility::Public, empty_trait("Store")));
        pkg.insert(item("Hidden", "internal", Visibility::Public, empty_trait("Hidden")));
        pkg.insert(item("Local", "", Visibility::Private, empty_trait("Local")));
        pkg
    }

    #[test]
    fn reachability_requires_public_ancestors() {
        let pkg = sample();
        assert!(pkg.is_reachable("api::Store"));
        assert!(!pkg.is_reachable("internal::Hidden"));
        assert!(!pkg.is_reachable("Local"));
        assert!(!pkg.is_reachable("missing"));
    }

    #[test]
    fn exported_keeps_public_surface_in_order() {
        let exported = sample().exported();
        let paths: Vec<_> = exported.items.keys().cloned().collect();
        assert_eq!(paths, vec!["api", "api::Store"]);
    }

    #[test]
    fn traits_iterate_in_declaration_order() {
        let pkg = sample();
        let names: Vec<_> = pkg.traits().map(|(path, _, _)| path.to_string()).collect();
        assert_eq!(names, vec!["api::Store", "internal::Hidden", "Local"]);
    }

    #[test]
    fn rebase_rewrites_self_references() {
        let mut pkg = PackageTypes::new("declared/path", "path");
        pkg.insert(item(
            "Reader",
            "",
            Visibility::Public,
            ItemKind::Trait(TraitDef {
                name: "Reader".into(),
                is_unsafe: false,
                supertraits: vec![ItemRef::new("declared/path", "Base")],
                methods: vec![MethodSig {
                    name: "read".into(),
                    receiver: Receiver::Ref { lifetime: None },
                    lifetimes: vec![],
                    params: vec![ParamSig {
                        name: Some("id".into()),
                        ty: TypeDescriptor::Primitive(Primitive::U64),
                    }],
                    output: TypeDescriptor::named(ItemRef::new("declared/path", "Record")),
                    is_unsafe: false,
                }],
                unsupported: None,
            }),
        ));
        pkg.rebase("declared/path", "registered/path");

        assert_eq!(pkg.path, "registered/path");
        let def = pkg.get("Reader").and_then(ItemDef::as_trait).unwrap();
        assert_eq!(def.supertraits[0].package, "registered/path");
        assert_eq!(
            def.methods[0].output,
            TypeDescriptor::named(ItemRef::new("registered/path", "Record"))
        );
    }
}
