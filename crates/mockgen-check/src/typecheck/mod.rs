//! Live type checking of a crate's trait surface.
//!
//! [`check_package`] builds the [`PackageTypes`] of a parsed crate: every
//! type-namespace item, with trait supertraits and method signatures fully
//! resolved, type aliases expanded and public re-exports recorded. Only the
//! declarations mock generation needs are checked; function bodies and
//! impls are never looked at.
//!
//! Two modes exist. [`CheckMode::Strict`] is used for requested packages and
//! fails on the first unresolvable name. [`CheckMode::Lenient`] is used for
//! dependency crates loaded from source: unresolvable names only mark the
//! affected trait unsupported.

pub mod diagnostics;
pub(crate) mod lower;
pub(crate) mod resolve;
pub(crate) mod scope;
pub(crate) mod universe;

pub use diagnostics::CheckError;

use mockgen_core::package::join_path;
use mockgen_core::{Importer, ItemDef, ItemKind, PackageTypes, TraitDef};

use crate::parse::SourceFile;

use resolve::{ResolveError, Resolver, Target};
use scope::{LocalKind, Scopes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Strict,
    Lenient,
}

/// Type checks a parsed crate registered under import path `path`.
pub fn check_package(
    path: &str,
    crate_name: &str,
    files: &[SourceFile],
    importer: &mut dyn Importer,
    mode: CheckMode,
) -> Result<PackageTypes, CheckError> {
    let scopes = Scopes::collect(files);
    let mut resolver = Resolver::new(&scopes, path, importer);
    let mut types = PackageTypes::new(path, crate_name);

    for (module, scope) in &scopes.modules {
        for (name, item) in &scope.items {
            let full = join_path(module, name);
            let kind = match item.kind {
                LocalKind::Module => ItemKind::Module,
                LocalKind::Type => ItemKind::Type,
                LocalKind::Alias(alias) => {
                    match resolver.local_alias(&full, alias, item.file, alias.ident.span()) {
                        Ok(def) => ItemKind::Alias(def),
                        Err(ResolveError::Unsupported(_)) => ItemKind::Type,
                        Err(err) => {
                            fail(files, item.file, err, mode)?;
                            ItemKind::Type
                        }
                    }
                }
                LocalKind::Trait(syntax) => match resolver.lower_trait(module, syntax) {
                    Ok(def) => ItemKind::Trait(def),
                    Err(err) => {
                        let reason = err.message();
                        fail(files, item.file, err, mode)?;
                        ItemKind::Trait(TraitDef {
                            name: name.clone(),
                            is_unsafe: syntax.unsafety.is_some(),
                            supertraits: Vec::new(),
                            methods: Vec::new(),
                            unsupported: Some(reason),
                        })
                    }
                },
            };
            types.insert(ItemDef {
                name: name.clone(),
                module: module.clone(),
                visibility: item.visibility,
                kind,
            });
        }
    }

    record_reexports(&scopes, &mut resolver, &mut types)?;

    types.imports = resolver.imports.iter().cloned().collect();
    tracing::debug!(
        package = path,
        items = types.items.len(),
        imports = types.imports.len(),
        "checked package"
    );
    Ok(types)
}

/// Propagates a resolution failure according to the check mode. Import
/// failures are always fatal.
fn fail(files: &[SourceFile], item_file: usize, err: ResolveError, mode: CheckMode) -> Result<(), CheckError> {
    match err {
        ResolveError::Import(import) => Err(CheckError::Import(import)),
        err if mode == CheckMode::Strict => {
            Err(CheckError::Diagnostic(diagnostics::diagnostic(files, item_file, &err)))
        }
        err => {
            tracing::debug!(reason = %err.message(), "ignoring unresolved name in dependency");
            Ok(())
        }
    }
}

/// Records `pub use` names (including globs) as re-exports so importers can
/// follow them. Uses of value-namespace items or unknown names are skipped.
fn record_reexports(
    scopes: &Scopes<'_>,
    resolver: &mut Resolver<'_, '_>,
    types: &mut PackageTypes,
) -> Result<(), CheckError> {
    for (module, scope) in &scopes.modules {
        for (alias, entry) in &scope.uses {
            if !entry.visibility.is_public() {
                continue;
            }
            let full = join_path(module, alias);
            if types.items.contains_key(&full) {
                continue;
            }
            let resolved =
                resolver.resolve_segments(module, entry.leading_colon, &entry.segments, entry.span);
            match resolved {
                Ok(target) => {
                    if let Some(kind) = resolver.reexport_kind(target) {
                        types.insert(ItemDef {
                            name: alias.clone(),
                            module: module.clone(),
                            visibility: entry.visibility,
                            kind,
                        });
                    }
                }
                Err(ResolveError::Import(err)) => return Err(CheckError::Import(err)),
                Err(_) => {}
            }
        }

        for glob in scope.globs.iter().filter(|g| g.visibility.is_public()) {
            let resolved =
                resolver.resolve_segments(module, glob.leading_colon, &glob.segments, glob.span);
            let loc = match resolved {
                Ok(Target::Module(loc)) => loc,
                Ok(_) => continue,
                Err(ResolveError::Import(err)) => return Err(CheckError::Import(err)),
                Err(_) => continue,
            };
            for (name, target) in resolver.module_members(&loc) {
                let full = join_path(module, &name);
                if types.items.contains_key(&full) {
                    continue;
                }
                types.insert(ItemDef {
                    name,
                    module: module.clone(),
                    visibility: glob.visibility,
                    kind: ItemKind::Reexport(target),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indexmap::IndexMap;
    use mockgen_core::{
        GenericArg, ImportError, ItemRef, Primitive, Receiver, TypeDescriptor, Visibility,
    };

    use super::*;

    /// An importer over a fixed set of packages keyed by crate name.
    #[derive(Default)]
    struct MapImporter {
        packages: IndexMap<String, Arc<PackageTypes>>,
    }

    impl MapImporter {
        fn with(mut self, package: PackageTypes) -> Self {
            self.packages
                .insert(package.crate_name.clone(), Arc::new(package));
            self
        }
    }

    impl Importer for MapImporter {
        fn import_path_for_crate(&self, crate_name: &str) -> Option<String> {
            self.packages.get(crate_name).map(|p| p.path.clone())
        }

        fn import(&mut self, path: &str) -> Result<Arc<PackageTypes>, ImportError> {
            self.packages
                .values()
                .find(|p| p.path == path)
                .cloned()
                .ok_or_else(|| ImportError::NotFound {
                    path: path.to_string(),
                    searched: None,
                })
        }

        fn imported(&self) -> Vec<Arc<PackageTypes>> {
            self.packages.values().cloned().collect()
        }
    }

    fn source(module: &str, text: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(if module.is_empty() { "lib.rs".to_string() } else { format!("{module}.rs") }),
            module: module.to_string(),
            ast: syn::parse_str(text).unwrap(),
        }
    }

    fn check(files: &[SourceFile], importer: &mut MapImporter) -> Result<PackageTypes, CheckError> {
        check_package("example.com/app", "app", files, importer, CheckMode::Strict)
    }

    fn trait_def<'p>(types: &'p PackageTypes, path: &str) -> &'p TraitDef {
        types.get(path).and_then(ItemDef::as_trait).unwrap()
    }

    fn named(item: ItemRef, args: Vec<GenericArg>) -> TypeDescriptor {
        TypeDescriptor::Named { item, args }
    }

    #[test]
    fn resolves_local_and_prelude_types() {
        let files = [source(
            "",
            r#"
            pub struct Widget;
            pub trait Store: Send + Sync {
                fn get(&self, id: u64) -> Option<Widget>;
                fn put(&mut self, w: Widget) -> Result<(), String>;
            }
            "#,
        )];
        let types = check(&files, &mut MapImporter::default()).unwrap();
        let store = trait_def(&types, "Store");
        assert_eq!(
            store.supertraits,
            vec![ItemRef::std("marker::Send"), ItemRef::std("marker::Sync")]
        );
        assert_eq!(
            store.methods[0].output,
            named(
                ItemRef::std("option::Option"),
                vec![GenericArg::Type(TypeDescriptor::named(ItemRef::new(
                    "example.com/app",
                    "Widget"
                )))]
            )
        );
        assert!(store.methods[1].receiver.is_mut());
        assert_eq!(store.methods[0].params[0].ty, TypeDescriptor::Primitive(Primitive::U64));
    }

    #[test]
    fn spellings_of_the_same_type_are_equal() {
        let files = [source(
            "",
            r#"
            use std::collections::hash_map::HashMap as Map;
            pub type Table<V> = std::collections::HashMap<String, V>;
            pub trait A {
                fn one(&self) -> Map<String, u8>;
                fn two(&self) -> Table<u8>;
                fn three(&self) -> ::core::option::Option<u8>;
                fn four(&self) -> Option<u8>;
                fn five(&self) -> std::io::Result<()>;
                fn six(&self) -> Result<(), std::io::Error>;
            }
            "#,
        )];
        let types = check(&files, &mut MapImporter::default()).unwrap();
        let methods = &trait_def(&types, "A").methods;
        assert_eq!(methods[0].output, methods[1].output);
        assert_eq!(methods[2].output, methods[3].output);
        assert_eq!(methods[4].output, methods[5].output);
    }

    #[test]
    fn resolves_across_modules() {
        let files = [
            source("", "pub mod model; pub mod api;"),
            source("model", "pub struct Row;"),
            source(
                "api",
                "use super::model::Row; pub trait Reader { fn read(&self) -> crate::model::Row; fn again(&self) -> Row; }",
            ),
        ];
        let types = check(&files, &mut MapImporter::default()).unwrap();
        let reader = trait_def(&types, "api::Reader");
        let row = TypeDescriptor::named(ItemRef::new("example.com/app", "model::Row"));
        assert_eq!(reader.methods[0].output, row);
        assert_eq!(reader.methods[1].output, row);
    }

    #[test]
    fn resolves_extern_crates_and_their_reexports() {
        let mut dep = PackageTypes::new("example.com/dep", "dep");
        for (name, module, kind) in [
            ("inner", "", ItemKind::Module),
            ("Thing", "inner", ItemKind::Type),
            ("Thing", "", ItemKind::Reexport(ItemRef::new("example.com/dep", "inner::Thing"))),
        ] {
            dep.insert(ItemDef {
                name: name.into(),
                module: module.into(),
                visibility: Visibility::Public,
                kind,
            });
        }
        let mut importer = MapImporter::default().with(dep);
        let files = [source("", "pub trait Uses { fn thing(&self) -> dep::Thing; }")];
        let types = check(&files, &mut importer).unwrap();
        assert_eq!(
            trait_def(&types, "Uses").methods[0].output,
            TypeDescriptor::named(ItemRef::new("example.com/dep", "inner::Thing"))
        );
        assert_eq!(types.imports, vec!["example.com/dep"]);
    }

    #[test]
    fn unresolved_names_are_positioned_diagnostics() {
        let files = [source("", "pub trait Broken {\n    fn f(&self) -> Missing;\n}\n")];
        let err = check(&files, &mut MapImporter::default()).unwrap_err();
        match err {
            CheckError::Diagnostic(d) => {
                assert_eq!(d.file, PathBuf::from("lib.rs"));
                assert_eq!(d.line, 2);
                assert!(d.message.contains("Missing"), "{}", d.message);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_mode_marks_trait_unsupported() {
        let files = [source("", "pub trait Broken { fn f(&self) -> Missing; }")];
        let types = check_package(
            "dep",
            "dep",
            &files,
            &mut MapImporter::default(),
            CheckMode::Lenient,
        )
        .unwrap();
        assert!(trait_def(&types, "Broken").unsupported.is_some());
    }

    #[test]
    fn unsupported_shapes_are_recorded_not_fatal() {
        let files = [source(
            "",
            r#"
            pub trait Generic<T> { fn f(&self, t: T); }
            pub trait Assoc { type Item; fn f(&self) -> Self::Item; }
            pub trait Async { async fn f(&self); }
            pub trait ByValue { fn f(self); }
            pub trait Fine { fn f(&self); }
            "#,
        )];
        let types = check(&files, &mut MapImporter::default()).unwrap();
        for name in ["Generic", "Assoc", "Async", "ByValue"] {
            assert!(trait_def(&types, name).unsupported.is_some(), "{name}");
        }
        assert!(trait_def(&types, "Fine").unsupported.is_none());
    }

    #[test]
    fn records_receiver_lifetimes_and_public_reexports() {
        let files = [
            source("", "mod private; pub use private::Hidden; pub use private::*;"),
            source(
                "private",
                "pub trait Hidden { fn name<'a>(&'a self, key: &'a str) -> &'a str; } pub struct Open;",
            ),
        ];
        let types = check(&files, &mut MapImporter::default()).unwrap();
        let hidden = trait_def(&types, "private::Hidden");
        assert_eq!(hidden.methods[0].receiver, Receiver::Ref { lifetime: Some("a".into()) });
        assert_eq!(hidden.methods[0].lifetimes[0].name, "a");

        assert_eq!(
            types.get("Hidden").map(|d| &d.kind),
            Some(&ItemKind::Reexport(ItemRef::new("example.com/app", "private::Hidden")))
        );
        assert!(types.get("Open").is_some());
        assert!(types.is_reachable("Hidden"));
        assert!(!types.is_reachable("private::Hidden"));
    }
}
