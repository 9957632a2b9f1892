//! Contract extraction.
//!
//! Selects the requested traits of loaded packages and flattens each into an
//! [`InterfaceDescriptor`]: supertrait methods first, depth first in declared
//! order, then the trait's own methods. A supertrait reached along several
//! paths contributes its methods once.

use indexmap::{IndexMap, IndexSet};

use mockgen_core::{InterfaceDescriptor, ItemRef, MethodDescriptor, TraitDef, TraitImpl};

use crate::error::ExtractError;
use crate::loader::Package;

/// Std supertraits the generated holder satisfies itself.
const HOLDER_TRAITS: &[&str] = &[
    "marker::Send",
    "marker::Sync",
    "marker::Sized",
    "marker::Unpin",
    "clone::Clone",
    "default::Default",
    "fmt::Debug",
];

/// One output group's selection.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRequest {
    pub import_paths: Vec<String>,
    /// Trait names to mock; empty selects every mockable trait.
    pub interfaces: Vec<String>,
    pub exclude: Vec<String>,
    pub prefix: Option<String>,
}

impl InterfaceRequest {
    fn includes(&self, name: &str) -> bool {
        let listed = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(name));
        (self.interfaces.is_empty() || listed(&self.interfaces)) && !listed(&self.exclude)
    }

    fn names(&self, name: &str) -> bool {
        self.interfaces.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Extracts the interfaces of every request, in request order and then
/// declaration order.
pub fn extract(packages: &[Package], requests: &[InterfaceRequest]) -> Result<Vec<InterfaceDescriptor>, ExtractError> {
    let mut out = Vec::new();
    for request in requests {
        out.extend(extract_request(packages, request)?);
    }
    Ok(out)
}

fn extract_request(packages: &[Package], request: &InterfaceRequest) -> Result<Vec<InterfaceDescriptor>, ExtractError> {
    // Lowercased name to (display path, descriptor).
    let mut selected: IndexMap<String, (String, InterfaceDescriptor)> = IndexMap::new();

    for path in &request.import_paths {
        let package = packages
            .iter()
            .find(|p| &p.import_path == path)
            .ok_or_else(|| ExtractError::PackageNotLoaded { path: path.clone() })?;

        for (item_path, _, def) in package.types.traits() {
            if !request.includes(&def.name) {
                continue;
            }
            let trait_ref = ItemRef::new(package.types.path.clone(), item_path);
            if let Some(reason) = &def.unsupported {
                if request.names(&def.name) {
                    return Err(ExtractError::UnsupportedInterface {
                        name: def.name.clone(),
                        reason: reason.clone(),
                    });
                }
                tracing::debug!(interface = %trait_ref, %reason, "skipping unsupported trait");
                continue;
            }

            let key = def.name.to_lowercase();
            if let Some((first, _)) = selected.get(&key) {
                return Err(ExtractError::DuplicateInterface {
                    name: def.name.clone(),
                    first: first.clone(),
                    second: trait_ref.to_string(),
                });
            }

            let descriptor = flatten(package, &trait_ref, def, request.prefix.clone())?;
            tracing::debug!(
                interface = %trait_ref,
                methods = descriptor.methods.len(),
                "extracted interface"
            );
            selected.insert(key, (trait_ref.to_string(), descriptor));
        }
    }

    if let Some(missing) = request
        .interfaces
        .iter()
        .find(|name| !selected.contains_key(&name.to_lowercase()))
    {
        return Err(ExtractError::InterfaceNotFound {
            name: missing.clone(),
        });
    }

    Ok(selected.into_values().map(|(_, d)| d).collect())
}

/// Flattens `def` and its supertraits into one descriptor.
pub fn flatten(
    package: &Package,
    trait_ref: &ItemRef,
    def: &TraitDef,
    prefix: Option<String>,
) -> Result<InterfaceDescriptor, ExtractError> {
    let mut flattener = Flattener {
        package,
        interface: def.name.clone(),
        visited: IndexSet::new(),
        methods: IndexMap::new(),
        implements: Vec::new(),
    };
    flattener.visit_def(trait_ref, def)?;

    Ok(InterfaceDescriptor {
        name: def.name.clone(),
        package: trait_ref.package.clone(),
        trait_ref: trait_ref.clone(),
        prefix,
        methods: flattener.methods.into_values().collect(),
        implements: flattener.implements,
    })
}

struct Flattener<'p> {
    package: &'p Package,
    interface: String,
    visited: IndexSet<ItemRef>,
    methods: IndexMap<String, MethodDescriptor>,
    implements: Vec<TraitImpl>,
}

impl Flattener<'_> {
    fn visit(&mut self, item: &ItemRef) -> Result<(), ExtractError> {
        if self.visited.contains(item) || item.is_std_item(HOLDER_TRAITS) {
            return Ok(());
        }
        let unresolved = || ExtractError::UnresolvedSupertrait {
            interface: self.interface.clone(),
            supertrait: item.to_string(),
        };
        let package = self.package;
        let def = package
            .package_types(&item.package)
            .filter(|types| !types.opaque)
            .and_then(|types| types.get(&item.path))
            .and_then(|def| def.as_trait())
            .ok_or_else(unresolved)?;
        if let Some(reason) = &def.unsupported {
            return Err(ExtractError::UnsupportedInterface {
                name: self.interface.clone(),
                reason: format!("supertrait {item}: {reason}"),
            });
        }
        self.visit_def(item, def)
    }

    fn visit_def(&mut self, item: &ItemRef, def: &TraitDef) -> Result<(), ExtractError> {
        self.visited.insert(item.clone());
        for supertrait in &def.supertraits {
            self.visit(supertrait)?;
        }

        for sig in &def.methods {
            if let Some(existing) = self.methods.get(&sig.name) {
                return Err(ExtractError::ConflictingMethod {
                    interface: self.interface.clone(),
                    method: sig.name.clone(),
                    first: existing.owner.to_string(),
                    second: item.to_string(),
                });
            }
            self.methods
                .insert(sig.name.clone(), MethodDescriptor::from_sig(item.clone(), sig));
        }
        self.implements.push(TraitImpl {
            item: item.clone(),
            is_unsafe: def.is_unsafe,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use mockgen_archive::ArchiveImporter;

    use super::*;
    use crate::parse::SourceFile;
    use crate::typecheck::{check_package, CheckMode};

    const PATH: &str = "example.com/shapes";

    fn package(text: &str) -> Package {
        let files = vec![SourceFile {
            path: PathBuf::from("lib.rs"),
            module: String::new(),
            ast: syn::parse_str(text).unwrap(),
        }];
        let mut importer = ArchiveImporter::default();
        let types = check_package(PATH, "shapes", &files, &mut importer, CheckMode::Strict).unwrap();
        Package {
            import_path: PATH.into(),
            sources: vec![PathBuf::from("lib.rs")],
            syntax: files.into_iter().map(|f| f.ast).collect(),
            types: Arc::new(types),
            imports: Vec::new(),
        }
    }

    fn request(interfaces: &[&str]) -> InterfaceRequest {
        InterfaceRequest {
            import_paths: vec![PATH.into()],
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn method_names(d: &InterfaceDescriptor) -> Vec<&str> {
        d.methods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn supertrait_methods_come_first() {
        let pkg = package("pub trait A { fn foo(&self); } pub trait B: A { fn bar(&self); }");
        let out = extract(&[pkg], &[request(&["B"])]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(method_names(&out[0]), vec!["foo", "bar"]);
        let implements: Vec<_> = out[0].implements.iter().map(|t| t.item.path.as_str()).collect();
        assert_eq!(implements, vec!["A", "B"]);
    }

    #[test]
    fn diamonds_are_flattened_once() {
        let pkg = package(
            "pub trait Base { fn id(&self) -> u64; }
             pub trait Left: Base { fn left(&self); }
             pub trait Right: Base { fn right(&self); }
             pub trait Both: Left + Right + Send + Sync + std::fmt::Debug { fn both(&self); }",
        );
        let out = extract(&[pkg], &[request(&["Both"])]).unwrap();
        assert_eq!(method_names(&out[0]), vec!["id", "left", "right", "both"]);
        assert_eq!(out[0].implements.len(), 4);
    }

    #[test]
    fn same_name_from_two_traits_conflicts() {
        let pkg = package(
            "pub trait Reader { fn open(&self); }
             pub trait Writer { fn open(&self); }
             pub trait File: Reader + Writer {}",
        );
        let err = extract(&[pkg], &[request(&["File"])]).unwrap_err();
        assert!(matches!(err, ExtractError::ConflictingMethod { ref method, .. } if method == "open"));
    }

    #[test]
    fn names_match_case_insensitively() {
        let pkg = package("pub trait widget { fn spin(&self); }");
        let out = extract(&[pkg], &[request(&["Widget"])]).unwrap();
        assert_eq!(out[0].name, "widget");
    }

    #[test]
    fn missing_interface_is_named() {
        let pkg = package("pub trait Present {}");
        let err = extract(&[pkg], &[request(&["Present", "Absent"])]).unwrap_err();
        assert_eq!(err.to_string(), "type 'Absent' not found in supplied import paths");
    }

    #[test]
    fn exclude_filters_and_unsupported_are_skipped() {
        let pkg = package(
            "pub trait Keep { fn f(&self); }
             pub trait Drop2 { fn g(&self); }
             pub trait Generic<T> { fn h(&self, t: T); }",
        );
        let mut req = request(&[]);
        req.exclude = vec!["drop2".into()];
        let out = extract(&[pkg], &[req]).unwrap();
        let names: Vec<_> = out.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Keep"]);
    }

    #[test]
    fn requested_unsupported_trait_fails() {
        let pkg = package("pub trait Assoc { type Item; fn get(&self) -> Self::Item; }");
        let err = extract(&[pkg], &[request(&["Assoc"])]).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedInterface { .. }));
    }

    #[test]
    fn opaque_supertraits_are_unresolved() {
        let pkg = package("pub trait Stream: std::io::Read { fn more(&self); }");
        let err = extract(&[pkg], &[request(&["Stream"])]).unwrap_err();
        assert!(matches!(err, ExtractError::UnresolvedSupertrait { ref supertrait, .. } if supertrait == "std::io::Read"));
    }

    #[test]
    fn prefix_is_carried() {
        let pkg = package("pub trait Store {}");
        let mut req = request(&["Store"]);
        req.prefix = Some("Fake".into());
        let out = extract(&[pkg], &[req]).unwrap();
        assert_eq!(out[0].prefix.as_deref(), Some("Fake"));
    }
}
