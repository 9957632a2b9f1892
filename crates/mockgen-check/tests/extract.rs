//! Integration tests for loading and extraction through the archive strategy.

use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use mockgen_archive::write_export_file;
use mockgen_check::{extract, load, InterfaceRequest, LoadError, LoadStrategy, Package};
use mockgen_core::{ArchiveRef, InterfaceDescriptor, TypeDescriptor};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const APP: &str = "example.com/app";

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn load_sources(path: &str, sources: Vec<PathBuf>, archives: Vec<ArchiveRef>) -> Result<Vec<Package>, LoadError> {
    let strategy = LoadStrategy::Archive {
        archives,
        sources,
        stdlib_root: None,
    };
    load(&[path.to_string()], &strategy)
}

fn request(path: &str, interfaces: &[&str]) -> InterfaceRequest {
    InterfaceRequest {
        import_paths: vec![path.to_string()],
        interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn one(packages: &[Package], path: &str, name: &str) -> InterfaceDescriptor {
    let mut out = extract(packages, &[request(path, &[name])]).unwrap();
    assert_eq!(out.len(), 1);
    out.remove(0)
}

fn names(d: &InterfaceDescriptor) -> Vec<String> {
    d.methods.iter().map(|m| m.name.clone()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn requested_name_matches_declared_casing() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(dir.path(), "src/lib.rs", "pub trait widget { fn spin(&self); }");
    let packages = load_sources(APP, vec![lib], Vec::new()).unwrap();
    let d = one(&packages, APP, "Widget");
    assert_eq!(d.name, "widget");
    assert_eq!(d.package, APP);
}

#[test]
fn embedded_methods_precede_own_methods() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(
        dir.path(),
        "src/lib.rs",
        "pub trait A { fn foo(&self); }\npub trait B: A { fn bar(&self); }\n",
    );
    let packages = load_sources(APP, vec![lib], Vec::new()).unwrap();
    assert_eq!(names(&one(&packages, APP, "B")), vec!["foo", "bar"]);
}

#[test]
fn module_files_map_to_module_paths() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(dir.path(), "src/lib.rs", "pub mod store;\npub mod model;\n");
    let store = write(
        dir.path(),
        "src/store/mod.rs",
        "use crate::model::Row;\npub trait Store { fn rows(&self) -> Vec<Row>; }\n",
    );
    let model = write(dir.path(), "src/model.rs", "pub struct Row;\n");
    let packages = load_sources(APP, vec![lib, store, model], Vec::new()).unwrap();
    let d = one(&packages, APP, "Store");
    assert_eq!(d.trait_ref.path, "store::Store");
    assert_eq!(d.methods[0].results[0].to_string(), "std::vec::Vec<example.com/app::model::Row>");
}

#[test]
fn syntax_errors_fail_fast_with_position() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(dir.path(), "src/lib.rs", "pub trait T {\n  fn f(&self) ->;\n}\n");
    let err = load_sources(APP, vec![lib.clone()], Vec::new()).unwrap_err();
    match err {
        LoadError::Syntax { file, line, .. } => {
            assert_eq!(file, lib);
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn type_check_failures_report_the_package() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(dir.path(), "src/lib.rs", "pub trait T { fn f(&self) -> dep::Thing; }\n");
    let err = load_sources(APP, vec![lib], Vec::new()).unwrap_err();
    match err {
        LoadError::TypeCheck { path, diagnostic } => {
            assert_eq!(path, APP);
            assert_eq!(diagnostic.line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dependency_types_come_from_archives() {
    let dir = tempfile::tempdir().unwrap();
    let dep_lib = write(dir.path(), "dep/src/lib.rs", "pub struct Thing;\npub trait Named { fn name(&self) -> String; }\n");
    let dep = load_sources("example.com/dep", vec![dep_lib], Vec::new()).unwrap();
    let export = dir.path().join("out/dep.mexp");
    write_export_file(&export, &dep[0].types).unwrap();

    let lib = write(
        dir.path(),
        "app/src/lib.rs",
        "use dep::Named;\npub trait Maker: Named { fn make(&self) -> dep::Thing; }\n",
    );
    let archives = vec![ArchiveRef {
        import_map: "example.com/dep".into(),
        file: export,
    }];
    let packages = load_sources(APP, vec![lib], archives).unwrap();
    let d = one(&packages, APP, "Maker");
    assert_eq!(names(&d), vec!["name", "make"]);
    assert_eq!(d.methods[1].results[0].to_string(), "example.com/dep::Thing");
    assert_eq!(packages[0].imports.len(), 1);
}

#[test]
fn exported_signatures_equal_live_signatures() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(
        dir.path(),
        "src/lib.rs",
        r#"
        use std::collections::HashMap;
        pub type Table = HashMap<String, Vec<u8>>;
        pub mod api {
            pub trait Base { fn id(&self) -> u64; }
            pub trait Store: Base + Send {
                fn get<'a>(&'a self, key: &'a str) -> Option<&'a [u8]>;
                fn all(&mut self) -> Result<super::Table, std::io::Error>;
                fn put(&self, keys: &[String]) -> (usize, bool);
            }
        }
        "#,
    );
    let live = load_sources(APP, vec![lib], Vec::new()).unwrap();
    let export = dir.path().join("app.mexp");
    write_export_file(&export, &live[0].types).unwrap();

    let archives = vec![ArchiveRef {
        import_map: APP.into(),
        file: export,
    }];
    let archived = load_sources(APP, Vec::new(), archives).unwrap();

    let from_live = one(&live, APP, "Store");
    let from_archive = one(&archived, APP, "Store");
    assert_eq!(from_live.methods, from_archive.methods);
    assert_eq!(from_live.implements, from_archive.implements);
    assert!(archived[0].sources.is_empty());
}

#[test]
fn missing_archive_is_import_not_found() {
    let archives = vec![ArchiveRef {
        import_map: "example.com/other".into(),
        file: PathBuf::from("other.mexp"),
    }];
    let err = load_sources(APP, Vec::new(), archives).unwrap_err();
    assert!(matches!(err, LoadError::Import(_)), "{err}");
}

#[test]
fn variadic_tail_and_tuple_results() {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(
        dir.path(),
        "src/lib.rs",
        "pub trait Log { fn log(&self, level: u8, parts: &[&str]) -> (usize, bool); fn flush(&self); }",
    );
    let packages = load_sources(APP, vec![lib], Vec::new()).unwrap();
    let d = one(&packages, APP, "Log");
    assert!(d.methods[0].is_variadic());
    assert!(!d.methods[0].params[0].variadic);
    assert_eq!(d.methods[0].results.len(), 2);
    assert!(d.methods[1].results.is_empty());
    assert_eq!(d.methods[1].output(), TypeDescriptor::unit());
}

// ---------------------------------------------------------------------------
// Flattening invariance
// ---------------------------------------------------------------------------

/// Declares `total` methods split across traits by `splits`, either as a
/// linear chain of supertraits or all as direct supertraits of `Top`.
fn layered_source(splits: &[usize], chain: bool) -> (String, usize) {
    let mut src = String::new();
    let mut next = 0;
    for (i, count) in splits.iter().enumerate() {
        let supers = if chain && i > 0 {
            format!(": T{}", i - 1)
        } else {
            String::new()
        };
        src.push_str(&format!("pub trait T{i}{supers} {{"));
        for _ in 0..*count {
            src.push_str(&format!(" fn m{next}(&self);"));
            next += 1;
        }
        src.push_str(" }\n");
    }
    let supers: Vec<String> = if chain {
        splits.len().checked_sub(1).map(|i| format!("T{i}")).into_iter().collect()
    } else {
        (0..splits.len()).map(|i| format!("T{i}")).collect()
    };
    let bound = if supers.is_empty() {
        String::new()
    } else {
        format!(": {}", supers.join(" + "))
    };
    src.push_str(&format!("pub trait Top{bound} {{}}\n"));
    (src, next)
}

fn flattened(src: &str) -> Vec<String> {
    let dir = tempfile::tempdir().unwrap();
    let lib = write(dir.path(), "src/lib.rs", src);
    let packages = load_sources(APP, vec![lib], Vec::new()).unwrap();
    let mut out = names(&one(&packages, APP, "Top"));
    out.sort();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn method_count_is_invariant_to_supertrait_shape(splits in prop::collection::vec(0usize..4, 1..5)) {
        let (chain, total) = layered_source(&splits, true);
        let (flat, _) = layered_source(&splits, false);
        let chained = flattened(&chain);
        prop_assert_eq!(chained.len(), total);
        prop_assert_eq!(chained, flattened(&flat));
    }
}
