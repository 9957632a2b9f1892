//! Integration tests for the workspace strategy, driven through
//! `cargo metadata` on a scratch workspace.

use std::fs;
use std::path::{Path, PathBuf};

use mockgen_check::{extract, load, InterfaceRequest, LoadError, LoadStrategy};
use mockgen_core::{GenericArg, ItemRef, TypeDescriptor};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ROOT_MANIFEST: &str = "[workspace]\nmembers = [\"app\", \"model\"]\nresolver = \"2\"\n";

const APP_MANIFEST: &str = r#"[package]
name = "app"
version = "0.1.0"
edition = "2021"

[dependencies]
data = { package = "model", path = "../model" }
"#;

const MODEL_MANIFEST: &str = r#"[package]
name = "model"
version = "0.1.0"
edition = "2021"
"#;

const APP: &str = r#"
use data::rows::Row;

pub trait Repo: data::Named {
    fn fetch(&self, id: u64) -> Option<Row>;
    fn flush(&mut self) -> std::io::Result<()>;
}
"#;

const MODEL: &str = r#"
pub mod rows {
    pub struct Row;
}

pub trait Named {
    fn name(&self) -> String;
}
"#;

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

/// Lays out the two-member workspace and returns its root manifest.
fn scratch_workspace(dir: &Path) -> PathBuf {
    write(dir, "app/Cargo.toml", APP_MANIFEST);
    write(dir, "app/src/lib.rs", APP);
    write(dir, "model/Cargo.toml", MODEL_MANIFEST);
    write(dir, "model/src/lib.rs", MODEL);
    write(dir, "Cargo.toml", ROOT_MANIFEST)
}

fn strategy(manifest: PathBuf) -> LoadStrategy {
    LoadStrategy::Workspace {
        manifest_path: Some(manifest),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn renamed_dependencies_resolve_through_cargo_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = scratch_workspace(dir.path());

    let packages = load(&["app".to_string()], &strategy(manifest)).unwrap();
    let request = InterfaceRequest {
        import_paths: vec!["app".into()],
        interfaces: vec!["Repo".into()],
        ..Default::default()
    };
    let mut out = extract(&packages, &[request]).unwrap();
    assert_eq!(out.len(), 1);
    let repo = out.remove(0);

    let names: Vec<_> = repo.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["name", "fetch", "flush"]);
    let traits: Vec<_> = repo.implements.iter().map(|t| t.item.to_string()).collect();
    assert_eq!(traits, ["model::Named", "app::Repo"]);

    // The extern name `data` maps to the `model` package.
    let row = TypeDescriptor::named(ItemRef::new("model", "rows::Row"));
    let option = TypeDescriptor::Named {
        item: ItemRef::std("option::Option"),
        args: vec![GenericArg::Type(row)],
    };
    assert_eq!(repo.methods[1].results, [option]);

    // `std::io::Result<()>` expands to the result it aliases.
    let io_result = TypeDescriptor::Named {
        item: ItemRef::std("result::Result"),
        args: vec![
            GenericArg::Type(TypeDescriptor::unit()),
            GenericArg::Type(TypeDescriptor::named(ItemRef::std("io::Error"))),
        ],
    };
    assert_eq!(repo.methods[2].results, [io_result]);
}

#[test]
fn packages_outside_the_workspace_graph_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = scratch_workspace(dir.path());

    let err = load(&["ghost".to_string()], &strategy(manifest)).unwrap_err();
    assert!(matches!(err, LoadError::PackageNotFound { ref path } if path == "ghost"), "{err}");
}
