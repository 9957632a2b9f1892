//! End-to-end runs of the driver over on-disk packages.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use mockgen_cli::args::{Cli, Commands, ExportArgs, GenerateArgs};
use mockgen_cli::{driver, report, CollectingSink, DriverError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DEP: &str = "pub struct Thing;\npub trait Named { fn name(&self) -> String; }\n";

const APP: &str = r#"
use dep::Named;

pub trait Maker: Named {
    fn make(&self, count: usize) -> Vec<String>;
}

pub trait Clock {
    fn now(&self) -> u64;
}
"#;

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn parse(argv: &[&str]) -> Commands {
    let mut full = vec!["mockgen"];
    full.extend_from_slice(argv);
    Cli::try_parse_from(full).unwrap().command
}

fn generate_args(argv: &[&str]) -> GenerateArgs {
    match parse(argv) {
        Commands::Generate(args) => args,
        other => panic!("expected generate, got {other:?}"),
    }
}

/// Lays out `dep` and `app` sources and exports `dep`. Returns the archive
/// flag value for the dependency.
fn workspace(dir: &Path) -> String {
    write(dir, "dep/src/lib.rs", DEP);
    write(dir, "app/src/lib.rs", APP);
    let export = ExportArgs {
        import_path: "example.com/dep".into(),
        sources: vec![dir.join("dep/src/lib.rs")],
        archives: Vec::new(),
        stdlib_root: None,
        output: dir.join("out/dep.mexp"),
    };
    driver::export(&export, &mut CollectingSink::default()).unwrap();
    format!("example.com/dep=example.com/dep={}=", dir.join("out/dep.mexp").display())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn export_writes_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "dep/src/lib.rs", DEP);
    let args = ExportArgs {
        import_path: "example.com/dep".into(),
        sources: vec![dir.path().join("dep/src/lib.rs")],
        archives: Vec::new(),
        stdlib_root: None,
        output: dir.path().join("out/dep.mexp"),
    };
    let mut sink = CollectingSink::default();
    let path = driver::export(&args, &mut sink).unwrap();
    assert!(path.exists());
    assert_eq!(sink.messages[0], "loading data for 1 packages");
    assert!(sink.messages[1].ends_with("dep.mexp'"), "{:?}", sink.messages);
}

#[test]
fn generate_from_flags_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let archive = workspace(dir.path());
    let sources = dir.path().join("app/src/lib.rs");
    let out = dir.path().join("mocks");
    let args = generate_args(&[
        "generate",
        "example.com/app",
        "-i",
        "Maker",
        "-o",
        out.to_str().unwrap(),
        "--disable-formatting",
        "--archives",
        archive.as_str(),
        "--sources",
        sources.to_str().unwrap(),
    ]);

    let all = driver::generate_options(&args).unwrap();
    let mut sink = CollectingSink::default();
    let written = driver::generate(&all, &mut sink).unwrap();

    assert_eq!(written, [out.join("maker_mock.rs")]);
    assert_eq!(sink.messages.len(), 3, "{:?}", sink.messages);
    assert_eq!(sink.messages[0], "loading data for 1 packages");
    assert_eq!(sink.messages[1], "generating code for interface 'Maker'");
    assert!(sink.messages[2].starts_with("writing to '"));
    assert!(sink.messages[2].ends_with("maker_mock.rs'"));

    let text = fs::read_to_string(&written[0]).unwrap();
    assert!(text.contains("impl dep::Named for MockMaker {"), "{text}");
    assert!(text.contains("impl app::Maker for MockMaker {"), "{text}");
}

#[test]
fn config_groups_share_one_load() {
    let dir = tempfile::tempdir().unwrap();
    let archive = workspace(dir.path());
    let config = write(
        dir.path(),
        "mockgen.yaml",
        &format!(
            "disable-formatting: true\n\
             file-prefix: Regenerate with mockgen.\n\
             mocks:\n\
             \x20 - path: example.com/app\n\
             \x20   interfaces: [Maker]\n\
             \x20   dirname: mocks/maker\n\
             \x20   sources: [app/src/lib.rs]\n\
             \x20   archives: [\"{archive}\"]\n\
             \x20 - path: example.com/app\n\
             \x20   interfaces: [Clock]\n\
             \x20   prefix: Fake\n\
             \x20   dirname: mocks/clock\n\
             \x20   for-test: true\n"
        ),
    );
    let args = generate_args(&["generate", "--config", config.to_str().unwrap()]);

    let all = driver::generate_options(&args).unwrap();
    assert_eq!(all.len(), 2);
    let mut sink = CollectingSink::default();
    let written = driver::generate(&all, &mut sink).unwrap();

    assert_eq!(
        written,
        [
            dir.path().join("mocks/maker/maker_mock.rs"),
            dir.path().join("mocks/clock/fake_clock_mock_test.rs"),
        ]
    );
    let loads = sink.messages.iter().filter(|m| m.starts_with("loading data")).count();
    assert_eq!(loads, 1);
    let clock = fs::read_to_string(&written[1]).unwrap();
    assert!(clock.contains("// Regenerate with mockgen."), "{clock}");
    assert!(clock.contains("pub struct MockFakeClock {"), "{clock}");
}

#[test]
fn existing_files_need_force() {
    let dir = tempfile::tempdir().unwrap();
    let archive = workspace(dir.path());
    let sources = dir.path().join("app/src/lib.rs");
    let out = dir.path().join("mocks");
    let mut argv = vec![
        "generate",
        "example.com/app",
        "-i",
        "Clock",
        "-o",
        out.to_str().unwrap(),
        "--disable-formatting",
        "--archives",
        archive.as_str(),
        "--sources",
        sources.to_str().unwrap(),
    ];
    let all = driver::generate_options(&generate_args(&argv)).unwrap();
    driver::generate(&all, &mut CollectingSink::default()).unwrap();

    let err = driver::generate(&all, &mut CollectingSink::default()).unwrap_err();
    let text = report(&err);
    assert!(text.starts_with("error: filename "), "{text}");
    assert!(text.contains("already exists, overwrite with --force"), "{text}");

    argv.push("--force");
    let all = driver::generate_options(&generate_args(&argv)).unwrap();
    driver::generate(&all, &mut CollectingSink::default()).unwrap();
}

#[test]
fn unknown_interfaces_come_with_solutions() {
    let dir = tempfile::tempdir().unwrap();
    let archive = workspace(dir.path());
    let sources = dir.path().join("app/src/lib.rs");
    let args = generate_args(&[
        "generate",
        "example.com/app",
        "-i",
        "Missing",
        "-o",
        dir.path().join("mocks").to_str().unwrap(),
        "--disable-formatting",
        "--archives",
        archive.as_str(),
        "--sources",
        sources.to_str().unwrap(),
    ]);
    let all = driver::generate_options(&args).unwrap();
    let err = driver::generate(&all, &mut CollectingSink::default()).unwrap_err();
    assert!(matches!(err, DriverError::Extract(_)));
    let text = report(&err);
    assert!(text.starts_with("error: type 'Missing' not found in supplied import paths\n"), "{text}");
    assert!(text.contains("\nPossible solutions:\n  - "), "{text}");
}

#[test]
fn sources_without_archives_are_rejected() {
    let args = generate_args(&["generate", "example.com/app", "--sources", "src/lib.rs"]);
    let err = driver::generate_options(&args).unwrap_err();
    assert!(matches!(err, DriverError::Config { .. }));
    assert!(report(&err).contains("Possible solutions"));
}

#[test]
fn inspect_prints_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let archive = workspace(dir.path());
    let sources = dir.path().join("app/src/lib.rs");
    let args = match parse(&[
        "inspect",
        "example.com/app",
        "--archives",
        archive.as_str(),
        "--sources",
        sources.to_str().unwrap(),
    ]) {
        Commands::Inspect(args) => args,
        other => panic!("expected inspect, got {other:?}"),
    };
    assert!(!args.compact);

    let interfaces = driver::inspect(&args, &mut CollectingSink::default()).unwrap();
    let names: Vec<_> = interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Maker", "Clock"]);

    let json = driver::inspect_json(&interfaces, false).unwrap();
    assert!(json.contains("\"name\": \"Maker\""), "{json}");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(2));
}
