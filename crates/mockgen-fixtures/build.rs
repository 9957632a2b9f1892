//! Generates the mocks of the traits in `src/lib.rs` into `OUT_DIR`.

use std::error::Error;
use std::path::PathBuf;

use mockgen_check::{extract, load, InterfaceRequest, LoadStrategy};
use mockgen_codegen::{generate, GenerateOptions};

const IMPORT_PATH: &str = "mockgen_fixtures";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=src/lib.rs");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);

    let strategy = LoadStrategy::Archive {
        archives: Vec::new(),
        sources: vec![manifest_dir.join("src/lib.rs")],
        stdlib_root: None,
    };
    let packages = load(&[IMPORT_PATH.to_string()], &strategy)?;
    let request = InterfaceRequest {
        import_paths: vec![IMPORT_PATH.to_string()],
        ..Default::default()
    };
    let interfaces = extract(&packages, &[request])?;

    let options = GenerateOptions {
        output_dir: out_dir,
        output_filename: Some("mocks.rs".into()),
        force: true,
        disable_formatting: true,
        output_import_path: Some(IMPORT_PATH.into()),
        ..Default::default()
    };
    generate(&interfaces, &options)?;
    Ok(())
}
