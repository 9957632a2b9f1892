//! Command-line arguments of the `mockgen` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Generates recording test doubles for Rust traits.
#[derive(Parser, Debug)]
#[command(name = "mockgen", version, about = "Generate mock implementations of Rust traits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate mocks for the traits of one or more packages.
    Generate(GenerateArgs),

    /// Type-check sources and write their export file.
    Export(ExportArgs),

    /// Print the extracted interface descriptors as JSON.
    Inspect(InspectArgs),
}

/// Where packages come from and which of their traits are wanted.
#[derive(Args, Debug, Clone, Default)]
pub struct PackageArgs {
    /// Import paths of the packages declaring the traits.
    #[arg(value_name = "IMPORT_PATH")]
    pub import_paths: Vec<String>,

    /// Names of the traits to mock (default: every supported trait).
    #[arg(short, long, value_delimiter = ',')]
    pub interfaces: Vec<String>,

    /// Names of traits to skip.
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Prefix inserted into the names of generated types.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Export files as IMPORTPATHS=IMPORTMAP=FILE=EXPORT; selects archive loading.
    #[arg(long, value_name = "ARCHIVE")]
    pub archives: Vec<String>,

    /// Source files of the package, crate root first.
    #[arg(long, value_name = "FILE", value_delimiter = ',')]
    pub sources: Vec<PathBuf>,

    /// Directory of standard library export files.
    #[arg(long, value_name = "DIR")]
    pub stdlib_root: Option<PathBuf>,

    /// Cargo.toml of the workspace to load packages from.
    #[arg(long, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub packages: PackageArgs,

    /// Directory to write generated files to (default: current directory).
    #[arg(short = 'o', long)]
    pub dirname: Option<PathBuf>,

    /// Write every mock into this file instead of one file per trait.
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Wrap the generated items in a module of this name.
    #[arg(short, long)]
    pub package: Option<String>,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,

    /// Generate test-only files.
    #[arg(long)]
    pub for_test: bool,

    /// Skip running the formatter over generated files.
    #[arg(long)]
    pub disable_formatting: bool,

    /// Formatter binary to run.
    #[arg(long)]
    pub rustfmt: Option<String>,

    /// Import path of the package the generated files compile into.
    #[arg(long)]
    pub output_import_path: Option<String>,

    /// Comment text added to the header of every generated file.
    #[arg(long)]
    pub file_prefix: Option<String>,

    /// Read mock groups from a YAML file.
    #[arg(long, conflicts_with = "import_paths")]
    pub config: Option<PathBuf>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Import path the export file is indexed under.
    #[arg(value_name = "IMPORT_PATH")]
    pub import_path: String,

    /// Source files of the package, crate root first.
    #[arg(long, value_name = "FILE", value_delimiter = ',', required = true)]
    pub sources: Vec<PathBuf>,

    /// Export files of the package's dependencies.
    #[arg(long, value_name = "ARCHIVE")]
    pub archives: Vec<String>,

    /// Directory of standard library export files.
    #[arg(long, value_name = "DIR")]
    pub stdlib_root: Option<PathBuf>,

    /// Export file to write.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub packages: PackageArgs,

    /// Print compact JSON on one line.
    #[arg(long)]
    pub compact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags() {
        let cli = Cli::try_parse_from([
            "mockgen",
            "generate",
            "example.com/app",
            "-i",
            "Store,Clock",
            "-o",
            "mocks",
            "--for-test",
            "--archives",
            "x=example.com/dep=dep.mexp=",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.packages.import_paths, ["example.com/app"]);
        assert_eq!(args.packages.interfaces, ["Store", "Clock"]);
        assert_eq!(args.dirname, Some(PathBuf::from("mocks")));
        assert!(args.for_test);
        assert_eq!(args.packages.archives.len(), 1);
    }

    #[test]
    fn config_excludes_import_paths() {
        let err = Cli::try_parse_from(["mockgen", "generate", "--config", "m.yaml", "example.com/app"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn export_requires_sources_and_output() {
        assert!(Cli::try_parse_from(["mockgen", "export", "example.com/app"]).is_err());
        let cli = Cli::try_parse_from([
            "mockgen",
            "export",
            "example.com/app",
            "--sources",
            "src/lib.rs",
            "-o",
            "app.mexp",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Export(ref a) if a.sources.len() == 1));
    }
}
