//! The `mockgen` binary.
//!
//! Diagnostics are off unless `MOCKGEN_LOG` holds a tracing filter such as
//! `mockgen_check=debug`. Every failure exits with code 1.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mockgen_cli::args::{Cli, Commands};
use mockgen_cli::{driver, report, DriverError, ProgressSink, SilentSink, StderrSink};

fn main() {
    if let Ok(filter) = EnvFilter::try_from_env("MOCKGEN_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        eprint!("{}", report(&err));
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), DriverError> {
    match command {
        Commands::Generate(args) => {
            let mut sink: Box<dyn ProgressSink> = if args.quiet {
                Box::new(SilentSink)
            } else {
                Box::new(StderrSink)
            };
            let all = driver::generate_options(&args)?;
            driver::generate(&all, sink.as_mut())?;
        }
        Commands::Export(args) => {
            driver::export(&args, &mut StderrSink)?;
        }
        Commands::Inspect(args) => {
            let interfaces = driver::inspect(&args, &mut SilentSink)?;
            println!("{}", driver::inspect_json(&interfaces, args.compact)?);
        }
    }
    Ok(())
}
