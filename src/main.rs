use clap::Parser;
use prefixsort::cli::{Cli, run_cli};
use prefixsort::logging;
use prefixsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    tracing::debug!(directory = %cli.directory.display(), dry_run = cli.dry_run, "starting");

    match run_cli(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
