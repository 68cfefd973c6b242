//! `gliderqc` - derived-variable configuration for glider data pipelines

use clap::Parser;

use gliderqc::cli::args::Cli;
use gliderqc::cli::commands;
use gliderqc::error::ExitCode;
use gliderqc::observability::init_logging;

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
