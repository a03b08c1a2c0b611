//! javannotate CLI entry point.

use clap::Parser;
use javannotate::cli::{self, Cli, Commands, EXIT_ERROR};
use javannotate::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let result = match &cli.command {
        Commands::Run(args) => cli::run_annotate(args),
        Commands::CheckConfig(args) => cli::run_check_config(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
