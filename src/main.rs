//! @dose
//! purpose: This is the CLI entry point for optionset. It parses command-line arguments using
//!     clap, sets up logging, determines the root directory, and dispatches to the
//!     appropriate command handler.
//!
//! when-editing:
//!     - !All command handlers are imported from the optionset crate
//!     - !The root directory defaults to current working directory if not specified
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error or failed write
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules

use anyhow::Context;
use clap::Parser;
use optionset::cli::{Cli, Commands};
use optionset::commands::{run_files, run_list, run_rename_option, run_rename_setting, run_set, Output};
use optionset::logging::init_logging;
use std::env;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let root = match cli.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let output = Output {
        verbose: cli.verbose && !cli.quiet,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::List(args) => run_list(&args, &root, output),
        Commands::Set(args) => run_set(&args, &root, output),
        Commands::Files(args) => run_files(&args, &root, output),
        Commands::RenameOption(args) => run_rename_option(&args, &root, output),
        Commands::RenameSetting(args) => run_rename_setting(&args, &root, output),
    }
}
