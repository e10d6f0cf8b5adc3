//! Main entry point for the mmpatch CLI

mod cli;
mod commands;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::{generate, Generator};
use std::io;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    // Execute command
    let result = match cli.command {
        Commands::Apply(args) => commands::apply::execute(args),
        Commands::Crc { file } => commands::crc::execute(&file),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            exit_code(&err)
        }
    }
}

/// Distinct exit codes for scripted use: 1 for an unrecognized checksum (or
/// any other failure), 2 when the input cannot be opened, 3 when an output
/// cannot be created.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<mm_patch::Error>() {
        Some(mm_patch::Error::InputOpen { .. }) => ExitCode::from(2),
        Some(mm_patch::Error::OutputCreate { .. }) => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
