//! Root CLI structure for mmpatch

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::apply::ApplyArgs;

#[derive(Parser)]
#[command(name = "mmpatch")]
#[command(
    about = "Patch utility for Mega Man (DOS) and Mega Man 3 (DOS)",
    long_about = None
)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify MM.EXE by checksum and write the patched executable(s)
    Apply(ApplyArgs),

    /// Print the CRC32 fingerprint of a file
    Crc {
        /// Path to the file to fingerprint
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
