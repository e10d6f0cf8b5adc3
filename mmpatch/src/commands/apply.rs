//! Apply command implementation: identify the input and write the patched
//! executable(s)

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::style;
use std::path::PathBuf;

use mm_patch::{builtin_table, fingerprint_file, Error, Mm3Selection};

#[derive(Args)]
pub struct ApplyArgs {
    /// Path to the game executable to identify and patch
    #[arg(default_value = mm_patch::DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Directory the patched executable(s) are written into
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// For Mega Man 3, emit only one of the two video-mode builds
    #[arg(long, value_enum)]
    pub only: Option<Mm3Output>,
}

/// Selectable Mega Man 3 output builds
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Mm3Output {
    /// CGA/Tandy build (MM3CGA.EXE)
    Cga,
    /// EGA build (MM3EGA.EXE)
    Ega,
}

fn selection(only: Option<Mm3Output>) -> Mm3Selection {
    match only {
        None => Mm3Selection::Both,
        Some(Mm3Output::Cga) => Mm3Selection::CgaOnly,
        Some(Mm3Output::Ega) => Mm3Selection::EgaOnly,
    }
}

pub fn execute(args: ApplyArgs) -> Result<()> {
    let table = builtin_table(selection(args.only))?;

    let crc = fingerprint_file(&args.input)?;
    println!(
        "{}: CRC32 {}",
        style(args.input.display()).cyan(),
        style(format!("{crc:08X}")).yellow()
    );

    let reports = match table.dispatch(&args.input, &args.out_dir) {
        Ok(reports) => reports,
        Err(err) => {
            if let Error::UnrecognizedFingerprint { ref expected, .. } = err {
                println!("Unrecognized CRC32. Expected:");
                for (crc, name) in expected {
                    println!("  {} - {}", style(format!("{crc:08X}")).yellow(), name);
                }
            }
            return Err(err.into());
        }
    };

    for report in reports {
        println!(
            "✓ {} -> {}: {} bytes copied, {} bytes patched",
            style(report.label).cyan(),
            style(report.path.display()).green(),
            report.stats.bytes_copied,
            report.stats.bytes_patched
        );
    }

    Ok(())
}
