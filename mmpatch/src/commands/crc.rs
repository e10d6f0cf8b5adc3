//! CRC32 fingerprint command implementation

use anyhow::Result;
use std::path::Path;

use mm_patch::fingerprint_file;

pub fn execute(path: &Path) -> Result<()> {
    let crc = fingerprint_file(path)?;
    println!("{crc:08X}");
    Ok(())
}
