//! Compiled-in patch tables for Mega Man (DOS) and Mega Man 3 (DOS)
//!
//! This module is data, not logic: it transcribes the replacement machine
//! code and menu tables of Brad Smith's original patch utility. The new
//! routines are placed over unused or sacrificed video code in the original
//! executables; each record pairs a file offset with the bytes that land
//! there. Addresses written into the payloads are segment addresses of where
//! the code resides once the executable is loaded, which is why they differ
//! from the file offsets the records patch.
//!
//! The executables were packed with MASM EXEPACK; analysis of the originals
//! was done on unpacked copies (see <https://github.com/w4kfu/unEXEPACK>).

pub mod mm1;
pub mod mm3;

use crate::dispatch::{OutputSpec, Variant, VariantTable};
use crate::error::Result;

/// CRC32 of the unmodified Mega Man `MM.EXE`
pub const CRC_MM1: u32 = 0xAEA0_6825;

/// CRC32 of the unmodified Mega Man 3 `MM.EXE`
pub const CRC_MM3: u32 = 0x06C0_9829;

/// Default frames-per-tick slowdown setting patched into both games
pub const DEFAULT_SPEED: u8 = 3;

/// Input file name both games ship under
pub const DEFAULT_INPUT: &str = "MM.EXE";

/// Output file name for the patched Mega Man 1
pub const OUT_MM1: &str = "MM1.EXE";

/// Output file name for the CGA/Tandy build of Mega Man 3
pub const OUT_MM3_CGA: &str = "MM3CGA.EXE";

/// Output file name for the EGA build of Mega Man 3
pub const OUT_MM3_EGA: &str = "MM3EGA.EXE";

/// Little-endian byte pair for a 16-bit value.
pub(crate) fn word(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Near `call` from `src` to `dst` (opcode + little-endian rel16).
pub(crate) fn call(src: u16, dst: u16) -> [u8; 3] {
    branch(0xE8, src, dst)
}

/// Near `jmp` from `src` to `dst` (opcode + little-endian rel16).
pub(crate) fn jmp(src: u16, dst: u16) -> [u8; 3] {
    branch(0xE9, src, dst)
}

fn branch(opcode: u8, src: u16, dst: u16) -> [u8; 3] {
    // rel16 is measured from the end of the 3-byte instruction
    let rel = dst.wrapping_sub(src).wrapping_sub(3);
    let [lo, hi] = rel.to_le_bytes();
    [opcode, lo, hi]
}

/// Which Mega Man 3 outputs a run should produce.
///
/// The CGA and EGA patches are mutually exclusive in-game (each overwrites
/// the other mode's video code), so the tool normally emits both and the
/// player keeps the one matching their hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mm3Selection {
    /// Emit both `MM3CGA.EXE` and `MM3EGA.EXE`
    #[default]
    Both,
    /// Emit only the CGA/Tandy build
    CgaOnly,
    /// Emit only the EGA build
    EgaOnly,
}

/// Build the compiled-in variant table: the two known `MM.EXE` checksums and
/// the patch sets registered for each.
pub fn builtin_table(selection: Mm3Selection) -> Result<VariantTable> {
    let mut table = VariantTable::new();

    table.register(Variant {
        name: "Mega Man",
        fingerprint: CRC_MM1,
        outputs: vec![OutputSpec {
            label: "Mega Man",
            file_name: OUT_MM1,
            set: mm1::patch_set()?,
        }],
    });

    let cga = OutputSpec {
        label: "Mega Man 3 (CGA)",
        file_name: OUT_MM3_CGA,
        set: mm3::cga_patch_set()?,
    };
    let ega = OutputSpec {
        label: "Mega Man 3 (EGA)",
        file_name: OUT_MM3_EGA,
        set: mm3::ega_patch_set()?,
    };
    let outputs = match selection {
        Mm3Selection::Both => vec![cga, ega],
        Mm3Selection::CgaOnly => vec![cga],
        Mm3Selection::EgaOnly => vec![ega],
    };
    table.register(Variant {
        name: "Mega Man 3",
        fingerprint: CRC_MM3,
        outputs,
    });

    Ok(table)
}
