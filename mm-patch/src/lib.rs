//! # mm_patch - Mega Man (DOS) patch engine
//!
//! A Rust implementation of Brad Smith's patch utility for Mega Man (DOS)
//! and Mega Man 3 (DOS). Both games ship as `MM.EXE`; the tool identifies
//! which game it was given by a whole-file CRC32 and overlays the matching
//! set of positional byte patches, producing patched copies that are exactly
//! the same size as the original.
//!
//! The patches add a configurable slowdown setting, rework joystick
//! handling, and filter held inputs on the selection screens. Mega Man 3 is
//! emitted twice — a CGA/Tandy build and an EGA build — because each has to
//! overwrite the other video mode's code to make room; the EGA payloads are
//! derived from the CGA ones by relocating their embedded addresses.
//!
//! ## Examples
//!
//! ### Patch a recognized executable
//!
//! ```no_run
//! use mm_patch::{builtin_table, Mm3Selection};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), mm_patch::Error> {
//! let table = builtin_table(Mm3Selection::default())?;
//! for report in table.dispatch(Path::new("MM.EXE"), Path::new("."))? {
//!     println!(
//!         "{}: {} bytes copied, {} bytes patched",
//!         report.path.display(),
//!         report.stats.bytes_copied,
//!         report.stats.bytes_patched
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Apply a custom patch set to a stream
//!
//! ```
//! use mm_patch::{apply_patches, PatchRecord, PatchSet};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), mm_patch::Error> {
//! let set = PatchSet::new(vec![PatchRecord::new(1, b"XY".to_vec())])?;
//! let mut output = Vec::new();
//! let stats = apply_patches(Cursor::new(b"ABCDE"), &mut output, &set)?;
//! assert_eq!(output, b"AXYDE");
//! assert_eq!(stats.bytes_patched, 2);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod data;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod patch;
pub mod reloc;

// Re-export commonly used types
pub use data::{
    builtin_table, Mm3Selection, CRC_MM1, CRC_MM3, DEFAULT_INPUT, OUT_MM1, OUT_MM3_CGA,
    OUT_MM3_EGA,
};
pub use dispatch::{DispatchReport, OutputSpec, Variant, VariantTable};
pub use engine::{apply_patches, ApplyStats};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, fingerprint_file};
pub use patch::{PatchRecord, PatchSet};
pub use reloc::{shift_word, Relocation};
