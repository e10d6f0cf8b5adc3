//! Relocation fixup for derived patch payloads
//!
//! The Mega Man 3 CGA and EGA patches share most of their payload bytes; only
//! the memory addresses embedded in them differ, because the replacement
//! routines live at different locations depending on which video code they
//! overwrite. Rather than declare each payload twice, the EGA payloads are
//! derived from the CGA-addressed templates by shifting every embedded
//! little-endian address by the distance between the two placements.
//!
//! A [`Relocation`] lists the marked word positions (each with its own delta,
//! since a payload can reference several relocated regions) and any
//! variant-specific single-byte overrides. Deriving is a pure operation on an
//! immutable template: it returns a fresh payload and never touches the
//! original, so the template can keep backing the variant it was written for.
//!
//! Deriving is deliberately not idempotent: applying the same relocation
//! twice shifts the marked addresses twice. Each derived variant must be
//! produced from the template exactly once.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Shift the little-endian 16-bit word at `pos` by `delta`, modulo 65536.
///
/// This is the primitive behind address relocation: a word holding an
/// absolute address (or a relative displacement whose origin moved) is read,
/// offset, and written back in place.
pub fn shift_word(buf: &mut [u8], pos: usize, delta: i32) {
    let base = LittleEndian::read_u16(&buf[pos..pos + 2]);
    let shifted = (i32::from(base) + delta) as u16;
    LittleEndian::write_u16(&mut buf[pos..pos + 2], shifted);
}

/// Marked positions and overrides that turn one variant's payload into
/// another's.
#[derive(Debug, Clone, Default)]
pub struct Relocation {
    /// `(payload offset, delta)` pairs; each names a little-endian word to
    /// shift by its own delta
    word_shifts: Vec<(usize, i32)>,
    /// `(payload offset, value)` pairs for variant-specific configuration
    /// bytes (e.g. the default video mode flag)
    byte_overrides: Vec<(usize, u8)>,
}

impl Relocation {
    /// Start an empty relocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the word at `offset` to be shifted by `delta`.
    pub fn shift(mut self, offset: usize, delta: i32) -> Self {
        self.word_shifts.push((offset, delta));
        self
    }

    /// Mark a run of `count` consecutive words starting at `offset`, all
    /// shifted by the same `delta`.
    pub fn shift_words(mut self, offset: usize, count: usize, delta: i32) -> Self {
        for i in 0..count {
            self.word_shifts.push((offset + i * 2, delta));
        }
        self
    }

    /// Overwrite the byte at `offset` with `value`.
    pub fn set_byte(mut self, offset: usize, value: u8) -> Self {
        self.byte_overrides.push((offset, value));
        self
    }

    /// Apply this relocation to a copy of `template`, returning the derived
    /// payload. The template itself is never modified.
    pub fn derive(&self, template: &[u8]) -> Result<Vec<u8>> {
        let mut payload = template.to_vec();

        for &(offset, delta) in &self.word_shifts {
            if offset + 2 > payload.len() {
                return Err(Error::invalid_patch_set(format!(
                    "relocation word at offset {offset} exceeds payload of {} bytes",
                    payload.len()
                )));
            }
            shift_word(&mut payload, offset, delta);
        }

        for &(offset, value) in &self.byte_overrides {
            if offset >= payload.len() {
                return Err(Error::invalid_patch_set(format!(
                    "relocation byte at offset {offset} exceeds payload of {} bytes",
                    payload.len()
                )));
            }
            payload[offset] = value;
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_word_little_endian() {
        let mut buf = vec![0x00, 0x34, 0x12, 0x00];
        shift_word(&mut buf, 1, 0x10);
        assert_eq!(buf, vec![0x00, 0x44, 0x12, 0x00]);
    }

    #[test]
    fn test_shift_word_wraps_mod_65536() {
        let mut buf = 0xFFFFu16.to_le_bytes().to_vec();
        shift_word(&mut buf, 0, 2);
        assert_eq!(LittleEndian::read_u16(&buf), 0x0001);
    }

    #[test]
    fn test_negative_delta() {
        // A call to a fixed external target shifts by the negated delta when
        // the call site itself moves
        let mut buf = 0x1000u16.to_le_bytes().to_vec();
        shift_word(&mut buf, 0, -0x0234);
        assert_eq!(LittleEndian::read_u16(&buf), 0x0DCC);
    }

    #[test]
    fn test_derive_leaves_template_untouched() {
        let template = vec![0x10, 0x00, 0xAA];
        let derived = Relocation::new()
            .shift(0, 0x100)
            .set_byte(2, 0xBB)
            .derive(&template)
            .unwrap();
        assert_eq!(derived, vec![0x10, 0x01, 0xBB]);
        assert_eq!(template, vec![0x10, 0x00, 0xAA]);
    }

    #[test]
    fn test_shift_words_run() {
        let template = vec![0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
        let derived = Relocation::new()
            .shift_words(0, 3, 0x10)
            .derive(&template)
            .unwrap();
        assert_eq!(derived, vec![0x11, 0x00, 0x12, 0x00, 0x13, 0x00]);
    }

    #[test]
    fn test_double_derive_double_shifts() {
        // Not idempotent: deriving twice with delta D lands on base + 2D
        let reloc = Relocation::new().shift(0, 0x0700);
        let template = 0x1234u16.to_le_bytes().to_vec();

        let once = reloc.derive(&template).unwrap();
        assert_eq!(LittleEndian::read_u16(&once), 0x1934);

        let twice = reloc.derive(&once).unwrap();
        assert_eq!(LittleEndian::read_u16(&twice), 0x2034);
    }

    #[test]
    fn test_out_of_range_mark_rejected() {
        let err = Relocation::new().shift(3, 1).derive(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidPatchSet(_)));

        let err = Relocation::new()
            .set_byte(4, 0)
            .derive(&[0u8; 4])
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidPatchSet(_)));
    }
}
