//! Patch application engine
//!
//! Streams an input file byte-by-byte, overlaying patch record payloads at
//! their recorded positions and copying everything else through unchanged.
//! Every original byte is either copied or consumed-and-replaced by an
//! equal-length payload byte, so the output is always exactly as long as the
//! input.
//!
//! The set is scanned linearly, in declaration order, at every cursor
//! position. That is O(input × records), which is fine for the sizes involved
//! here: tens of records against executables of a few tens of kilobytes. When
//! two records claim the same position (only possible through
//! [`PatchSet::new_unchecked`]) the first declared one wins and the rest are
//! ignored.
//!
//! A record whose position lies past end-of-input is never reached and is
//! silently skipped, matching the original utility.

use std::io::{Read, Write};

use crate::error::Result;
use crate::patch::PatchSet;

/// Byte accounting returned by [`apply_patches`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    /// Bytes copied through unchanged
    pub bytes_copied: u64,
    /// Bytes replaced by patch payloads
    pub bytes_patched: u64,
}

impl ApplyStats {
    /// Total bytes written to the output.
    pub fn total(&self) -> u64 {
        self.bytes_copied + self.bytes_patched
    }
}

/// Apply `set` to `input`, writing the patched stream to `output`.
///
/// Fully consumes `input`. The caller is expected to hand in buffered
/// streams; the engine reads one byte at a time.
pub fn apply_patches<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    set: &PatchSet,
) -> Result<ApplyStats> {
    let mut stats = ApplyStats::default();
    let mut pos: u64 = 0;

    loop {
        // First declared record at the cursor wins.
        if let Some(record) = set.iter_applicable().find(|r| r.position == pos) {
            log::debug!(
                "patch {:#06X}-{:#06X}: {} bytes",
                record.position,
                record.end() - 1,
                record.len()
            );
            output.write_all(&record.payload)?;
            discard(&mut input, record.len())?;
            pos += record.len() as u64;
            stats.bytes_patched += record.len() as u64;
            continue;
        }

        let mut byte = [0u8; 1];
        if input.read(&mut byte)? == 0 {
            break;
        }
        output.write_all(&byte)?;
        pos += 1;
        stats.bytes_copied += 1;
    }

    output.flush()?;
    Ok(stats)
}

/// Consume up to `count` bytes from `input`; replaced bytes are read and
/// thrown away so the cursor stays in step with the output.
fn discard<R: Read>(input: &mut R, count: usize) -> Result<()> {
    let mut remaining = count as u64;
    while remaining > 0 {
        let n = std::io::copy(&mut input.by_ref().take(remaining), &mut std::io::sink())?;
        if n == 0 {
            break;
        }
        remaining -= n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PatchRecord, PatchSet};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn apply(input: &[u8], set: &PatchSet) -> (Vec<u8>, ApplyStats) {
        let mut output = Vec::new();
        let stats = apply_patches(Cursor::new(input), &mut output, set).unwrap();
        (output, stats)
    }

    #[test]
    fn test_single_record_substitution() {
        let set = PatchSet::new(vec![PatchRecord::new(1, vec![b'X', b'Y'])]).unwrap();
        let (out, stats) = apply(b"ABCDE", &set);

        assert_eq!(out, b"AXYDE");
        assert_eq!(stats.bytes_copied, 3);
        assert_eq!(stats.bytes_patched, 2);
    }

    #[test]
    fn test_sentinel_only_set_copies_verbatim() {
        let set = PatchSet::new(Vec::new()).unwrap();
        let input: Vec<u8> = (0..=255).collect();
        let (out, stats) = apply(&input, &set);

        assert_eq!(out, input);
        assert_eq!(stats.bytes_copied, 256);
        assert_eq!(stats.bytes_patched, 0);
    }

    #[test]
    fn test_length_preserved_and_accounted() {
        let set = PatchSet::new(vec![
            PatchRecord::new(0, vec![0xFF; 3]),
            PatchRecord::new(7, vec![0xEE; 2]),
        ])
        .unwrap();
        let input = vec![0u8; 32];
        let (out, stats) = apply(&input, &set);

        assert_eq!(out.len(), input.len());
        assert_eq!(stats.total(), input.len() as u64);
        assert_eq!(stats.bytes_patched, 5);
    }

    #[test]
    fn test_records_apply_regardless_of_declaration_order() {
        // Declared out of position order; both still land where recorded
        let set = PatchSet::new(vec![
            PatchRecord::new(4, vec![0xBB]),
            PatchRecord::new(1, vec![0xAA]),
        ])
        .unwrap();
        let (out, _) = apply(&[0; 6], &set);

        assert_eq!(out, vec![0, 0xAA, 0, 0, 0xBB, 0]);
    }

    #[test]
    fn test_patch_at_position_zero() {
        let set = PatchSet::new(vec![PatchRecord::new(0, vec![9, 8])]).unwrap();
        let (out, stats) = apply(&[1, 2, 3], &set);

        assert_eq!(out, vec![9, 8, 3]);
        assert_eq!(stats.bytes_patched, 2);
        assert_eq!(stats.bytes_copied, 1);
    }

    #[test]
    fn test_adjacent_records() {
        let set = PatchSet::new(vec![
            PatchRecord::new(1, vec![0xAA, 0xAB]),
            PatchRecord::new(3, vec![0xAC]),
        ])
        .unwrap();
        let (out, stats) = apply(&[0; 5], &set);

        assert_eq!(out, vec![0, 0xAA, 0xAB, 0xAC, 0]);
        assert_eq!(stats.bytes_patched, 3);
        assert_eq!(stats.bytes_copied, 2);
    }

    #[test]
    fn test_record_past_eof_is_silent_noop() {
        let set = PatchSet::new(vec![PatchRecord::new(100, vec![0xFF])]).unwrap();
        let input = vec![5u8; 10];
        let (out, stats) = apply(&input, &set);

        assert_eq!(out, input);
        assert_eq!(stats.bytes_copied, 10);
        assert_eq!(stats.bytes_patched, 0);
    }

    #[test]
    fn test_first_declared_record_wins_on_duplicate_position() {
        let set = PatchSet::new_unchecked(vec![
            PatchRecord::new(2, vec![0x11]),
            PatchRecord::new(2, vec![0x22]),
        ]);
        let (out, stats) = apply(&[0; 4], &set);

        // The cursor passes position 2 once, so the later record never fires.
        assert_eq!(out, vec![0, 0, 0x11, 0]);
        assert_eq!(stats.bytes_patched, 1);
        assert_eq!(stats.bytes_copied, 3);
    }

    #[test]
    fn test_empty_input() {
        let set = PatchSet::new(vec![PatchRecord::new(3, vec![1])]).unwrap();
        let (out, stats) = apply(b"", &set);

        assert!(out.is_empty());
        assert_eq!(stats, ApplyStats::default());
    }
}
