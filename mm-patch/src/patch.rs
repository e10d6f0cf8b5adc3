//! Positional patch data model
//!
//! A [`PatchRecord`] replaces a run of bytes at a fixed file offset with a
//! payload of the same length, so applying a set of records never changes the
//! total size of the file. A [`PatchSet`] is an ordered collection of records
//! terminated by a single zero-length sentinel record.

use std::fmt;

use crate::error::{Error, Result};

/// One positional byte-range substitution.
///
/// The replaced length is always `payload.len()`; a record with an empty
/// payload is the set-terminating sentinel and replaces nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    /// Byte offset into the original file where the payload is overlaid
    pub position: u64,
    /// Replacement bytes
    pub payload: Vec<u8>,
}

impl PatchRecord {
    /// Create a record replacing `payload.len()` bytes at `position`.
    pub fn new(position: u64, payload: Vec<u8>) -> Self {
        Self { position, payload }
    }

    /// The set-terminating sentinel record.
    pub fn sentinel() -> Self {
        Self {
            position: 0,
            payload: Vec::new(),
        }
    }

    /// Number of bytes this record replaces.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty, i.e. this record is the sentinel.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether this record is the zero-length sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.is_empty()
    }

    /// One past the last offset this record touches.
    pub fn end(&self) -> u64 {
        self.position + self.payload.len() as u64
    }
}

/// An ordered, sentinel-terminated collection of patch records.
///
/// Records are kept in declaration order, which is not necessarily sorted by
/// position. The set is immutable once constructed; the engine only ever
/// borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSet {
    records: Vec<PatchRecord>,
}

impl PatchSet {
    /// Build a set from `records`, appending the terminating sentinel.
    ///
    /// Fails if any record is an interior sentinel, or if two records overlap
    /// or share a position. Overlap would make the applied output depend on
    /// declaration order, so it is rejected here rather than silently
    /// resolved at application time.
    pub fn new(records: Vec<PatchRecord>) -> Result<Self> {
        for record in &records {
            if record.is_sentinel() {
                return Err(Error::invalid_patch_set(format!(
                    "zero-length record at position {:#06X}",
                    record.position
                )));
            }
        }

        let set = Self::new_unchecked(records);
        set.check_overlaps()?;
        Ok(set)
    }

    /// Build a set without overlap validation.
    ///
    /// The engine applies the first record declared for a position and
    /// ignores any later one covering the same byte. Use [`PatchSet::new`]
    /// unless that first-match-wins behavior is wanted.
    pub fn new_unchecked(mut records: Vec<PatchRecord>) -> Self {
        records.push(PatchRecord::sentinel());
        Self { records }
    }

    /// All records, including the trailing sentinel.
    pub fn records(&self) -> &[PatchRecord] {
        &self.records
    }

    /// Records that actually replace bytes, in declaration order.
    pub fn iter_applicable(&self) -> impl Iterator<Item = &PatchRecord> {
        self.records.iter().filter(|r| !r.is_sentinel())
    }

    /// Number of non-sentinel records.
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    /// Whether the set contains only the sentinel.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of bytes the set replaces.
    pub fn patched_len(&self) -> u64 {
        self.iter_applicable().map(|r| r.len() as u64).sum()
    }

    fn check_overlaps(&self) -> Result<()> {
        let mut spans: Vec<(u64, u64)> = self
            .iter_applicable()
            .map(|r| (r.position, r.end()))
            .collect();
        spans.sort_unstable();
        for pair in spans.windows(2) {
            let (a_start, a_end) = pair[0];
            let (b_start, _) = pair[1];
            if b_start < a_end {
                return Err(Error::invalid_patch_set(format!(
                    "records overlap: {:#06X}..{:#06X} and {:#06X}",
                    a_start, a_end, b_start
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} bytes",
            self.len(),
            self.patched_len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_len_matches_payload() {
        let record = PatchRecord::new(0x10, vec![1, 2, 3]);
        assert_eq!(record.len(), 3);
        assert_eq!(record.end(), 0x13);
        assert!(!record.is_sentinel());
    }

    #[test]
    fn test_sentinel_appended_once() {
        let set = PatchSet::new(vec![PatchRecord::new(4, vec![9])]).unwrap();
        assert_eq!(set.records().len(), 2);
        assert!(set.records().last().unwrap().is_sentinel());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_set_is_sentinel_only() {
        let set = PatchSet::new(Vec::new()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.records().len(), 1);
        assert_eq!(set.patched_len(), 0);
    }

    #[test]
    fn test_interior_sentinel_rejected() {
        let err = PatchSet::new(vec![PatchRecord::new(8, Vec::new())]).unwrap_err();
        assert!(matches!(err, Error::InvalidPatchSet(_)));
    }

    #[test]
    fn test_overlap_rejected() {
        // 0x10..0x14 and 0x12..0x13 collide
        let err = PatchSet::new(vec![
            PatchRecord::new(0x10, vec![0; 4]),
            PatchRecord::new(0x12, vec![0]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPatchSet(_)));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let err = PatchSet::new(vec![
            PatchRecord::new(0x20, vec![1]),
            PatchRecord::new(0x20, vec![2]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPatchSet(_)));
    }

    #[test]
    fn test_adjacent_records_allowed() {
        // 0x10..0x12 followed immediately by 0x12..0x13 is not an overlap
        let set = PatchSet::new(vec![
            PatchRecord::new(0x10, vec![0; 2]),
            PatchRecord::new(0x12, vec![0]),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.patched_len(), 3);
    }

    #[test]
    fn test_declaration_order_preserved() {
        // Records are not sorted by position
        let set = PatchSet::new(vec![
            PatchRecord::new(0x40, vec![1]),
            PatchRecord::new(0x08, vec![2]),
        ])
        .unwrap();
        let positions: Vec<u64> = set.iter_applicable().map(|r| r.position).collect();
        assert_eq!(positions, vec![0x40, 0x08]);
    }

    #[test]
    fn test_unchecked_allows_overlap() {
        let set = PatchSet::new_unchecked(vec![
            PatchRecord::new(0, vec![1]),
            PatchRecord::new(0, vec![2]),
        ]);
        assert_eq!(set.len(), 2);
    }
}
