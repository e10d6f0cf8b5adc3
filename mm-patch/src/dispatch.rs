//! Checksum-keyed variant dispatch
//!
//! A [`VariantTable`] maps whole-file CRC32 fingerprints to the patch sets
//! and destination file names registered for them. It is built once at
//! startup and only consulted afterwards. Dispatching fingerprints the input,
//! selects every matching variant, and runs the engine once per registered
//! output, re-reading the original input each time since the engine fully
//! consumes its stream.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::engine::{apply_patches, ApplyStats};
use crate::error::{Error, Result};
use crate::fingerprint::fingerprint_file;
use crate::patch::PatchSet;

/// One destination derived from a recognized input.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    /// Human-readable name for diagnostics ("Mega Man 3 (EGA)")
    pub label: &'static str,
    /// Destination file name, created inside the dispatch output directory
    pub file_name: &'static str,
    /// Patch set applied to produce this output
    pub set: PatchSet,
}

/// A recognized input identity and everything produced from it.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Variant name, reported in diagnostics and in the accepted-fingerprint
    /// list on dispatch failure
    pub name: &'static str,
    /// CRC32 fingerprint identifying this variant
    pub fingerprint: u32,
    /// Outputs generated when this variant is matched
    pub outputs: Vec<OutputSpec>,
}

/// Result of one patch application during dispatch.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Label of the output spec that produced this file
    pub label: &'static str,
    /// Path of the written output file
    pub path: PathBuf,
    /// Copy/patch byte accounting
    pub stats: ApplyStats,
}

/// Immutable fingerprint-to-variant registry.
#[derive(Debug, Default)]
pub struct VariantTable {
    variants: Vec<Variant>,
}

impl VariantTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant. Registration order is preserved.
    pub fn register(&mut self, variant: Variant) {
        self.variants.push(variant);
    }

    /// All accepted fingerprints with their variant names.
    pub fn expected(&self) -> Vec<(u32, &'static str)> {
        self.variants.iter().map(|v| (v.fingerprint, v.name)).collect()
    }

    /// All variants registered for `fingerprint`.
    pub fn matching(&self, fingerprint: u32) -> Vec<&Variant> {
        self.variants
            .iter()
            .filter(|v| v.fingerprint == fingerprint)
            .collect()
    }

    /// Fingerprint the file at `input` and apply every matching variant,
    /// writing one output file per registered [`OutputSpec`] into `out_dir`.
    ///
    /// Fails with [`Error::UnrecognizedFingerprint`] before creating any file
    /// if the checksum matches no variant. A failure while writing an output
    /// removes the partial file before propagating, so nothing half-written
    /// is left looking complete.
    pub fn dispatch(&self, input: &Path, out_dir: &Path) -> Result<Vec<DispatchReport>> {
        let crc = fingerprint_file(input)?;
        log::info!("{}: CRC32 {crc:08X}", input.display());

        let matched = self.matching(crc);
        if matched.is_empty() {
            return Err(Error::UnrecognizedFingerprint {
                actual: crc,
                expected: self.expected(),
            });
        }

        let mut reports = Vec::new();
        for variant in matched {
            log::info!("matched variant: {}", variant.name);
            for output in &variant.outputs {
                let path = out_dir.join(output.file_name);
                let stats = apply_one(input, &path, &output.set).map_err(|err| {
                    // Do not leave a truncated output behind.
                    let _ = std::fs::remove_file(&path);
                    err
                })?;
                reports.push(DispatchReport {
                    label: output.label,
                    path,
                    stats,
                });
            }
        }
        Ok(reports)
    }
}

/// Run the engine for a single output, opening the input fresh.
fn apply_one(input: &Path, output: &Path, set: &PatchSet) -> Result<ApplyStats> {
    let reader = File::open(input).map_err(|source| Error::InputOpen {
        path: input.to_path_buf(),
        source,
    })?;
    let writer = File::create(output).map_err(|source| Error::OutputCreate {
        path: output.to_path_buf(),
        source,
    })?;
    apply_patches(BufReader::new(reader), BufWriter::new(writer), set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchRecord;

    fn table_with(fingerprint: u32, outputs: Vec<OutputSpec>) -> VariantTable {
        let mut table = VariantTable::new();
        table.register(Variant {
            name: "test variant",
            fingerprint,
            outputs,
        });
        table
    }

    #[test]
    fn test_expected_lists_all_registered() {
        let mut table = VariantTable::new();
        table.register(Variant {
            name: "one",
            fingerprint: 0x1111_1111,
            outputs: Vec::new(),
        });
        table.register(Variant {
            name: "two",
            fingerprint: 0x2222_2222,
            outputs: Vec::new(),
        });

        assert_eq!(
            table.expected(),
            vec![(0x1111_1111, "one"), (0x2222_2222, "two")]
        );
    }

    #[test]
    fn test_matching_filters_by_fingerprint() {
        let table = table_with(0xAABB_CCDD, Vec::new());
        assert_eq!(table.matching(0xAABB_CCDD).len(), 1);
        assert!(table.matching(0x0000_0001).is_empty());
    }

    #[test]
    fn test_unrecognized_fingerprint_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.exe");
        std::fs::write(&input, b"not a known binary").unwrap();

        let set = PatchSet::new(Vec::new()).unwrap();
        let table = table_with(
            0x1234_5678, // will not match
            vec![OutputSpec {
                label: "out",
                file_name: "OUT.EXE",
                set,
            }],
        );

        let err = table.dispatch(&input, dir.path()).unwrap_err();
        match err {
            Error::UnrecognizedFingerprint { expected, .. } => {
                assert_eq!(expected, vec![(0x1234_5678, "test variant")]);
            }
            other => panic!("expected UnrecognizedFingerprint, got {other:?}"),
        }
        assert!(!dir.path().join("OUT.EXE").exists());
    }

    #[test]
    fn test_multi_output_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let data = b"ABCDEFGH".to_vec();
        std::fs::write(&input, &data).unwrap();
        let crc = crate::fingerprint::fingerprint_file(&input).unwrap();

        let first = PatchSet::new(vec![PatchRecord::new(0, vec![b'x'])]).unwrap();
        let second = PatchSet::new(vec![PatchRecord::new(7, vec![b'y'])]).unwrap();
        let table = table_with(
            crc,
            vec![
                OutputSpec {
                    label: "first",
                    file_name: "FIRST.BIN",
                    set: first,
                },
                OutputSpec {
                    label: "second",
                    file_name: "SECOND.BIN",
                    set: second,
                },
            ],
        );

        let reports = table.dispatch(&input, dir.path()).unwrap();
        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.stats.total(), data.len() as u64);
        }

        assert_eq!(
            std::fs::read(dir.path().join("FIRST.BIN")).unwrap(),
            b"xBCDEFGH"
        );
        assert_eq!(
            std::fs::read(dir.path().join("SECOND.BIN")).unwrap(),
            b"ABCDEFGy"
        );
    }

    #[test]
    fn test_output_create_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        std::fs::write(&input, b"data").unwrap();
        let crc = crate::fingerprint::fingerprint_file(&input).unwrap();

        let set = PatchSet::new(Vec::new()).unwrap();
        let table = table_with(
            crc,
            vec![OutputSpec {
                label: "out",
                file_name: "OUT.BIN",
                set,
            }],
        );

        let missing = dir.path().join("no-such-dir");
        let err = table.dispatch(&input, &missing).unwrap_err();
        assert!(matches!(err, Error::OutputCreate { .. }));
    }
}
