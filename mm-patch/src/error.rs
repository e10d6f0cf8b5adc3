//! Error types for the patch library

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for patch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input file could not be opened or read
    #[error("Unable to open input file {path}: {source}")]
    InputOpen {
        /// Path to the input file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Output file could not be created or written
    #[error("Unable to create output file {path}: {source}")]
    OutputCreate {
        /// Path to the output file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Stream-level I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input's fingerprint matched no known variant
    #[error("Unrecognized CRC32: {actual:08X}")]
    UnrecognizedFingerprint {
        /// Fingerprint computed from the input
        actual: u32,
        /// All fingerprints the variant table would have accepted,
        /// paired with the variant name each identifies
        expected: Vec<(u32, &'static str)>,
    },

    /// A patch set failed construction-time validation
    #[error("Invalid patch set: {0}")]
    InvalidPatchSet(String),
}

impl Error {
    /// Create a new `InvalidPatchSet` error
    pub fn invalid_patch_set<S: Into<String>>(msg: S) -> Self {
        Error::InvalidPatchSet(msg.into())
    }

    /// Check if this error means a file could not be opened
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Error::InputOpen { .. } | Error::OutputCreate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnrecognizedFingerprint {
            actual: 0xDEADBEEF,
            expected: vec![(0xAEA06825, "Mega Man")],
        };
        assert_eq!(err.to_string(), "Unrecognized CRC32: DEADBEEF");

        let err = Error::invalid_patch_set("overlap at 0x10");
        assert_eq!(err.to_string(), "Invalid patch set: overlap at 0x10");
    }

    #[test]
    fn test_open_failure_classification() {
        let err = Error::InputOpen {
            path: PathBuf::from("MM.EXE"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.is_open_failure());

        let err = Error::invalid_patch_set("bad");
        assert!(!err.is_open_failure());
    }
}
