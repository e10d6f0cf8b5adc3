//! Whole-file CRC32 fingerprinting
//!
//! A patched executable is identified purely by the CRC32 of its full byte
//! content. The value is an opaque identity key: two known checksums select
//! the Mega Man 1 or Mega Man 3 patch tables, anything else is rejected.
//!
//! The algorithm is standard reflected CRC-32/IEEE (initial accumulator
//! `0xFFFF_FFFF`, polynomial `0xEDB8_8320`, final complement), computed by
//! `crc32fast`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Compute the CRC32 fingerprint of a byte stream, reading it to EOF.
///
/// The reader is fully consumed.
pub fn fingerprint<R: Read>(mut reader: R) -> Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Compute the CRC32 fingerprint of the file at `path`.
pub fn fingerprint_file<P: AsRef<Path>>(path: P) -> Result<u32> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    fingerprint(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_standard_check_vector() {
        // The canonical CRC-32/IEEE check value
        let crc = fingerprint(Cursor::new(b"123456789")).unwrap();
        assert_eq!(crc, 0xCBF4_3926);
    }

    #[test]
    fn test_empty_stream() {
        let crc = fingerprint(Cursor::new(b"")).unwrap();
        assert_eq!(crc, 0x0000_0000);
    }

    #[test]
    fn test_consumes_reader() {
        let mut cursor = Cursor::new(vec![0u8; 1000]);
        fingerprint(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 1000);
    }

    #[test]
    fn test_fingerprint_file_matches_stream() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"123456789").unwrap();
        tmp.flush().unwrap();

        assert_eq!(fingerprint_file(tmp.path()).unwrap(), 0xCBF4_3926);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = fingerprint_file("does-not-exist.exe").unwrap_err();
        match err {
            Error::InputOpen { path, .. } => {
                assert_eq!(path, std::path::PathBuf::from("does-not-exist.exe"));
            }
            other => panic!("expected InputOpen, got {other:?}"),
        }
    }
}
