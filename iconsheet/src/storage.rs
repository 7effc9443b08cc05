//! Atomic file writes.
//!
//! Data is written to a uniquely named temporary file in the destination
//! directory and then renamed over the final path. Readers observe either the
//! previous file, no file, or the complete new file. A temporary file that is
//! never persisted (error, panic, cancellation) is removed when dropped.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `data` to `dest` via a temporary file in the same directory.
///
/// The temporary file lives next to `dest` so the final rename never crosses
/// a filesystem boundary. If two writers race on the same `dest`, the last
/// rename wins and both see success.
pub fn write_atomic(dest: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");

        write_atomic(&dest, b"hello").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");
        fs::write(&dest, b"old contents").unwrap();

        write_atomic(&dest, b"new").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");

        write_atomic(&dest, b"data").unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing").join("out.bin");

        assert!(write_atomic(&dest, b"data").is_err());
        assert!(!dest.exists());
    }
}
