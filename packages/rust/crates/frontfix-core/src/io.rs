//! Safe text I/O for rewrite targets.
//!
//! Reads are size-limited and reject binary or non-UTF-8 content outright:
//! a rewrite tool must never round-trip lossy-decoded text back to disk.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use memchr::memchr;

use crate::error::IoError;

/// Number of leading bytes inspected for NULL bytes.
const BINARY_SNIFF_LEN: usize = 8192;

/// Quick binary detection: a NULL byte in the first 8KB means binary.
#[must_use]
pub fn is_binary(buffer: &[u8]) -> bool {
    let check_len = buffer.len().min(BINARY_SNIFF_LEN);
    memchr(0, &buffer[..check_len]).is_some()
}

/// Decode bytes as strict UTF-8.
///
/// # Errors
/// `IoError::BinaryFile` for binary content, `IoError::Encoding` for
/// invalid UTF-8 (carrying the offset of the first bad byte).
pub fn decode_text(buffer: Vec<u8>) -> Result<String, IoError> {
    if is_binary(&buffer) {
        return Err(IoError::BinaryFile);
    }
    String::from_utf8(buffer).map_err(|e| IoError::Encoding(e.utf8_error().valid_up_to()))
}

/// Read a text file with size and content checks.
///
/// # Errors
/// Returns `NotFound`, `TooLarge`, `BinaryFile`, `Encoding` or `System`.
pub fn read_text<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<String, IoError> {
    let path = path.as_ref();

    let metadata =
        fs::metadata(path).map_err(|_| IoError::NotFound(path.to_string_lossy().to_string()))?;
    if metadata.len() > max_bytes {
        return Err(IoError::TooLarge(metadata.len(), max_bytes));
    }

    let mut file = fs::File::open(path)?;
    let mut buffer = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or_default());
    file.read_to_end(&mut buffer)?;

    decode_text(buffer)
}

/// Path of the backup copy for `path` (`<file><suffix>`).
#[must_use]
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `path` to its backup location, overwriting an older backup.
///
/// # Errors
/// Propagates the underlying copy failure.
pub fn write_backup(path: &Path, suffix: &str) -> Result<PathBuf, IoError> {
    let target = backup_path(path, suffix);
    fs::copy(path, &target)?;
    Ok(target)
}

/// Replace the file content in one write.
///
/// # Errors
/// Propagates the underlying write failure.
pub fn write_text(path: &Path, content: &str) -> Result<(), IoError> {
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("page.html.twig");
        fs::write(&p, "<h1>{{ title }}</h1>").unwrap();
        assert_eq!(read_text(&p, 1024).unwrap(), "<h1>{{ title }}</h1>");
    }

    #[test]
    fn test_binary_rejected() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("logo.twig");
        fs::write(&p, b"\x89PNG\x00\x01").unwrap();
        assert!(matches!(read_text(&p, 1024), Err(IoError::BinaryFile)));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("latin1.twig");
        fs::write(&p, b"caf\xe9").unwrap();
        assert!(matches!(read_text(&p, 1024), Err(IoError::Encoding(3))));
    }

    #[test]
    fn test_too_large() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("big.css");
        fs::write(&p, "a{color:red}a{color:red}").unwrap();
        assert!(matches!(read_text(&p, 10), Err(IoError::TooLarge(_, 10))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_text("/nonexistent/base.html.twig", 1024),
            Err(IoError::NotFound(_))
        ));
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        let p = backup_path(Path::new("templates/base.html.twig"), ".bak");
        assert_eq!(p, PathBuf::from("templates/base.html.twig.bak"));
    }
}
