//! Error types for the rewrite engine.
//!
//! Library code uses `thiserror` enums; the CLI wraps them in `anyhow`.
//! Configuration-level variants abort a run before any file is touched,
//! file-level variants are recorded per file and the run continues.

use std::path::PathBuf;

use thiserror::Error;

/// Failure modes when reading or writing a single text file.
#[derive(Error, Debug)]
pub enum IoError {
    /// File does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exceeds size limit.
    #[error("File too large: {0} bytes (limit: {1})")]
    TooLarge(u64, u64),

    /// File contains binary content (NULL bytes detected).
    #[error("Binary file detected")]
    BinaryFile,

    /// Content is not valid UTF-8. Rewriting lossy-decoded text would corrupt it.
    #[error("Invalid UTF-8 at byte {0}")]
    Encoding(usize),

    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    System(#[from] std::io::Error),
}

/// Errors raised by the batch rewrite engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Root directory is missing or not a directory. Fatal for the run.
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Single target file does not exist under the root.
    #[error("Target file not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    /// A rule pattern or guard failed to compile.
    #[error("Invalid pattern in rule '{rule}': {source}")]
    Pattern {
        /// Rule name as written in the rule file.
        rule: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Rule file, config file, table reference or glob is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a file failed.
    #[error("Read error for {}: {source}", path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: IoError,
    },

    /// Writing a file (or its backup) failed.
    #[error("Write error for {}: {source}", path.display())]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: IoError,
    },
}
