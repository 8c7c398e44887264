//! Error taxonomy for a preprocessing run
//!
//! Every error is fatal and aborts the run; there is no retry or partial
//! recovery. Variants carry the offending filename so failures can be
//! diagnosed from the single error line the binary prints.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Listing the source directory or reading a real note failed.
    #[error("failed to read {path}: {source}")]
    DirRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file opened a frontmatter block with `---` but the closing
    /// delimiter never appeared before end of input.
    #[error("{file}: frontmatter opened with '---' but no closing delimiter found")]
    UnterminatedFrontmatter { file: String },

    /// The text between frontmatter delimiters could not be parsed into a
    /// flat mapping of scalar values.
    #[error("{file}: invalid frontmatter: {reason}")]
    MetadataParse { file: String, reason: String },

    /// A filename classified as date-named failed the strict calendar
    /// parse. Signals a mismatch between the classifier pattern and the
    /// parser; it should not occur, but must never be swallowed.
    #[error("{file}: date-named file does not parse as a date: {reason}")]
    InvalidDateName { file: String, reason: String },

    /// A metadata value was accessed as the wrong shape.
    #[error("metadata key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Two on-disk files collapse to the same canonical key (case-variant
    /// duplicates). Refused rather than silently merged.
    #[error("{file}: case-variant duplicate of already-registered {existing}")]
    DuplicateNote { file: String, existing: String },

    /// Writing a processed file to the destination directory failed.
    /// Already-written files are left as-is.
    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
