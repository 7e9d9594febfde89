//! Error types for the acquisition core.

use thiserror::Error;

/// Errors that abort the current grab outright: hardware/IO and config
/// problems, as opposed to the much larger class of recoverable
/// per-page/per-byte problems, which are counted in statistics rather
/// than represented as `Err` values at all.
#[derive(Error, Debug)]
pub enum AcqError {
    #[error("VBI/output I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tuner driver error: {0}")]
    Driver(String),
}

/// A non-fatal problem encountered while importing a prior XMLTV file.
/// Malformed input never aborts a merge; these accumulate
/// into a warning list the caller may log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmltvImportError {
    #[error("unterminated <programme> block near byte {0}")]
    UnterminatedProgramme(usize),
    #[error("<programme> missing start= attribute")]
    MissingStart,
    #[error("malformed start timestamp {0:?}")]
    BadTimestamp(String),
}

/// A structural page error: the page is rejected from the
/// database but acquisition continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("packet {0} offset inconsistent with page length")]
    BadOffset(u8),
    #[error("negative duration derived for slot starting {0}")]
    NegativeDuration(String),
    #[error("unterminated control sequence in line {0}")]
    UnterminatedControl(usize),
}
