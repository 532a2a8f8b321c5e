//! Error types for partition building, sweeps and file handling.

use std::io;
use thiserror::Error;

/// Per-record conditions reported by a sweep.
///
/// None of these abort a sweep; the caller decides whether a record
/// yields a zero, an NA, or a hard failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("chromosome '{0}' is not present in the signal set")]
    UnknownChromosome(String),

    #[error("window start {start} on {chrom} comes before previous start {previous}")]
    UnsortedInputViolation {
        chrom: String,
        previous: u64,
        start: u64,
    },

    #[error("window [{start}, {end}) is empty")]
    ZeroLengthWindow { start: u64, end: u64 },
}

/// Run-level errors.
#[derive(Error, Debug)]
pub enum GaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("empty chromosome name")]
    EmptyChromosomeName,

    #[error("partition for chromosome '{0}' already exists")]
    DuplicateChromosomeKey(String),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, GaError>;
