//! Errors for malformed inputs.
//!
//! Empty results (nothing passes filtering) are not errors; the pipeline
//! reports them and terminates cleanly. These variants cover inputs with no
//! meaningful partial result.

/// A type alias for `Result<T, ScanError>`.
pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A search table row that does not have 12 parseable columns.
    #[error("malformed match record at line {line}: {msg}")]
    BadRecord { line: usize, msg: String },

    /// A hit references a repeat that the repeat database does not contain,
    /// so its coverage cannot be computed.
    #[error("repeat '{0}' not present in the repeat database")]
    UnknownRepeat(String),

    /// A hit or cluster references an accession missing from the genome.
    #[error("accession '{0}' not present in the genome")]
    UnknownAccession(String),
}
