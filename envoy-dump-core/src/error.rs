use thiserror::Error;

/// Errors that abort decoding of a configuration dump.
///
/// Only the envelope and the shape of the three known sections can fail.
/// Unknown filters inside a well-formed section are reported as
/// [`crate::DecodeNote`]s instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input is not valid JSON, or a known section does not match its schema.
    #[error("failed to parse configuration dump: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading the dump from disk.
    #[error("failed to read configuration dump: {0}")]
    Io(#[from] std::io::Error),

    /// The envelope is valid JSON but not a configuration dump.
    #[error("malformed configuration dump: {0}")]
    Malformed(String),
}
