use palm_database::PDBError;
use thiserror::Error;

/// Everything that can go wrong while decoding a document.
#[derive(Debug, Error)]
pub enum MobiError {
    /// A requested byte range is not available from the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A structural expectation of the container or its headers is violated.
    #[error("format error: {0}")]
    Format(String),

    /// A text record holds a malformed compressed token or trailing entry.
    #[error("decompression error: {0}")]
    Decompression(String),
}

impl From<PDBError> for MobiError {
    fn from(error: PDBError) -> Self {
        match error {
            PDBError::Io(err) => MobiError::Io(err),
            other => MobiError::Format(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MobiError>;
