//! Error types for XDR packing and unpacking.

use thiserror::Error;

/// Result type for XDR operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for XDR operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value cannot be represented in its wire width, or a list
    /// continuation marker was neither 0 nor 1.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A read needs more bytes than remain after the cursor.
    #[error("end of buffer: needed {needed} bytes, only {available} available")]
    EndOfBuffer { needed: usize, available: usize },

    /// Caller-supplied arguments violate the operation's constraints.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `done()` found bytes after the cursor.
    #[error("unextracted data remains: {remaining} bytes")]
    UnextractedData { remaining: usize },
}

/// Fieldless tag for each [`Error`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Conversion,
    EndOfBuffer,
    InvalidArgument,
    UnextractedData,
}

impl Error {
    /// Creates a conversion error.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Creates an end-of-buffer error.
    pub fn end_of_buffer(needed: usize, available: usize) -> Self {
        Self::EndOfBuffer { needed, available }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::EndOfBuffer { .. } => ErrorKind::EndOfBuffer,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnextractedData { .. } => ErrorKind::UnextractedData,
        }
    }
}
