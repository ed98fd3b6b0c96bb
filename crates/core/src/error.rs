//! Error types for Tabula table streams.

use alloc::string::String;
use core::fmt;

/// Result type alias for Tabula operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for table stream operations.
///
/// Errors are `Clone` because a terminal stream failure may be delivered to
/// several subscribers of a shared stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An insert referenced a key that is already present in an index.
    KeyAlreadyPresent {
        context: &'static str,
    },
    /// An update or delete referenced a key absent from an index.
    KeyNotFound {
        context: &'static str,
    },
    /// A user callback reported failure.
    Callback {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyAlreadyPresent { context } => {
                write!(f, "Insert for a key already present in {}", context)
            }
            Error::KeyNotFound { context } => {
                write!(f, "Update or delete for a key missing from {}", context)
            }
            Error::Callback { message } => {
                write!(f, "Callback failed: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a key-already-present error for the named index.
    pub fn key_already_present(context: &'static str) -> Self {
        Error::KeyAlreadyPresent { context }
    }

    /// Creates a key-not-found error for the named index.
    pub fn key_not_found(context: &'static str) -> Self {
        Error::KeyNotFound { context }
    }

    /// Creates a callback failure error.
    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback {
            message: message.into(),
        }
    }
}
