//! Error types for zstds operations.
//!
//! Every fallible operation in the workspace returns [`ZstdsError`]. Errors
//! raised by the underlying source or sink are carried unchanged in
//! [`ZstdsError::Io`] so callers can tell their own I/O failures apart from
//! codec failures.

use std::io;
use thiserror::Error;

/// The main error type for zstds operations.
#[derive(Debug, Error)]
pub enum ZstdsError {
    /// I/O error from the underlying source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed caller input detected before any engine call.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected input.
        message: String,
    },

    /// The sink made no progress while the engine still had output pending.
    #[error("Not enough destination: engine output could not be delivered")]
    NotEnoughDestination,

    /// The engine rejected malformed or truncated compressed data.
    #[error("Corrupted input: {message}")]
    CorruptedInput {
        /// Engine diagnostic.
        message: String,
    },

    /// The engine rejected the dictionary or it does not match the frame.
    #[error("Corrupted dictionary: {message}")]
    CorruptedDictionary {
        /// Engine diagnostic.
        message: String,
    },

    /// The engine rejected a tuning parameter or parameter combination.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Engine diagnostic.
        message: String,
    },

    /// A data operation was issued after the stream was closed.
    #[error("Stream used after close")]
    UsedAfterClose,

    /// Allocation failure inside the engine.
    #[error("Resource exhaustion: {message}")]
    ResourceExhaustion {
        /// Engine diagnostic.
        message: String,
    },

    /// Text could not be transcoded between encodings.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// A read that requires data hit the end of the stream.
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Engine failure that fits no other category.
    #[error("Unexpected engine error: {message}")]
    Unexpected {
        /// Engine diagnostic.
        message: String,
    },
}

/// Result type alias for zstds operations.
pub type Result<T> = std::result::Result<T, ZstdsError>;

impl ZstdsError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a corrupted input error.
    pub fn corrupted_input(message: impl Into<String>) -> Self {
        Self::CorruptedInput {
            message: message.into(),
        }
    }

    /// Create a corrupted dictionary error.
    pub fn corrupted_dictionary(message: impl Into<String>) -> Self {
        Self::CorruptedDictionary {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a resource exhaustion error.
    pub fn resource_exhaustion(message: impl Into<String>) -> Self {
        Self::ResourceExhaustion {
            message: message.into(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create an unexpected engine error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Whether the error came from the engine and poisons its session.
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Self::CorruptedInput { .. }
                | Self::CorruptedDictionary { .. }
                | Self::InvalidConfiguration { .. }
                | Self::ResourceExhaustion { .. }
                | Self::Unexpected { .. }
        )
    }

    /// Whether this is a source/sink `WouldBlock` signal.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::WouldBlock)
    }
}

impl From<ZstdsError> for io::Error {
    fn from(err: ZstdsError) -> Self {
        let kind = match err {
            ZstdsError::Io(inner) => return inner,
            ZstdsError::InvalidArgument { .. } | ZstdsError::InvalidConfiguration { .. } => {
                io::ErrorKind::InvalidInput
            }
            ZstdsError::CorruptedInput { .. }
            | ZstdsError::CorruptedDictionary { .. }
            | ZstdsError::Encoding { .. } => io::ErrorKind::InvalidData,
            ZstdsError::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            ZstdsError::ResourceExhaustion { .. } => io::ErrorKind::OutOfMemory,
            ZstdsError::NotEnoughDestination => io::ErrorKind::WriteZero,
            ZstdsError::UsedAfterClose | ZstdsError::Unexpected { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
