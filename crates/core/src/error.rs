//! Error types for object graph serialization
//!
//! Every failure is fatal to the session that raised it. Callers decide
//! whether to retry a whole write or read from scratch; there is no
//! partial-object recovery.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | NotSerializable | writer | a reachable object's class is not serializable |
//! | UnknownType | reader | the stream names a class the registry does not know |
//! | Validation | hooks | a custom-read hook rejected the decoded data |
//! | CorruptStream | reader | malformed framing, bad magic, truncated input |
//! | IncompatibleClass | reader | stream and local class descriptions disagree |

use thiserror::Error;

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, Error>;

/// All serialization errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A reachable, non-transient value belongs to a class that is not serializable
    #[error("not serializable: {type_name}")]
    NotSerializable {
        /// Name of the offending class
        type_name: String,
    },

    /// The stream references a class that is not registered
    #[error("unknown type: {type_name}")]
    UnknownType {
        /// Class name as written in the stream
        type_name: String,
    },

    /// A custom-read hook rejected the decoded field values
    #[error("validation failed: {message}")]
    Validation {
        /// Hook-provided reason
        message: String,
    },

    /// Structurally malformed input
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// The stream's description of a class does not match the local one
    #[error("incompatible class {type_name}: {reason}")]
    IncompatibleClass {
        /// Class name
        type_name: String,
        /// What disagreed
        reason: String,
    },

    /// The stream header carries a format version this build cannot read
    #[error("unsupported stream format version {version}")]
    UnsupportedVersion {
        /// Version found in the header
        version: u16,
    },

    /// Object nesting went deeper than the configured limit
    #[error("object graph nesting exceeds limit of {limit}")]
    DepthLimitExceeded {
        /// Configured maximum depth
        limit: usize,
    },

    /// A length prefix exceeded a configured limit
    #[error("{what} length {actual} exceeds limit of {limit}")]
    LimitExceeded {
        /// What was being decoded
        what: &'static str,
        /// Configured limit
        limit: usize,
        /// Length found in the stream
        actual: usize,
    },

    /// A class was declared inconsistently (duplicate field, conflicting hooks)
    #[error("invalid class definition: {0}")]
    InvalidClass(String),

    /// Field lookup on an instance failed
    #[error("{type_name} has no field named {field}")]
    NoSuchField {
        /// Class name
        type_name: String,
        /// Requested field
        field: String,
    },

    /// A value of the wrong kind was assigned to a field
    #[error("field {type_name}.{field} expects {expected}, got {actual}")]
    FieldTypeMismatch {
        /// Class name
        type_name: String,
        /// Field name
        field: String,
        /// Declared field type
        expected: &'static str,
        /// Kind of the rejected value
        actual: &'static str,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error, for use inside custom-read hooks
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a corrupt-stream error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Error::CorruptStream(message.into())
    }

    /// Map an I/O error raised while decoding.
    ///
    /// Running out of input in the middle of a record is a framing problem,
    /// not an I/O problem, so `UnexpectedEof` becomes `CorruptStream`.
    pub fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::CorruptStream("unexpected end of stream".to_string())
        } else {
            Error::Io(err)
        }
    }

    /// Check if this error can only arise while writing
    pub fn is_write_error(&self) -> bool {
        matches!(self, Error::NotSerializable { .. })
    }

    /// Check if this error can only arise while reading
    pub fn is_read_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownType { .. }
                | Error::Validation { .. }
                | Error::CorruptStream(_)
                | Error::IncompatibleClass { .. }
                | Error::UnsupportedVersion { .. }
        )
    }

    /// Check if the input itself is damaged
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptStream(_) | Error::UnsupportedVersion { .. } | Error::LimitExceeded { .. }
        )
    }
}
