// ABOUTME: Error types for MessagePack decoding and encoding.
// ABOUTME: Every decode error carries the absolute byte offset where it was detected.

use std::fmt;
use thiserror::Error;

/// The result type for MessagePack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of variable-length item a [`LimitPolicy`](crate::LimitPolicy) bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    Str,
    Bin,
    Array,
    Map,
    Ext,
}

impl LimitKind {
    /// Name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LimitKind::Str => "string",
            LimitKind::Bin => "binary",
            LimitKind::Array => "array",
            LimitKind::Map => "map",
            LimitKind::Ext => "extension",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during MessagePack decoding or encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The input ended before the value at `offset` was complete.
    ///
    /// Terminal for synchronous decoding; the incremental decoder turns it into a
    /// "need more input" signal instead.
    #[error("incomplete input: {needed} more byte(s) needed at offset {offset}")]
    IncompleteInput { offset: usize, needed: usize },

    /// A byte that the format never assigns was found where a tag was expected.
    #[error("unrecognized tag 0x{tag:02x} at offset {offset}")]
    UnrecognizedTag { tag: u8, offset: usize },

    /// A declared length exceeds the configured maximum for its kind.
    #[error("{kind} length {length} exceeds maximum {max}")]
    LimitExceeded {
        kind: LimitKind,
        length: usize,
        max: usize,
    },

    /// Map keys are not strictly increasing (or are duplicated) with `sorted_keys` on.
    #[error("map key out of order or duplicated before offset {offset}")]
    KeyOrderViolation { offset: usize },

    /// An integer does not fit the fixed-width encoding it was asked to occupy.
    #[error("integer {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    /// The extension codec has no decoder for this extension type.
    #[error("unknown extension type {0}")]
    UnknownExtensionType(i8),

    /// The extension codec rejected the payload of a known extension type.
    #[error("malformed extension of type {ext_type}: {reason}")]
    MalformedExtension { ext_type: i8, reason: String },

    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Bytes were left over after a single complete value.
    #[error("extra {count} byte(s) found at offset {offset}")]
    ExtraBytes { offset: usize, count: usize },

    /// A 64-bit word access does not fit inside its byte view.
    #[error("8-byte access at offset {offset} is out of bounds for a view of {len} bytes")]
    ViewOutOfBounds { offset: usize, len: usize },

    /// IO error during encoding.
    #[error("I/O error: {0}")]
    Io(String),

    /// Custom error message (for serde integration).
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Returns a stable snake_case name for the error kind.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::IncompleteInput { .. } => "incomplete_input",
            Error::UnrecognizedTag { .. } => "unrecognized_tag",
            Error::LimitExceeded { .. } => "limit_exceeded",
            Error::KeyOrderViolation { .. } => "key_order_violation",
            Error::Overflow { .. } => "overflow",
            Error::UnknownExtensionType(_) => "unknown_extension_type",
            Error::MalformedExtension { .. } => "malformed_extension",
            Error::InvalidUtf8 { .. } => "invalid_utf8",
            Error::ExtraBytes { .. } => "extra_bytes",
            Error::ViewOutOfBounds { .. } => "view_out_of_bounds",
            Error::Io(_) => "io_error",
            Error::Custom(_) => "custom",
        }
    }

    /// True when more input could let the decode succeed.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::IncompleteInput { .. })
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
