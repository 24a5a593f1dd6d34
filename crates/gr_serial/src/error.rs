use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::strategy::StrategyOp;

// -----------------------------------------------------------------------------
// SerialError

/// An enumeration of all error outcomes of the serialization dispatch path.
///
/// Errors raised by user-supplied strategy callbacks are carried through
/// unchanged in the [`Custom`](SerialError::Custom) variant; the engine never
/// wraps, retries or swallows them.
#[derive(Debug)]
pub enum SerialError {
    /// A definition-only (open generic) type key reached an operation that
    /// requires a concrete closed type.
    InvalidType { path: Cow<'static, str> },
    /// An explicit strategy was registered twice for the same key and
    /// operation. The first registration stays intact.
    DuplicateRegistration {
        path: Cow<'static, str>,
        op: StrategyOp,
    },
    /// The type cannot be structurally decomposed and carries no explicit
    /// strategy for the requested operation.
    UnsupportedType { path: Cow<'static, str> },
    /// The byte stream contents are inconsistent with any known type.
    StreamFormat(StreamFormatError),
    /// An error raised by a user-supplied copy/serialize/deserialize callback.
    Custom(Box<dyn core::error::Error + Send + Sync>),
}

impl SerialError {
    /// Wraps a user callback error for unwrapped propagation.
    #[inline]
    pub fn custom(err: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(err))
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidType { path } => {
                write!(f, "`{path}` is not a concrete type and cannot be dispatched")
            }
            Self::DuplicateRegistration { path, op } => {
                write!(f, "a custom {op} strategy is already registered for `{path}`")
            }
            Self::UnsupportedType { path } => {
                write!(f, "no strategy can be synthesized for `{path}`")
            }
            Self::StreamFormat(err) => write!(f, "malformed payload stream: {err}"),
            Self::Custom(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl core::error::Error for SerialError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::StreamFormat(err) => Some(err),
            Self::Custom(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<StreamFormatError> for SerialError {
    #[inline]
    fn from(err: StreamFormatError) -> Self {
        Self::StreamFormat(err)
    }
}

// -----------------------------------------------------------------------------
// StreamFormatError

/// Represents an inconsistency found while reading a payload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFormatError {
    /// The reader ran out of bytes mid-value.
    BufferUnderflow { required: usize, remaining: usize },
    /// A length-prefixed string was not valid UTF-8.
    InvalidUtf8,
    /// A boolean was encoded as something other than 0 or 1.
    InvalidBool(u8),
    /// A `char` was encoded as a non-scalar value.
    InvalidChar(u32),
    /// The discriminator marker byte was neither `SAME` nor `TYPED`.
    InvalidMarker(u8),
    /// A `TYPED` discriminator named a type path with no registered
    /// descriptor.
    UnknownTypeTag(String),
    /// A `SAME` discriminator was read where no expected type is available,
    /// e.g. at the top of a stream.
    MissingExpectedType,
}

impl fmt::Display for StreamFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferUnderflow {
                required,
                remaining,
            } => write!(
                f,
                "buffer underflow, required {required} bytes with {remaining} remaining"
            ),
            Self::InvalidUtf8 => write!(f, "string bytes are not valid UTF-8"),
            Self::InvalidBool(raw) => write!(f, "invalid boolean byte {raw:#04x}"),
            Self::InvalidChar(raw) => write!(f, "invalid char scalar {raw:#010x}"),
            Self::InvalidMarker(raw) => write!(f, "invalid discriminator marker {raw:#04x}"),
            Self::UnknownTypeTag(path) => write!(f, "unknown type tag `{path}`"),
            Self::MissingExpectedType => {
                write!(f, "untyped value read with no expected type in scope")
            }
        }
    }
}

impl core::error::Error for StreamFormatError {}
