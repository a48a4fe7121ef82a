//! Library error types.
//!
use std::fmt;

/// A stash-pack Result, normally returning a stash-pack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A stash-pack error. Encompasses any issue that can happen while building
/// one of the container primitives, encoding, decoding, or running the
/// compression pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A type or range precondition was violated by the caller, like an LZW
    /// literal width outside 2..=8 or an extension tag in the reserved range.
    InvalidArgument(String),
    /// An index went past the bounds of a container.
    OutOfRange {
        /// The offending index
        index: usize,
        /// The container's size
        size: usize,
    },
    /// A write was attempted on something that cannot be changed after
    /// construction.
    ReadOnly(&'static str),
    /// A lookup key or value has no entry.
    NotFound(String),
    /// The decoder ran off the end of its input.
    Truncated {
        /// What step of the decoding we were on when it failed.
        step: &'static str,
        /// How many bytes that step needed
        expected: usize,
        /// How many bytes were left
        actual: usize,
    },
    /// A top-level decode finished with input bytes remaining.
    ExtraBytes {
        /// How many bytes were left over
        remaining: usize,
    },
    /// An LZW stream contained a code the decoder cannot resolve.
    InvalidCode(u16),
    /// An LZW stream ended without its eof marker.
    UnexpectedEof,
    /// The decoder saw an extension tag it cannot interpret.
    UnknownExtension(i8),
    /// The decoder saw a well-known-constant selector it cannot interpret.
    UnknownConstant(u8),
    /// An LZW encoder input byte didn't fit in the configured literal width.
    LiteralOverflow {
        /// The offending byte
        byte: u8,
        /// The largest literal the current width allows
        max: u8,
    },
    /// The encoder was asked to serialize something it has no encoding for.
    UnsupportedValue(&'static str),
    /// Basic data encoding failure: the input is malformed in a way that
    /// isn't simple truncation, like invalid UTF-8 or a reserved marker.
    BadEncode(String),
    /// Decoding hit the nesting-depth limit.
    ParseLimit(&'static str),
    /// The pipeline's version tag didn't match the stored one.
    VersionMismatch {
        /// The version the pipeline was configured with
        expected: u8,
        /// The version found in the data
        actual: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidArgument(ref err) => write!(f, "Invalid argument: {}", err),
            Error::OutOfRange { index, size } => {
                write!(f, "Index {} is out of range for size {}", index, size)
            }
            Error::ReadOnly(what) => write!(f, "{} cannot be modified", what),
            Error::NotFound(ref what) => write!(f, "No entry for {}", what),
            Error::Truncated {
                step,
                expected,
                actual,
            } => write!(
                f,
                "Input ended early: needed {} bytes but had {} on step [{}]",
                expected, actual, step
            ),
            Error::ExtraBytes { remaining } => {
                write!(f, "Decoding finished with {} bytes remaining", remaining)
            }
            Error::InvalidCode(code) => write!(f, "LZW stream holds unresolvable code {}", code),
            Error::UnexpectedEof => write!(f, "LZW stream ended without an eof code"),
            Error::UnknownExtension(tag) => write!(f, "Unknown extension tag {}", tag),
            Error::UnknownConstant(sel) => write!(f, "Unknown constant selector {}", sel),
            Error::LiteralOverflow { byte, max } => write!(
                f,
                "Input byte {:#04x} exceeds largest literal {:#04x}",
                byte, max
            ),
            Error::UnsupportedValue(what) => write!(f, "Cannot serialize {}", what),
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::ParseLimit(what) => write!(f, "Hit parsing limit: {}", what),
            Error::VersionMismatch { expected, actual } => write!(
                f,
                "Expected data version {}, but data used version {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {}
