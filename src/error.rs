//! Error types for the decoder.
//!
//! The decoder recognizes exactly two failure kinds: a caller contract
//! broken ([`Error::Assertion`]) and corrupt or truncated input
//! ([`Error::Decode`]). Both are fatal — there is no partial result.

use std::fmt;

/// A result of a fallible decode operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while decoding a sample archive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller contract was broken: a null container handle was passed, a
    /// string/wstring-to-numeric conversion was attempted, or some other
    /// precondition the caller is responsible for upholding didn't hold.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// The input bytes don't match the expected wire format: a bounds check
    /// failed, an unknown POD byte was encountered, or a size-hinted field
    /// ran past the end of its buffer.
    #[error("decode failed: {0}")]
    Decode(String),
}

impl Error {
    pub(crate) fn assertion(msg: impl fmt::Display) -> Self {
        Error::Assertion(msg.to_string())
    }

    pub(crate) fn decode(msg: impl fmt::Display) -> Self {
        Error::Decode(msg.to_string())
    }
}
