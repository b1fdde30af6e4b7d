use thiserror::Error;

/// The error taxonomy surfaced by every fallible entry point in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed regexp; `pos` is the byte offset into the original pattern
    /// text (after the leading `^` adjustment described in the regexp
    /// front-end's anchor handling).
    #[error("parse error at byte {pos}: {message}")]
    Parse { message: String, pos: usize },

    /// A bounded repetition had `min > max` with `max != 0`.
    #[error("invalid repeat: min ({min}) > max ({max})")]
    InvalidRepeat { min: u32, max: u32 },

    /// A character class flattened to zero set bits.
    #[error("character class is empty")]
    EmptyClass,

    /// A binary pattern's total bit length was not a multiple of 8.
    #[error("binary pattern is not byte-aligned ({bits} bits)")]
    NotByteAligned { bits: u32 },

    /// Construction would exceed a caller-supplied state or transition ceiling.
    #[error("limit exceeded: {what} would reach {would_be}, limit is {limit}")]
    LimitExceeded {
        what: &'static str,
        would_be: u32,
        limit: u32,
    },

    /// The caller's cancellation flag was observed raised.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
