//! Error Types
//!
//! Three error kinds, matching the three failure classes the system
//! distinguishes: usage errors (programming mistakes, non-retryable),
//! data errors (corruption, fatal, never silently recovered), and
//! transactional errors (raised by the OKVS backend itself). All three
//! unify under [`Error`] so pipeline code can use `?` throughout.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type unifying usage, codec and transactional failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Txn(#[from] TxnError),
}

/// Programming errors surfaced synchronously at the site of composition or
/// first pull. Never retryable: the caller's pattern or schema is wrong.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("pattern arity {pattern_arity} does not match relation '{relation}' arity {relation_arity}")]
    ArityMismatch { relation: String, pattern_arity: usize, relation_arity: usize },

    #[error("no planned permutation covers bound columns {bound:?} of relation '{relation}' (arity {arity})")]
    NoCoveringPermutation { relation: String, arity: usize, bound: Vec<usize> },

    #[error("relation '{0}' is not registered with this database")]
    UnknownRelation(String),

    #[error("relation '{0}' is already registered with a different arity")]
    RelationRedeclared(String),

    #[error("variable '{0}' is not bound in this binding")]
    UnboundVariable(String),
}

/// Fatal data-integrity errors: malformed encodings, missing permutation
/// entries. These indicate corruption and are never silently recovered.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unknown type tag 0x{0:02x} at offset {1}")]
    UnknownTag(u8, usize),

    #[error("truncated payload for tag 0x{0:02x} at offset {1}: expected {2} more byte(s)")]
    TruncatedPayload(u8, usize, usize),

    #[error("invalid UTF-8 in text value at offset {0}")]
    InvalidUtf8(usize),

    #[error("integer magnitude exceeds the supported 16-byte (i128) range")]
    IntegerOverflow,

    #[error("trailing bytes after decoding a complete tuple (offset {0} of {1})")]
    TrailingBytes(usize, usize),
}

/// Errors raised by the OKVS backend itself: I/O failures, use-after-close,
/// and other backend failures. Propagated through the `@transactional`
/// wrapper, which always rolls back before returning one of these.
#[derive(Error, Debug)]
pub enum TxnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transaction already committed or rolled back")]
    AlreadyClosed,

    #[error("backend error: {0}")]
    Backend(String),
}
