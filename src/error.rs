//! Error types for NBT decoding, encoding, and tree construction.
//!
//! ## Error Categories
//!
//! - **Decode Errors**: Malformed bytes (unknown tag id, negative length, bad string data),
//!   always carrying the byte offset where the problem was found
//! - **Encode Errors**: The token stream handed to the writer broke its preconditions
//!   (no leading name, unresolved sizes or element kinds, misplaced tokens)
//! - **Builder Errors**: A list or compound rejected a child, or a lookup failed
//! - **I/O Errors**: Failures of the underlying reader or writer, passed through untouched
//!
//! Truncated input is not a decode error of its own: it surfaces as
//! [`Error::Io`] with [`std::io::ErrorKind::UnexpectedEof`].
//!
//! ## Examples
//!
//! ```rust
//! use nbt_stream::{from_slice, Error};
//!
//! // Tag id 42 does not exist.
//! let err = from_slice(&[42, 0, 0]).unwrap_err();
//! assert!(matches!(err, Error::UnknownTagId { id: 42, offset: 0 }));
//! assert!(err.is_decode());
//! ```

use crate::id::TagId;
use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors raised while reading, writing, or building tags.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying reader or writer
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A tag id byte outside of `0..=12`
    #[error("Unknown tag id {id} at offset {offset}")]
    UnknownTagId { id: u8, offset: u64 },

    /// A declared array or list length below zero
    #[error("Negative length {length} at offset {offset}")]
    NegativeLength { length: i32, offset: u64 },

    /// String bytes that are not valid modified UTF-8
    #[error("Invalid string at offset {offset}: {reason}")]
    InvalidString { offset: u64, reason: String },

    /// Nesting deeper than the configured limit
    #[error("Nesting depth {depth} exceeds the limit at offset {offset}")]
    TooDeep { depth: usize, offset: u64 },

    /// Any other malformed input
    #[error("Decode error at offset {offset}: {msg}")]
    Decode { offset: u64, msg: String },

    /// The first token handed to the writer was not a name
    #[error("Expected first token to be a name")]
    MissingRootName,

    /// A start token reached the writer without its size or element kind
    #[error("Missing optional info on {token}; calculate optional info before writing")]
    MissingInfo { token: String },

    /// A token that cannot be written where it appears
    #[error("Encode error: {0}")]
    Encode(String),

    /// A list child whose kind differs from the list's element kind
    #[error("Element is not of type {expected} but {found}")]
    ElementMismatch { expected: TagId, found: TagId },

    /// An END tag added to a compound
    #[error("Cannot add END tag to compound tag")]
    EndInCompound,

    /// A non-empty list declaring END as its element kind
    #[error("A non-empty list cannot be of type END")]
    EndTypedList,

    /// A name added twice to a strict compound builder
    #[error("Duplicate name '{0}' in compound tag")]
    DuplicateName(String),

    /// Compound lookup for a name that is not present
    #[error("No tag under the name '{0}' exists")]
    NoSuchTag(String),

    /// Compound lookup for a name that holds a different kind of tag
    #[error("Tag under '{name}' exists, but is a {found} instead of {expected}")]
    WrongTagType {
        name: String,
        expected: TagId,
        found: TagId,
    },

    /// A token stream that does not describe a well-formed tree
    #[error("Structure error: {0}")]
    Structure(String),

    /// A document consisting of only the END byte has no root tree
    #[error("Document is empty")]
    EmptyDocument,
}

impl Error {
    /// Creates a generic decode error at the given byte offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::Error;
    ///
    /// let err = Error::decode(17, "list of END cannot hold elements");
    /// assert!(err.to_string().contains("offset 17"));
    /// ```
    pub fn decode(offset: u64, msg: &str) -> Self {
        Error::Decode {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates an encode error for a token the writer cannot place.
    pub fn encode<T: fmt::Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }

    /// Creates a structure error for a malformed token stream.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::Error;
    ///
    /// let err = Error::structure("unexpected ListEnd");
    /// assert_eq!(err.to_string(), "Structure error: unexpected ListEnd");
    /// ```
    pub fn structure<T: fmt::Display>(msg: T) -> Self {
        Error::Structure(msg.to_string())
    }

    /// Returns `true` for errors raised while decoding bytes.
    ///
    /// I/O failures are not included; see [`Error::is_io`].
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::UnknownTagId { .. }
                | Error::NegativeLength { .. }
                | Error::InvalidString { .. }
                | Error::TooDeep { .. }
                | Error::Decode { .. }
        )
    }

    /// Returns `true` for writer precondition violations.
    #[must_use]
    pub fn is_encode(&self) -> bool {
        matches!(
            self,
            Error::MissingRootName | Error::MissingInfo { .. } | Error::Encode(_)
        )
    }

    /// Returns `true` if this wraps an I/O failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
