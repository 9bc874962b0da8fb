//! Tag ids and the shape registry shared by the reader and the writer.
//!
//! # Wire format
//!
//! Every NBT document is a depth-first, forward-only byte stream. All numbers are
//! big-endian; floating point values are IEEE-754.
//!
//! | Id | Kind | Payload |
//! |----|------|---------|
//! | 0 | END | none (terminates a compound) |
//! | 1 | BYTE | 1 byte |
//! | 2 | SHORT | 2 bytes |
//! | 3 | INT | 4 bytes |
//! | 4 | LONG | 8 bytes |
//! | 5 | FLOAT | 4 bytes |
//! | 6 | DOUBLE | 8 bytes |
//! | 7 | BYTE_ARRAY | `i32` count, then `count` bytes |
//! | 8 | STRING | `u16` byte length, then modified UTF-8 |
//! | 9 | LIST | element id byte, `i32` count, then `count` anonymous payloads |
//! | 10 | COMPOUND | named entries, then a single END byte |
//! | 11 | INT_ARRAY | `i32` count, then `count` 4-byte ints |
//! | 12 | LONG_ARRAY | `i32` count, then `count` 8-byte longs |
//!
//! A named entry is `id byte + name string + payload`. List elements carry neither
//! id nor name. A document is exactly one named compound, or a lone END byte when
//! empty.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 13 NBT tag kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagId {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

/// How the payload of a tag kind is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagShape {
    /// No payload at all.
    End,
    /// A fixed-width scalar of the given byte width.
    Fixed(usize),
    /// A `u16`-prefixed modified UTF-8 string.
    String,
    /// An `i32` count followed by elements of the given byte width.
    Array(usize),
    /// An element id, an `i32` count, then anonymous elements.
    List,
    /// Named entries terminated by END.
    Compound,
}

const ALL: [TagId; 13] = [
    TagId::End,
    TagId::Byte,
    TagId::Short,
    TagId::Int,
    TagId::Long,
    TagId::Float,
    TagId::Double,
    TagId::ByteArray,
    TagId::String,
    TagId::List,
    TagId::Compound,
    TagId::IntArray,
    TagId::LongArray,
];

impl TagId {
    /// Looks up the tag kind for a wire id byte.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::TagId;
    ///
    /// assert_eq!(TagId::from_id(10), Some(TagId::Compound));
    /// assert_eq!(TagId::from_id(13), None);
    /// ```
    #[must_use]
    pub fn from_id(id: u8) -> Option<TagId> {
        ALL.get(usize::from(id)).copied()
    }

    /// The wire id byte of this kind.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The payload layout of this kind.
    #[must_use]
    pub const fn shape(self) -> TagShape {
        match self {
            TagId::End => TagShape::End,
            TagId::Byte => TagShape::Fixed(1),
            TagId::Short => TagShape::Fixed(2),
            TagId::Int | TagId::Float => TagShape::Fixed(4),
            TagId::Long | TagId::Double => TagShape::Fixed(8),
            TagId::String => TagShape::String,
            TagId::ByteArray => TagShape::Array(1),
            TagId::IntArray => TagShape::Array(4),
            TagId::LongArray => TagShape::Array(8),
            TagId::List => TagShape::List,
            TagId::Compound => TagShape::Compound,
        }
    }

    /// Returns `true` for kinds that open a frame: arrays, lists, and compounds.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self.shape(),
            TagShape::Array(_) | TagShape::List | TagShape::Compound
        )
    }

    /// The upper-case name used in messages, e.g. `BYTE_ARRAY`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TagId::End => "END",
            TagId::Byte => "BYTE",
            TagId::Short => "SHORT",
            TagId::Int => "INT",
            TagId::Long => "LONG",
            TagId::Float => "FLOAT",
            TagId::Double => "DOUBLE",
            TagId::ByteArray => "BYTE_ARRAY",
            TagId::String => "STRING",
            TagId::List => "LIST",
            TagId::Compound => "COMPOUND",
            TagId::IntArray => "INT_ARRAY",
            TagId::LongArray => "LONG_ARRAY",
        }
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
