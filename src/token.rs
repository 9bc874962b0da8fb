//! The token model: granular structural events that sit between bytes and trees.
//!
//! A well-formed token stream starts with [`Token::Name`]. A name attaches to the
//! single value or start token right after it. Every start token is closed by its
//! matching end token at the same depth, with the container's content in between.
//!
//! Sizes and list element kinds are optional. A producer that does not know them
//! yet may leave them out and run the stream through
//! [`OptionalInfoCalculator`](crate::OptionalInfoCalculator) before writing.

use crate::id::TagId;
use std::fmt;

/// One event of a depth-first walk over an NBT tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// The name of the value that follows.
    Name(String),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArrayStart { size: Option<usize> },
    ByteArrayContent(Vec<i8>),
    ByteArrayEnd,
    IntArrayStart { size: Option<usize> },
    IntArrayContent(Vec<i32>),
    IntArrayEnd,
    LongArrayStart { size: Option<usize> },
    LongArrayContent(Vec<i64>),
    LongArrayEnd,
    ListStart {
        size: Option<usize>,
        element_id: Option<TagId>,
    },
    ListEnd,
    CompoundStart,
    CompoundEnd,
}

impl Token {
    /// The kind of tag this token opens, if it is a value or start token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::{TagId, Token};
    ///
    /// assert_eq!(Token::Int(3).opens(), Some(TagId::Int));
    /// assert_eq!(Token::CompoundStart.opens(), Some(TagId::Compound));
    /// assert_eq!(Token::CompoundEnd.opens(), None);
    /// ```
    #[must_use]
    pub fn opens(&self) -> Option<TagId> {
        Some(match self {
            Token::Byte(_) => TagId::Byte,
            Token::Short(_) => TagId::Short,
            Token::Int(_) => TagId::Int,
            Token::Long(_) => TagId::Long,
            Token::Float(_) => TagId::Float,
            Token::Double(_) => TagId::Double,
            Token::String(_) => TagId::String,
            Token::ByteArrayStart { .. } => TagId::ByteArray,
            Token::IntArrayStart { .. } => TagId::IntArray,
            Token::LongArrayStart { .. } => TagId::LongArray,
            Token::ListStart { .. } => TagId::List,
            Token::CompoundStart => TagId::Compound,
            _ => return None,
        })
    }

    /// The kind of container this token closes, if it is an end token.
    #[must_use]
    pub fn closes(&self) -> Option<TagId> {
        match self {
            Token::ByteArrayEnd => Some(TagId::ByteArray),
            Token::IntArrayEnd => Some(TagId::IntArray),
            Token::LongArrayEnd => Some(TagId::LongArray),
            Token::ListEnd => Some(TagId::List),
            Token::CompoundEnd => Some(TagId::Compound),
            _ => None,
        }
    }

    /// Returns `true` for tokens that open a container.
    #[inline]
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.opens().is_some_and(TagId::is_container)
    }

    /// Returns `true` for array content tokens.
    #[inline]
    #[must_use]
    pub fn is_content(&self) -> bool {
        self.content_of().is_some()
    }

    /// The array kind a content token belongs to.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::{TagId, Token};
    ///
    /// assert_eq!(Token::LongArrayContent(vec![1]).content_of(), Some(TagId::LongArray));
    /// assert_eq!(Token::Long(1).content_of(), None);
    /// ```
    #[must_use]
    pub fn content_of(&self) -> Option<TagId> {
        match self {
            Token::ByteArrayContent(_) => Some(TagId::ByteArray),
            Token::IntArrayContent(_) => Some(TagId::IntArray),
            Token::LongArrayContent(_) => Some(TagId::LongArray),
            _ => None,
        }
    }

    /// Number of array elements carried by a content token, zero otherwise.
    #[must_use]
    pub fn content_len(&self) -> usize {
        match self {
            Token::ByteArrayContent(v) => v.len(),
            Token::IntArrayContent(v) => v.len(),
            Token::LongArrayContent(v) => v.len(),
            _ => 0,
        }
    }

    /// Returns `true` if this is a start token missing its size or element kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::{TagId, Token};
    ///
    /// assert!(Token::IntArrayStart { size: None }.is_missing_info());
    /// assert!(Token::ListStart { size: Some(0), element_id: None }.is_missing_info());
    /// assert!(!Token::ListStart { size: Some(0), element_id: Some(TagId::End) }.is_missing_info());
    /// ```
    #[must_use]
    pub fn is_missing_info(&self) -> bool {
        match self {
            Token::ByteArrayStart { size }
            | Token::IntArrayStart { size }
            | Token::LongArrayStart { size } => size.is_none(),
            Token::ListStart { size, element_id } => size.is_none() || element_id.is_none(),
            _ => false,
        }
    }

    /// The size declared by a start token, if any.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            Token::ByteArrayStart { size }
            | Token::IntArrayStart { size }
            | Token::LongArrayStart { size }
            | Token::ListStart { size, .. } => *size,
            _ => None,
        }
    }

    /// Returns the token with its missing optional info filled in.
    ///
    /// Declared fields are kept. `element_id` is ignored for array starts, and
    /// tokens without optional info are returned unchanged.
    #[must_use]
    pub(crate) fn with_info(self, size: usize, element_id: TagId) -> Token {
        match self {
            Token::ByteArrayStart { size: declared } => Token::ByteArrayStart {
                size: declared.or(Some(size)),
            },
            Token::IntArrayStart { size: declared } => Token::IntArrayStart {
                size: declared.or(Some(size)),
            },
            Token::LongArrayStart { size: declared } => Token::LongArrayStart {
                size: declared.or(Some(size)),
            },
            Token::ListStart {
                size: declared,
                element_id: kind,
            } => Token::ListStart {
                size: declared.or(Some(size)),
                element_id: kind.or(Some(element_id)),
            },
            other => other,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "Name({name:?})"),
            Token::Byte(v) => write!(f, "Byte({v})"),
            Token::Short(v) => write!(f, "Short({v})"),
            Token::Int(v) => write!(f, "Int({v})"),
            Token::Long(v) => write!(f, "Long({v})"),
            Token::Float(v) => write!(f, "Float({v})"),
            Token::Double(v) => write!(f, "Double({v})"),
            Token::String(v) => write!(f, "String({v:?})"),
            Token::ByteArrayContent(v) => write!(f, "ByteArrayContent[{}]", v.len()),
            Token::IntArrayContent(v) => write!(f, "IntArrayContent[{}]", v.len()),
            Token::LongArrayContent(v) => write!(f, "LongArrayContent[{}]", v.len()),
            Token::ListStart { size, element_id } => {
                write!(f, "ListStart(size={size:?}, element={element_id:?})")
            }
            Token::ByteArrayStart { size } => write!(f, "ByteArrayStart(size={size:?})"),
            Token::IntArrayStart { size } => write!(f, "IntArrayStart(size={size:?})"),
            Token::LongArrayStart { size } => write!(f, "LongArrayStart(size={size:?})"),
            Token::ByteArrayEnd => f.write_str("ByteArrayEnd"),
            Token::IntArrayEnd => f.write_str("IntArrayEnd"),
            Token::LongArrayEnd => f.write_str("LongArrayEnd"),
            Token::ListEnd => f.write_str("ListEnd"),
            Token::CompoundStart => f.write_str("CompoundStart"),
            Token::CompoundEnd => f.write_str("CompoundEnd"),
        }
    }
}
