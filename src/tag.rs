//! The in-memory tag tree.
//!
//! [`Tag`] is the tagged union of all 13 kinds. Containers own their children, so
//! a tree is strictly hierarchical and is dropped like any other value. Tags are
//! immutable once built; [`ListTag`] and [`CompoundTag`] are assembled through
//! their builders.
//!
//! ## Tags as tokens
//!
//! Every tag can describe itself as tokens with [`Tag::tokens`]. A tag emits its
//! opening token, its children's tokens, and its closing token, but never its own
//! name: naming a child is the job of the enclosing compound. A full document is
//! a [`RootEntry`], which emits the root name followed by the root compound.
//!
//! ```rust
//! use nbt_stream::{compound, RootEntry, Token};
//!
//! let root = RootEntry::new("level", compound! { "x" => 1i8 }?);
//! let tokens: Vec<Token> = root.tokens().collect();
//! assert_eq!(tokens, vec![
//!     Token::Name("level".to_string()),
//!     Token::CompoundStart,
//!     Token::Name("x".to_string()),
//!     Token::Byte(1),
//!     Token::CompoundEnd,
//! ]);
//! # Ok::<(), nbt_stream::Error>(())
//! ```

use crate::array::{ByteArrayTag, IntArrayTag, LongArrayTag};
use crate::compound::CompoundTag;
use crate::id::TagId;
use crate::list::ListTag;
use crate::token::Token;
use crate::tree::TreeReader;
use crate::Result;
use serde::{Serialize, Serializer};
use std::iter;
use std::slice::{Chunks, Iter};

/// One node of an NBT tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(ByteArrayTag),
    String(String),
    List(ListTag),
    Compound(CompoundTag),
    IntArray(IntArrayTag),
    LongArray(LongArrayTag),
}

impl Tag {
    /// The kind of this tag.
    #[must_use]
    pub fn id(&self) -> TagId {
        match self {
            Tag::End => TagId::End,
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) => TagId::String,
            Tag::List(_) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }

    /// Lazily emits the tokens of this tag, without a leading name.
    ///
    /// [`Tag::End`] emits nothing.
    pub fn tokens(&self) -> TagTokens<'_> {
        TagTokens {
            head: None,
            next_open: Some(self),
            stack: Vec::new(),
        }
    }

    /// Builds a tag from an unnamed token run, such as one produced by [`Tag::tokens`].
    ///
    /// # Errors
    ///
    /// Returns the first error of `tokens`, or [`Error::Structure`](crate::Error::Structure)
    /// if the run is not one well-formed tag.
    pub fn read_from<I>(tokens: I) -> Result<Tag>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        TreeReader::new(tokens.into_iter()).read_tag()
    }

    #[inline]
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self, Tag::Compound(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Tag::List(_))
    }

    /// Returns the value of a BYTE tag.
    #[must_use]
    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of a SHORT tag.
    #[must_use]
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of an INT tag.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of any integer tag, widened to `i64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::Tag;
    ///
    /// assert_eq!(Tag::Byte(-1).as_i64(), Some(-1));
    /// assert_eq!(Tag::Long(1 << 40).as_i64(), Some(1 << 40));
    /// assert_eq!(Tag::Double(1.0).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(i64::from(*v)),
            Tag::Short(v) => Some(i64::from(*v)),
            Tag::Int(v) => Some(i64::from(*v)),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of a FLOAT or DOUBLE tag as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Float(v) => Some(f64::from(*v)),
            Tag::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_byte_array(&self) -> Option<&ByteArrayTag> {
        match self {
            Tag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int_array(&self) -> Option<&IntArrayTag> {
        match self {
            Tag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_long_array(&self) -> Option<&LongArrayTag> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ListTag> {
        match self {
            Tag::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_compound(&self) -> Option<&CompoundTag> {
        match self {
            Tag::Compound(v) => Some(v),
            _ => None,
        }
    }
}

/// Walk state of one open container.
enum Walk<'a> {
    Compound(indexmap::map::Iter<'a, String, Tag>),
    List(Iter<'a, Tag>),
    ByteArray(Chunks<'a, i8>),
    IntArray(Chunks<'a, i32>),
    LongArray(Chunks<'a, i64>),
}

/// Lazy token iterator over a borrowed tag, returned by [`Tag::tokens`].
pub struct TagTokens<'a> {
    head: Option<Token>,
    /// Tag whose opening token comes next, set after a compound emits a name.
    next_open: Option<&'a Tag>,
    stack: Vec<Walk<'a>>,
}

impl<'a> TagTokens<'a> {
    pub(crate) fn for_compound(compound: &'a CompoundTag) -> Self {
        TagTokens {
            head: Some(Token::CompoundStart),
            next_open: None,
            stack: vec![Walk::Compound(compound.iter())],
        }
    }

    fn open(&mut self, tag: &'a Tag) -> Option<Token> {
        Some(match tag {
            Tag::End => return self.next(),
            Tag::Byte(v) => Token::Byte(*v),
            Tag::Short(v) => Token::Short(*v),
            Tag::Int(v) => Token::Int(*v),
            Tag::Long(v) => Token::Long(*v),
            Tag::Float(v) => Token::Float(*v),
            Tag::Double(v) => Token::Double(*v),
            Tag::String(v) => Token::String(v.clone()),
            Tag::ByteArray(v) => {
                self.stack.push(Walk::ByteArray(v.chunks()));
                Token::ByteArrayStart {
                    size: Some(v.len()),
                }
            }
            Tag::IntArray(v) => {
                self.stack.push(Walk::IntArray(v.chunks()));
                Token::IntArrayStart {
                    size: Some(v.len()),
                }
            }
            Tag::LongArray(v) => {
                self.stack.push(Walk::LongArray(v.chunks()));
                Token::LongArrayStart {
                    size: Some(v.len()),
                }
            }
            Tag::List(v) => {
                self.stack.push(Walk::List(v.iter()));
                Token::ListStart {
                    size: Some(v.len()),
                    element_id: Some(v.element_id()),
                }
            }
            Tag::Compound(v) => {
                self.stack.push(Walk::Compound(v.iter()));
                Token::CompoundStart
            }
        })
    }
}

impl<'a> Iterator for TagTokens<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.head.take() {
            return Some(token);
        }
        if let Some(tag) = self.next_open.take() {
            return self.open(tag);
        }
        let end = match self.stack.last_mut()? {
            Walk::Compound(entries) => match entries.next() {
                Some((name, tag)) => {
                    self.next_open = Some(tag);
                    return Some(Token::Name(name.clone()));
                }
                None => Token::CompoundEnd,
            },
            Walk::List(items) => match items.next() {
                Some(tag) => return self.open(tag),
                None => Token::ListEnd,
            },
            Walk::ByteArray(chunks) => match chunks.next() {
                Some(chunk) => return Some(Token::ByteArrayContent(chunk.to_vec())),
                None => Token::ByteArrayEnd,
            },
            Walk::IntArray(chunks) => match chunks.next() {
                Some(chunk) => return Some(Token::IntArrayContent(chunk.to_vec())),
                None => Token::IntArrayEnd,
            },
            Walk::LongArray(chunks) => match chunks.next() {
                Some(chunk) => return Some(Token::LongArrayContent(chunk.to_vec())),
                None => Token::LongArrayEnd,
            },
        };
        self.stack.pop();
        Some(end)
    }
}

impl iter::FusedIterator for TagTokens<'_> {}

/// A complete document: the root compound and its name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootEntry {
    pub name: String,
    pub value: CompoundTag,
}

impl RootEntry {
    #[must_use]
    pub fn new<K: Into<String>>(name: K, value: CompoundTag) -> Self {
        RootEntry {
            name: name.into(),
            value,
        }
    }

    /// Lazily emits the root name followed by the root compound's tokens.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        iter::once(Token::Name(self.name.clone())).chain(self.value.tokens())
    }

    /// Builds a document from a token stream that starts with the root name.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDocument`](crate::Error::EmptyDocument) for an empty stream,
    /// [`Error::Structure`](crate::Error::Structure) for a malformed one, or the
    /// first error of `tokens`.
    pub fn read_from<I>(tokens: I) -> Result<RootEntry>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        TreeReader::new(tokens.into_iter()).read_root()
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tag::End => serializer.serialize_unit(),
            Tag::Byte(v) => serializer.serialize_i8(*v),
            Tag::Short(v) => serializer.serialize_i16(*v),
            Tag::Int(v) => serializer.serialize_i32(*v),
            Tag::Long(v) => serializer.serialize_i64(*v),
            Tag::Float(v) => serializer.serialize_f32(*v),
            Tag::Double(v) => serializer.serialize_f64(*v),
            Tag::String(v) => serializer.serialize_str(v),
            Tag::ByteArray(v) => v.serialize(serializer),
            Tag::IntArray(v) => v.serialize(serializer),
            Tag::LongArray(v) => v.serialize(serializer),
            Tag::List(v) => v.serialize(serializer),
            Tag::Compound(v) => v.serialize(serializer),
        }
    }
}

impl From<i8> for Tag {
    fn from(value: i8) -> Self {
        Tag::Byte(value)
    }
}

impl From<i16> for Tag {
    fn from(value: i16) -> Self {
        Tag::Short(value)
    }
}

impl From<i32> for Tag {
    fn from(value: i32) -> Self {
        Tag::Int(value)
    }
}

impl From<i64> for Tag {
    fn from(value: i64) -> Self {
        Tag::Long(value)
    }
}

impl From<f32> for Tag {
    fn from(value: f32) -> Self {
        Tag::Float(value)
    }
}

impl From<f64> for Tag {
    fn from(value: f64) -> Self {
        Tag::Double(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::String(value)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_string())
    }
}

impl From<ByteArrayTag> for Tag {
    fn from(value: ByteArrayTag) -> Self {
        Tag::ByteArray(value)
    }
}

impl From<IntArrayTag> for Tag {
    fn from(value: IntArrayTag) -> Self {
        Tag::IntArray(value)
    }
}

impl From<LongArrayTag> for Tag {
    fn from(value: LongArrayTag) -> Self {
        Tag::LongArray(value)
    }
}

impl From<ListTag> for Tag {
    fn from(value: ListTag) -> Self {
        Tag::List(value)
    }
}

impl From<CompoundTag> for Tag {
    fn from(value: CompoundTag) -> Self {
        Tag::Compound(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound;

    #[test]
    fn test_scalar_tokens() {
        assert_eq!(Tag::Int(5).tokens().collect::<Vec<_>>(), vec![Token::Int(5)]);
        assert_eq!(Tag::End.tokens().count(), 0);
    }

    #[test]
    fn test_list_children_are_unnamed() {
        let list = ListTag::new(TagId::Int, vec![Tag::Int(1), Tag::Int(2)]).unwrap();
        let tokens: Vec<Token> = Tag::List(list).tokens().collect();
        assert_eq!(
            tokens,
            vec![
                Token::ListStart {
                    size: Some(2),
                    element_id: Some(TagId::Int)
                },
                Token::Int(1),
                Token::Int(2),
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_nested_compound_names_children() {
        let inner = compound! { "b" => 2i16 }.unwrap();
        let outer = compound! { "a" => inner }.unwrap();
        let tokens: Vec<Token> = Tag::Compound(outer).tokens().collect();
        assert_eq!(
            tokens,
            vec![
                Token::CompoundStart,
                Token::Name("a".to_string()),
                Token::CompoundStart,
                Token::Name("b".to_string()),
                Token::Short(2),
                Token::CompoundEnd,
                Token::CompoundEnd,
            ]
        );
    }

    #[test]
    fn test_large_array_is_chunked() {
        let tag = Tag::ByteArray(ByteArrayTag::from(vec![1i8; 5000]));
        let tokens: Vec<Token> = tag.tokens().collect();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Token::ByteArrayStart { size: Some(5000) });
        assert_eq!(tokens[1].content_len(), 4096);
        assert_eq!(tokens[2].content_len(), 904);
        assert_eq!(tokens[3], Token::ByteArrayEnd);
    }

    #[test]
    fn test_read_back_from_own_tokens() {
        let list = ListTag::new(
            TagId::Compound,
            vec![Tag::Compound(compound! { "x" => 1.5f32 }.unwrap())],
        )
        .unwrap();
        let tag = Tag::List(list);
        let back = Tag::read_from(tag.tokens().map(Ok)).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Tag::from("s").as_str(), Some("s"));
        assert_eq!(Tag::from(2.5f32).as_f64(), Some(2.5));
        assert_eq!(Tag::from(7i16).as_i16(), Some(7));
        assert_eq!(Tag::from(7i16).as_i32(), None);
        assert!(Tag::from(CompoundTag::new()).is_compound());
        assert!(Tag::from(ListTag::empty(TagId::End)).is_list());
    }

    #[test]
    fn test_serialize() {
        let tag = Tag::Compound(
            compound! {
                "name" => "Steve",
                "pos" => ListTag::new(TagId::Double, vec![Tag::Double(1.5), Tag::Double(-2.0)]).unwrap(),
            }
            .unwrap(),
        );
        assert_eq!(
            serde_json::to_string(&tag).unwrap(),
            r#"{"name":"Steve","pos":[1.5,-2.0]}"#
        );
    }
}
