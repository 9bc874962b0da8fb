//! Rebuilding tag trees from token streams.
//!
//! [`TreeReader`] walks a token stream with an explicit stack of open container
//! frames. Each token is routed to the frame on top of the stack: a compound
//! frame expects a [`Token::Name`] before every child and keys it by
//! [`Key::Name`], a list frame keys its children by [`Key::Index`], and an array
//! frame takes content tokens.
//!
//! What a frame does with its children is up to a [`TagVisitor`]. The frame on
//! top of the stack acts as the factory for the routine of each child container
//! it opens, and when a child finishes, either at its end token or immediately
//! for a scalar, the enclosing frame receives it through
//! [`accept_child`](TagVisitor::accept_child). The outermost finished value is
//! returned to the caller. [`TagBuilder`] is the visitor that builds [`Tag`]s;
//! others can validate or extract without building a tree.
//!
//! Lists may leave out their size and element kind. The element kind is then
//! taken from the first child and an empty list becomes END typed, the same rule
//! [`OptionalInfoCalculator`](crate::OptionalInfoCalculator) applies. A declared
//! size or element kind is checked against the children that actually arrive.
//!
//! ```rust
//! use nbt_stream::{Tag, TagId, Token, TreeReader};
//!
//! let tokens = vec![
//!     Token::ListStart { size: None, element_id: None },
//!     Token::Short(1),
//!     Token::Short(2),
//!     Token::ListEnd,
//! ];
//! let tag = TreeReader::new(tokens.into_iter().map(Ok)).read_tag()?;
//! let list = tag.as_list().unwrap();
//! assert_eq!(list.element_id(), TagId::Short);
//! assert_eq!(list.get(1), Some(&Tag::Short(2)));
//! # Ok::<(), nbt_stream::Error>(())
//! ```

use crate::array::{ByteArrayTag, IntArrayTag, LongArrayTag};
use crate::compound::CompoundBuilder;
use crate::id::TagId;
use crate::list::ListBuilder;
use crate::tag::{RootEntry, Tag};
use crate::token::Token;
use crate::{Error, Result};
use std::fmt;
use tracing::{debug, trace};

/// Upper bound on elements reserved up front from a declared size.
const MAX_PREALLOCATED: usize = 1 << 16;

/// How a child is addressed inside its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A compound entry.
    Name(String),
    /// A list element.
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "'{name}'"),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// The construction routine of one open container, driven by [`TreeReader`].
///
/// The driver owns the stack of open routines and checks the token structure:
/// names only inside compounds, content only inside an array of the same kind,
/// and every end token matching its start. A routine only sees the events of
/// its own container.
///
/// The value passed to [`TreeReader::visit`] never holds a container itself. It
/// is the factory for the outermost routine and, for a scalar, turns it into the
/// finished value.
pub trait TagVisitor: Sized {
    /// What a finished child hands to its parent.
    type Output;

    /// Creates the routine for a child container opened by `start` at `key`.
    fn enter(&mut self, key: &Key, start: &Token) -> Result<Self>;

    /// Turns the scalar `value` at `key` into a finished child.
    fn leaf(&mut self, key: &Key, value: Token) -> Result<Self::Output>;

    /// Receives one content token of an array. Ignored by default.
    fn content(&mut self, token: Token) -> Result<()> {
        let _ = token;
        Ok(())
    }

    /// Completion callback: a child of this container has finished.
    fn accept_child(&mut self, key: Key, child: Self::Output) -> Result<()>;

    /// Closes this container at its end token.
    fn finish(self) -> Result<Self::Output>;
}

/// In-progress state of one open container.
enum Builder {
    /// The outermost factory, holding no container.
    Detached,
    Compound(CompoundBuilder),
    List {
        /// `None` until the element kind is declared or fixed by the first child.
        builder: Option<ListBuilder>,
        size: Option<usize>,
    },
    ByteArray(Vec<i8>, Option<usize>),
    IntArray(Vec<i32>, Option<usize>),
    LongArray(Vec<i64>, Option<usize>),
}

impl Builder {
    fn kind(&self) -> TagId {
        match self {
            Builder::Detached => TagId::End,
            Builder::Compound(_) => TagId::Compound,
            Builder::List { .. } => TagId::List,
            Builder::ByteArray(..) => TagId::ByteArray,
            Builder::IntArray(..) => TagId::IntArray,
            Builder::LongArray(..) => TagId::LongArray,
        }
    }

    fn children(&self) -> usize {
        match self {
            Builder::Detached => 0,
            Builder::Compound(builder) => builder.len(),
            Builder::List { builder, .. } => builder.as_ref().map_or(0, ListBuilder::len),
            Builder::ByteArray(values, _) => values.len(),
            Builder::IntArray(values, _) => values.len(),
            Builder::LongArray(values, _) => values.len(),
        }
    }

    fn accept_child(&mut self, key: Key, tag: Tag) -> Result<()> {
        match (self, key) {
            (Builder::Compound(builder), Key::Name(name)) => {
                builder.put(name, tag)?;
            }
            (Builder::List { builder, .. }, Key::Index(_)) => {
                let id = tag.id();
                builder
                    .get_or_insert_with(|| ListBuilder::new(id))
                    .add(tag)?;
            }
            (builder, key) => {
                return Err(Error::structure(format!(
                    "{} cannot hold a child at {key}",
                    builder.kind()
                )))
            }
        }
        Ok(())
    }

    fn append(&mut self, token: Token) -> Result<()> {
        match (self, token) {
            (Builder::ByteArray(values, _), Token::ByteArrayContent(chunk)) => {
                values.extend(chunk);
            }
            (Builder::IntArray(values, _), Token::IntArrayContent(chunk)) => {
                values.extend(chunk);
            }
            (Builder::LongArray(values, _), Token::LongArrayContent(chunk)) => {
                values.extend(chunk);
            }
            (builder, token) => {
                return Err(Error::structure(format!(
                    "unexpected {token} inside {}",
                    builder.kind()
                )))
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Tag> {
        let kind = self.kind();
        let count = self.children();
        let declared = match &self {
            Builder::Detached | Builder::Compound(_) => None,
            Builder::List { size, .. }
            | Builder::ByteArray(_, size)
            | Builder::IntArray(_, size)
            | Builder::LongArray(_, size) => *size,
        };
        if let Some(size) = declared.filter(|&size| size != count) {
            return Err(Error::structure(format!(
                "{kind} declared {size} elements but held {count}"
            )));
        }
        Ok(match self {
            Builder::Detached => return Err(Error::structure("no open container to finish")),
            Builder::Compound(builder) => Tag::Compound(builder.build()),
            Builder::List { builder, .. } => Tag::List(
                builder
                    .unwrap_or_else(|| ListBuilder::new(TagId::End))
                    .build()?,
            ),
            Builder::ByteArray(values, _) => Tag::ByteArray(ByteArrayTag::from(values)),
            Builder::IntArray(values, _) => Tag::IntArray(IntArrayTag::from(values)),
            Builder::LongArray(values, _) => Tag::LongArray(LongArrayTag::from(values)),
        })
    }
}

fn reserve(size: Option<usize>) -> usize {
    size.unwrap_or(0).min(MAX_PREALLOCATED)
}

/// The [`TagVisitor`] that builds [`Tag`]s.
///
/// Compounds are built in loose mode, so a later entry with the same name
/// replaces an earlier one.
pub struct TagBuilder(Builder);

impl TagBuilder {
    /// Creates the outermost factory.
    pub fn new() -> Self {
        TagBuilder(Builder::Detached)
    }
}

impl Default for TagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TagVisitor for TagBuilder {
    type Output = Tag;

    fn enter(&mut self, key: &Key, start: &Token) -> Result<Self> {
        let builder = match *start {
            Token::ByteArrayStart { size } => {
                Builder::ByteArray(Vec::with_capacity(reserve(size)), size)
            }
            Token::IntArrayStart { size } => {
                Builder::IntArray(Vec::with_capacity(reserve(size)), size)
            }
            Token::LongArrayStart { size } => {
                Builder::LongArray(Vec::with_capacity(reserve(size)), size)
            }
            Token::ListStart { size, element_id } => Builder::List {
                builder: element_id.map(ListBuilder::new),
                size,
            },
            Token::CompoundStart => Builder::Compound(CompoundBuilder::loose()),
            ref other => {
                return Err(Error::structure(format!(
                    "expected a container at {key}, found {other}"
                )))
            }
        };
        Ok(TagBuilder(builder))
    }

    fn leaf(&mut self, key: &Key, value: Token) -> Result<Tag> {
        Ok(match value {
            Token::Byte(v) => Tag::Byte(v),
            Token::Short(v) => Tag::Short(v),
            Token::Int(v) => Tag::Int(v),
            Token::Long(v) => Tag::Long(v),
            Token::Float(v) => Tag::Float(v),
            Token::Double(v) => Tag::Double(v),
            Token::String(v) => Tag::String(v),
            other => {
                return Err(Error::structure(format!(
                    "expected a value at {key}, found {other}"
                )))
            }
        })
    }

    fn content(&mut self, token: Token) -> Result<()> {
        self.0.append(token)
    }

    fn accept_child(&mut self, key: Key, child: Tag) -> Result<()> {
        self.0.accept_child(key, child)
    }

    fn finish(self) -> Result<Tag> {
        self.0.finish()
    }
}

struct Frame<V> {
    key: Key,
    kind: TagId,
    /// Children accepted so far, which is also the index of the next list element.
    children: usize,
    routine: V,
}

enum Step<T> {
    Open(Key, Token),
    Done(Key, T),
    Continue,
}

/// Drives a [`TagVisitor`] over a token stream, building tag trees by default.
pub struct TreeReader<I> {
    tokens: I,
}

impl<I> TreeReader<I>
where
    I: Iterator<Item = Result<Token>>,
{
    /// Wraps a token stream. Nothing is read until a tag is requested.
    pub fn new(tokens: I) -> Self {
        TreeReader { tokens }
    }

    /// Gives back the token stream, positioned after the last tag read.
    pub fn into_inner(self) -> I {
        self.tokens
    }

    /// Reads a full document: the root name followed by the root compound.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDocument`] if the stream is empty
    /// - [`Error::Structure`] if the stream does not start with a name and a
    ///   compound, or is malformed further in
    /// - the first error of the token stream itself
    pub fn read_root(&mut self) -> Result<RootEntry> {
        match self.visit_root(&mut TagBuilder::new())? {
            (name, Tag::Compound(value)) => {
                debug!(root = %name, entries = value.len(), "read document");
                Ok(RootEntry { name, value })
            }
            (_, other) => Err(Error::structure(format!(
                "root tag must be a compound, found {}",
                other.id()
            ))),
        }
    }

    /// Reads one unnamed tag.
    ///
    /// # Errors
    ///
    /// [`Error::Structure`] if the stream is empty or malformed, or the first
    /// error of the token stream itself.
    pub fn read_tag(&mut self) -> Result<Tag> {
        self.visit(&mut TagBuilder::new())
    }

    /// Drives `visitor` over a full document and returns the root name with the
    /// value of the root compound.
    ///
    /// # Errors
    ///
    /// The same as [`read_root`](Self::read_root), plus any error of the visitor.
    pub fn visit_root<V>(&mut self, visitor: &mut V) -> Result<(String, V::Output)>
    where
        V: TagVisitor,
    {
        let name = match self.tokens.next().transpose()? {
            None => return Err(Error::EmptyDocument),
            Some(Token::Name(name)) => name,
            Some(token) => {
                return Err(Error::structure(format!(
                    "expected the root name, found {token}"
                )))
            }
        };
        let token = self.expect_token()?;
        if token != Token::CompoundStart {
            return Err(Error::structure(format!(
                "root tag must be a compound, found {token}"
            )));
        }
        let value = self.walk(visitor, Key::Name(name.clone()), token)?;
        Ok((name, value))
    }

    /// Drives `visitor` over one unnamed tag.
    ///
    /// # Errors
    ///
    /// The same as [`read_tag`](Self::read_tag), plus any error of the visitor.
    pub fn visit<V>(&mut self, visitor: &mut V) -> Result<V::Output>
    where
        V: TagVisitor,
    {
        let token = self.expect_token()?;
        self.walk(visitor, Key::Index(0), token)
    }

    fn expect_token(&mut self) -> Result<Token> {
        self.tokens
            .next()
            .transpose()?
            .ok_or_else(|| Error::structure("token stream ended before the tag was complete"))
    }

    fn walk<V>(&mut self, outer: &mut V, key: Key, token: Token) -> Result<V::Output>
    where
        V: TagVisitor,
    {
        let mut stack: Vec<Frame<V>> = Vec::new();
        let mut step = Step::Open(key, token);
        loop {
            step = match step {
                Step::Open(key, token) => {
                    let factory = match stack.last_mut() {
                        Some(parent) => &mut parent.routine,
                        None => &mut *outer,
                    };
                    match token.opens() {
                        Some(kind) if kind.is_container() => {
                            let routine = factory.enter(&key, &token)?;
                            trace!(%key, %kind, depth = stack.len() + 1, "push frame");
                            stack.push(Frame {
                                key,
                                kind,
                                children: 0,
                                routine,
                            });
                            Step::Continue
                        }
                        Some(_) => {
                            let value = factory.leaf(&key, token)?;
                            Step::Done(key, value)
                        }
                        None => {
                            return Err(Error::structure(format!(
                                "expected a tag at {key}, found {token}"
                            )))
                        }
                    }
                }
                Step::Done(key, value) => match stack.last_mut() {
                    Some(parent) => {
                        parent.routine.accept_child(key, value)?;
                        parent.children += 1;
                        self.advance(&mut stack)?
                    }
                    None => return Ok(value),
                },
                Step::Continue => self.advance(&mut stack)?,
            };
        }
    }

    /// Feeds the next token to the frame on top of the stack.
    fn advance<V>(&mut self, stack: &mut Vec<Frame<V>>) -> Result<Step<V::Output>>
    where
        V: TagVisitor,
    {
        let token = self.expect_token()?;
        let Some(top) = stack.last_mut() else {
            return Err(Error::structure(format!("unexpected {token} after the tag")));
        };
        let kind = top.kind;

        if token.closes() == Some(kind) {
            let Some(frame) = stack.pop() else {
                return Err(Error::structure(format!("unexpected {token}")));
            };
            trace!(key = %frame.key, %kind, "pop frame");
            let value = frame.routine.finish()?;
            return Ok(Step::Done(frame.key, value));
        }

        match kind {
            TagId::Compound => match token {
                Token::Name(name) => {
                    let value = self.expect_token()?;
                    Ok(Step::Open(Key::Name(name), value))
                }
                other => Err(Error::structure(format!(
                    "expected a name or CompoundEnd, found {other}"
                ))),
            },
            TagId::List => Ok(Step::Open(Key::Index(top.children), token)),
            _ if token.content_of() == Some(kind) => {
                top.routine.content(token)?;
                Ok(Step::Continue)
            }
            _ => Err(Error::structure(format!(
                "unexpected {token} inside {kind}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compound, read_tokens, to_vec, CompoundTag, ListTag};

    /// Counts tags and checks list element kinds without building anything.
    struct Census {
        kind: TagId,
        element_id: Option<TagId>,
        tags: usize,
    }

    impl Census {
        fn new() -> Self {
            Census {
                kind: TagId::End,
                element_id: None,
                tags: 0,
            }
        }
    }

    impl TagVisitor for Census {
        type Output = (TagId, usize);

        fn enter(&mut self, _key: &Key, start: &Token) -> Result<Self> {
            let element_id = match start {
                Token::ListStart { element_id, .. } => *element_id,
                _ => None,
            };
            Ok(Census {
                kind: start.opens().unwrap_or(TagId::End),
                element_id,
                tags: 0,
            })
        }

        fn leaf(&mut self, _key: &Key, value: Token) -> Result<(TagId, usize)> {
            Ok((value.opens().unwrap_or(TagId::End), 1))
        }

        fn accept_child(&mut self, _key: Key, (id, tags): (TagId, usize)) -> Result<()> {
            if self.kind == TagId::List {
                match self.element_id {
                    Some(expected) if expected != id => {
                        return Err(Error::ElementMismatch {
                            expected,
                            found: id,
                        })
                    }
                    _ => self.element_id = Some(id),
                }
            }
            self.tags += tags;
            Ok(())
        }

        fn finish(self) -> Result<(TagId, usize)> {
            Ok((self.kind, self.tags + 1))
        }
    }

    fn read_tag(tokens: Vec<Token>) -> Result<Tag> {
        TreeReader::new(tokens.into_iter().map(Ok)).read_tag()
    }

    fn read_root(tokens: Vec<Token>) -> Result<RootEntry> {
        TreeReader::new(tokens.into_iter().map(Ok)).read_root()
    }

    #[test]
    fn test_compound_in_list() {
        let tag = read_tag(vec![
            Token::ListStart {
                size: Some(2),
                element_id: Some(TagId::Compound),
            },
            Token::CompoundStart,
            Token::Name("a".to_string()),
            Token::Int(1),
            Token::CompoundEnd,
            Token::CompoundStart,
            Token::CompoundEnd,
            Token::ListEnd,
        ])
        .unwrap();
        let list = tag.as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get(0).and_then(Tag::as_compound).and_then(|c| c.get("a")),
            Some(&Tag::Int(1))
        );
        assert!(list.get(1).and_then(Tag::as_compound).unwrap().is_empty());
    }

    #[test]
    fn test_array_content_is_joined() {
        let tag = read_tag(vec![
            Token::IntArrayStart { size: Some(3) },
            Token::IntArrayContent(vec![1, 2]),
            Token::IntArrayContent(vec![3]),
            Token::IntArrayEnd,
        ])
        .unwrap();
        assert_eq!(tag.as_int_array().unwrap().view(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_list_without_info_is_end_typed() {
        let tag = read_tag(vec![
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::ListEnd,
        ])
        .unwrap();
        assert_eq!(tag.as_list().unwrap().element_id(), TagId::End);
    }

    #[test]
    fn test_declared_size_is_checked() {
        let err = read_tag(vec![
            Token::ByteArrayStart { size: Some(2) },
            Token::ByteArrayContent(vec![1]),
            Token::ByteArrayEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_list_element_mismatch() {
        let err = read_tag(vec![
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::Int(1),
            Token::Long(2),
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ElementMismatch {
                expected: TagId::Int,
                found: TagId::Long
            }
        ));
    }

    #[test]
    fn test_later_duplicate_name_wins() {
        let root = read_root(vec![
            Token::Name(String::new()),
            Token::CompoundStart,
            Token::Name("a".to_string()),
            Token::Int(1),
            Token::Name("a".to_string()),
            Token::Int(2),
            Token::CompoundEnd,
        ])
        .unwrap();
        assert_eq!(root.value.len(), 1);
        assert_eq!(root.value.get("a"), Some(&Tag::Int(2)));
    }

    #[test]
    fn test_root_errors() {
        assert!(matches!(read_root(vec![]), Err(Error::EmptyDocument)));
        assert!(matches!(
            read_root(vec![Token::Name("x".to_string()), Token::Int(1)]),
            Err(Error::Structure(_))
        ));
        assert!(matches!(
            read_root(vec![Token::CompoundStart, Token::CompoundEnd]),
            Err(Error::Structure(_))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let err = read_root(vec![
            Token::Name("x".to_string()),
            Token::CompoundStart,
            Token::Name("a".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_misplaced_tokens() {
        // A name inside a list.
        assert!(read_tag(vec![
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::Name("a".to_string()),
            Token::Int(1),
            Token::ListEnd,
        ])
        .is_err());
        // A value without a name inside a compound.
        assert!(read_tag(vec![Token::CompoundStart, Token::Int(1), Token::CompoundEnd]).is_err());
        // The wrong end token.
        assert!(read_tag(vec![Token::CompoundStart, Token::ListEnd]).is_err());
    }

    #[test]
    fn test_stream_errors_pass_through() {
        let tokens = vec![Ok(Token::CompoundStart), Err(Error::decode(7, "boom"))];
        let err = TreeReader::new(tokens.into_iter()).read_tag().unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_custom_visitor_walks_decoded_bytes() {
        let entities = ListTag::new(
            TagId::Compound,
            vec![
                Tag::Compound(compound! { "hp" => 20i16 }.unwrap()),
                Tag::Compound(CompoundTag::new()),
            ],
        )
        .unwrap();
        let root = RootEntry::new(
            "level",
            compound! {
                "seed" => 42i64,
                "entities" => entities,
                "blocks" => ByteArrayTag::from(vec![1, 2, 3]),
            }
            .unwrap(),
        );
        let bytes = to_vec(&root).unwrap();

        let (name, (kind, tags)) = TreeReader::new(read_tokens(bytes.as_slice()))
            .visit_root(&mut Census::new())
            .unwrap();
        assert_eq!(name, "level");
        assert_eq!(kind, TagId::Compound);
        // root, seed, entities, two compounds, hp, blocks
        assert_eq!(tags, 7);
    }

    #[test]
    fn test_custom_visitor_sees_scalars_and_errors() {
        let mut reader = TreeReader::new(vec![Ok(Token::Int(5))].into_iter());
        assert_eq!(reader.visit(&mut Census::new()).unwrap(), (TagId::Int, 1));

        let err = TreeReader::new(
            vec![
                Token::ListStart {
                    size: None,
                    element_id: Some(TagId::String),
                },
                Token::Byte(1),
                Token::ListEnd,
            ]
            .into_iter()
            .map(Ok),
        )
        .visit(&mut Census::new())
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ElementMismatch {
                expected: TagId::String,
                found: TagId::Byte
            }
        ));
    }

    #[test]
    fn test_driver_rejects_content_outside_its_array() {
        let err = read_tag(vec![
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::IntArrayContent(vec![1]),
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));

        let err = read_tag(vec![
            Token::IntArrayStart { size: None },
            Token::ByteArrayContent(vec![1]),
            Token::IntArrayEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Name("a".to_string()).to_string(), "'a'");
        assert_eq!(Key::Index(3).to_string(), "[3]");
    }
}
