//! # nbt_stream
//!
//! A streaming codec for NBT, the binary tag-tree format.
//!
//! ## What is NBT?
//!
//! NBT is a compact, big-endian binary format for trees of typed values. A
//! document is one named compound. Compounds hold named children, lists hold
//! anonymous children of a single kind, and three flat array kinds hold runs of
//! bytes, ints, and longs.
//!
//! ## Three representations
//!
//! This crate moves data between three forms of the same tree:
//!
//! - **bytes**: the wire format, read by [`TokenReader`] and written by [`TokenWriter`]
//! - **tokens**: a lazy stream of [`Token`] events, one per step of a depth-first walk
//! - **tags**: the immutable in-memory tree of [`Tag`] values
//!
//! ```text
//! bytes -> TokenReader -> tokens -> [OptionalInfoCalculator] -> TreeReader -> tags
//! tags  -> Tag::tokens -> tokens -> [OptionalInfoCalculator] -> TokenWriter -> bytes
//! ```
//!
//! Every stage is a pull-based iterator, so a document can be inspected or
//! rewritten token by token without ever holding the whole tree in memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use nbt_stream::{compound, from_slice, to_vec, IntArrayTag, RootEntry, TagId};
//!
//! let root = RootEntry::new(
//!     "",
//!     compound! {
//!         "Hello" => "World!",
//!         "Goodbye" => IntArrayTag::from([0xCAFE, 0xBABE]),
//!     }?,
//! );
//!
//! let bytes = to_vec(&root)?;
//! let back = from_slice(&bytes)?;
//! assert_eq!(back, root);
//! assert!(back.value.get_tag("Goodbye", TagId::IntArray).is_ok());
//! # Ok::<(), nbt_stream::Error>(())
//! ```
//!
//! ### Working with tokens
//!
//! ```rust
//! use nbt_stream::{read_tokens, write_tokens, Token};
//!
//! // {"": {"a": 1i8}}
//! let bytes: &[u8] = &[10, 0, 0, 1, 0, 1, b'a', 1, 0];
//!
//! // Rename every entry called "a" to "b" without building a tree.
//! let renamed = read_tokens(bytes).map(|token| {
//!     token.map(|token| match token {
//!         Token::Name(name) if name == "a" => Token::Name("b".to_string()),
//!         other => other,
//!     })
//! });
//! let mut out = Vec::new();
//! write_tokens(&mut out, renamed)?;
//! assert_eq!(out, vec![10, 0, 0, 1, 0, 1, b'b', 1, 0]);
//! # Ok::<(), nbt_stream::Error>(())
//! ```
//!
//! ## Incomplete streams
//!
//! A token producer does not need to know array sizes, list sizes, or list
//! element kinds up front. Start tokens may leave them as `None`;
//! [`OptionalInfoCalculator`] fills them in by buffering only the affected
//! subtrees. [`write_tokens`] applies it automatically.
//!
//! ## Custom visitors
//!
//! [`TreeReader`] drives any [`TagVisitor`], one routine per open container.
//! [`TagBuilder`] builds [`Tag`]s, and a visitor of your own can validate a
//! stream or pull out a single entry without materializing the rest.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Decoding memory grows with nesting depth, which is capped by
//!   [`ReadOptions::max_depth`], and never with declared lengths
//! - Proper error propagation with `Result` types

pub mod array;
pub mod calc;
pub mod compound;
pub mod error;
pub mod id;
pub mod list;
pub mod macros;
pub mod mutf8;
pub mod options;
pub mod reader;
pub mod tag;
pub mod token;
pub mod tree;
pub mod writer;

pub use array::{ByteArrayTag, IntArrayTag, LongArrayTag};
pub use calc::OptionalInfoCalculator;
pub use compound::{CompoundBuilder, CompoundTag};
pub use error::{Error, Result};
pub use id::{TagId, TagShape};
pub use list::{ListBuilder, ListTag};
pub use options::ReadOptions;
pub use reader::TokenReader;
pub use tag::{RootEntry, Tag, TagTokens};
pub use token::Token;
pub use tree::{Key, TagBuilder, TagVisitor, TreeReader};
pub use writer::TokenWriter;

use std::io;

/// Streams the tokens of one document from a byte source.
///
/// # Examples
///
/// ```rust
/// use nbt_stream::{read_tokens, Token};
///
/// let first = read_tokens(&[10u8, 0, 1, b'r', 0][..]).next();
/// assert!(matches!(first, Some(Ok(Token::Name(name))) if name == "r"));
/// ```
pub fn read_tokens<R>(reader: R) -> TokenReader<R>
where
    R: io::Read,
{
    TokenReader::new(reader)
}

/// Streams the tokens of one document with custom decoder options.
pub fn read_tokens_with_options<R>(reader: R, options: ReadOptions) -> TokenReader<R>
where
    R: io::Read,
{
    TokenReader::with_options(reader, options)
}

/// Wraps a token stream so that missing sizes and list element kinds are filled in.
///
/// Fully specified streams pass through unchanged and without buffering.
pub fn calculate_optional_info<I>(tokens: I) -> OptionalInfoCalculator<I::IntoIter>
where
    I: IntoIterator<Item = Result<Token>>,
{
    OptionalInfoCalculator::new(tokens.into_iter())
}

/// Writes a token stream as one document, filling in missing optional info first.
///
/// An empty stream writes the lone END byte of an empty document.
///
/// # Errors
///
/// Returns the first error of `tokens`, of the optional info calculation, or of
/// the [`TokenWriter`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn write_tokens<W, I>(writer: W, tokens: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = Result<Token>>,
{
    let mut token_writer = TokenWriter::new(writer);
    token_writer.write_all(calculate_optional_info(tokens))?;
    token_writer.finish()?;
    Ok(())
}

/// Decodes one document from a byte source into a tree.
///
/// # Errors
///
/// - [`Error::EmptyDocument`] if the input is a lone END byte
/// - any decode, I/O, or structure error met on the way
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(reader: R) -> Result<RootEntry>
where
    R: io::Read,
{
    RootEntry::read_from(read_tokens(reader))
}

/// Decodes one document from a byte slice into a tree.
///
/// # Examples
///
/// ```rust
/// use nbt_stream::{from_slice, Tag};
///
/// // {"root": {"n": 300s}}
/// let root = from_slice(&[10, 0, 4, b'r', b'o', b'o', b't', 2, 0, 1, b'n', 1, 44, 0]).unwrap();
/// assert_eq!(root.name, "root");
/// assert_eq!(root.value.get("n"), Some(&Tag::Short(300)));
/// ```
///
/// # Errors
///
/// See [`from_reader`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(bytes: &[u8]) -> Result<RootEntry> {
    from_reader(bytes)
}

/// Encodes a document into a byte sink.
///
/// # Errors
///
/// Returns an error if a value cannot be encoded or the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(writer: W, root: &RootEntry) -> Result<()>
where
    W: io::Write,
{
    write_tokens(writer, root.tokens().map(Ok))
}

/// Encodes a document into a new byte vector.
///
/// # Errors
///
/// Returns an error if a value cannot be encoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec(root: &RootEntry) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    to_writer(&mut bytes, root)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound;

    fn sample() -> RootEntry {
        let list = ListTag::new(TagId::Int, vec![Tag::Int(1), Tag::Int(2), Tag::Int(3)]).unwrap();
        RootEntry::new(
            "sample",
            compound! {
                "byte" => 1i8,
                "short" => -2i16,
                "long" => i64::MAX,
                "float" => 0.5f32,
                "double" => -0.25f64,
                "string" => "héllo\0",
                "bytes" => ByteArrayTag::from(vec![-1, 0, 1]),
                "longs" => LongArrayTag::from([i64::MIN]),
                "list" => list,
                "nested" => compound! { "empty" => ListTag::empty(TagId::End) }.unwrap(),
            }
            .unwrap(),
        )
    }

    #[test]
    fn test_round_trip() {
        let root = sample();
        let bytes = to_vec(&root).unwrap();
        assert_eq!(from_slice(&bytes).unwrap(), root);
    }

    #[test]
    fn test_bytes_to_tokens_to_bytes() {
        let bytes = to_vec(&sample()).unwrap();
        let mut out = Vec::new();
        write_tokens(&mut out, read_tokens(bytes.as_slice())).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_empty_document() {
        let mut out = Vec::new();
        write_tokens(&mut out, Vec::<Result<Token>>::new()).unwrap();
        assert_eq!(out, vec![0]);
        assert!(matches!(from_slice(&out), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_write_tokens_fills_in_missing_info() {
        let tokens = vec![
            Token::Name("r".to_string()),
            Token::CompoundStart,
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::Byte(7),
            Token::ListEnd,
            Token::CompoundEnd,
        ];
        let mut out = Vec::new();
        write_tokens(&mut out, tokens.into_iter().map(Ok)).unwrap();
        assert_eq!(
            out,
            vec![10, 0, 1, b'r', 9, 0, 1, b'l', 1, 0, 0, 0, 1, 7, 0]
        );
    }

    #[test]
    fn test_small_chunks_read_the_same_tree() {
        let bytes = to_vec(&sample()).unwrap();
        let options = ReadOptions::new().with_chunk_size(1);
        let root = RootEntry::read_from(read_tokens_with_options(bytes.as_slice(), options)).unwrap();
        assert_eq!(root, sample());
    }
}
