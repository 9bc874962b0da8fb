//! Binary decoding: bytes in, tokens out.
//!
//! [`TokenReader`] is a lazy, single-pass iterator over the tokens of one document.
//! Pulling a token reads exactly the bytes that token needs and nothing more.
//! Nesting is tracked with an explicit frame stack instead of recursion, so
//! suspension between tokens costs nothing and auxiliary memory grows with nesting
//! depth only, never with document size.
//!
//! ## Usage
//!
//! ```rust
//! use nbt_stream::{TokenReader, Token};
//!
//! // {"": {"a": 1i8}}
//! let bytes: &[u8] = &[10, 0, 0, 1, 0, 1, b'a', 1, 0];
//! let tokens: Vec<Token> = TokenReader::new(bytes).collect::<Result<_, _>>().unwrap();
//! assert_eq!(tokens, vec![
//!     Token::Name(String::new()),
//!     Token::CompoundStart,
//!     Token::Name("a".to_string()),
//!     Token::Byte(1),
//!     Token::CompoundEnd,
//! ]);
//! ```
//!
//! The reader never closes or drains its input. Once the root value is complete
//! it stops, leaving any trailing bytes unread.

use crate::id::{TagId, TagShape};
use crate::mutf8;
use crate::options::ReadOptions;
use crate::token::Token;
use crate::{Error, Result};
use std::io::Read;
use std::iter::FusedIterator;
use tracing::trace;

#[derive(Clone, Copy, Debug)]
enum Frame {
    /// Waiting for the id and name of the root entry.
    Root,
    /// Inside a compound: named entries until END.
    Compound,
    /// Inside a list: `remaining` anonymous elements of `element_id`.
    List { remaining: usize, element_id: TagId },
    /// Inside an array: `remaining` elements still to be chunked out.
    Array { id: TagId, remaining: usize },
}

/// Streams the tokens of one NBT document from a byte source.
pub struct TokenReader<R> {
    input: R,
    offset: u64,
    options: ReadOptions,
    stack: Vec<Frame>,
    /// Id of an entry whose name was just emitted; its value comes next.
    pending: Option<TagId>,
    failed: bool,
}

impl<R: Read> TokenReader<R> {
    /// Creates a reader with default options.
    pub fn new(input: R) -> Self {
        Self::with_options(input, ReadOptions::default())
    }

    /// Creates a reader with custom options.
    pub fn with_options(input: R, options: ReadOptions) -> Self {
        TokenReader {
            input,
            offset: 0,
            options,
            stack: vec![Frame::Root],
            pending: None,
            failed: false,
        }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the underlying byte source.
    pub fn into_inner(self) -> R {
        self.input
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(id) = self.pending.take() {
            return self.open(id).map(Some);
        }
        let Some(frame) = self.stack.last().copied() else {
            return Ok(None);
        };
        match frame {
            Frame::Root | Frame::Compound => {
                let id = self.read_id()?;
                if id == TagId::End {
                    self.pop();
                    return Ok(match frame {
                        Frame::Root => None,
                        _ => Some(Token::CompoundEnd),
                    });
                }
                let name = self.read_string()?;
                if let Frame::Root = frame {
                    self.pop();
                }
                self.pending = Some(id);
                Ok(Some(Token::Name(name)))
            }
            Frame::List {
                remaining,
                element_id,
            } => {
                if remaining == 0 {
                    self.pop();
                    return Ok(Some(Token::ListEnd));
                }
                if let Some(Frame::List { remaining, .. }) = self.stack.last_mut() {
                    *remaining -= 1;
                }
                self.open(element_id).map(Some)
            }
            Frame::Array { id, remaining } => {
                if remaining == 0 {
                    self.pop();
                    return Ok(Some(match id {
                        TagId::ByteArray => Token::ByteArrayEnd,
                        TagId::IntArray => Token::IntArrayEnd,
                        _ => Token::LongArrayEnd,
                    }));
                }
                self.read_chunk(id, remaining).map(Some)
            }
        }
    }

    /// Reads the payload or prefix of a tag whose id is already known.
    fn open(&mut self, id: TagId) -> Result<Token> {
        Ok(match id {
            TagId::End => {
                return Err(Error::decode(self.offset, "END tag has no value"));
            }
            TagId::Byte => Token::Byte(i8::from_be_bytes(self.read_bytes()?)),
            TagId::Short => Token::Short(i16::from_be_bytes(self.read_bytes()?)),
            TagId::Int => Token::Int(i32::from_be_bytes(self.read_bytes()?)),
            TagId::Long => Token::Long(i64::from_be_bytes(self.read_bytes()?)),
            TagId::Float => Token::Float(f32::from_be_bytes(self.read_bytes()?)),
            TagId::Double => Token::Double(f64::from_be_bytes(self.read_bytes()?)),
            TagId::String => Token::String(self.read_string()?),
            TagId::ByteArray | TagId::IntArray | TagId::LongArray => {
                let size = self.read_length()?;
                self.push(Frame::Array {
                    id,
                    remaining: size,
                })?;
                let size = Some(size);
                match id {
                    TagId::ByteArray => Token::ByteArrayStart { size },
                    TagId::IntArray => Token::IntArrayStart { size },
                    _ => Token::LongArrayStart { size },
                }
            }
            TagId::List => {
                let element_id = self.read_id()?;
                let offset = self.offset;
                let size = self.read_length()?;
                if element_id == TagId::End && size > 0 {
                    return Err(Error::decode(
                        offset,
                        "a non-empty list cannot be of type END",
                    ));
                }
                self.push(Frame::List {
                    remaining: size,
                    element_id,
                })?;
                Token::ListStart {
                    size: Some(size),
                    element_id: Some(element_id),
                }
            }
            TagId::Compound => {
                self.push(Frame::Compound)?;
                Token::CompoundStart
            }
        })
    }

    fn read_chunk(&mut self, id: TagId, remaining: usize) -> Result<Token> {
        let width = match id.shape() {
            TagShape::Array(width) => width,
            _ => 1,
        };
        let count = remaining.min(self.options.elements_per_chunk(width));
        let mut raw = vec![0u8; count * width];
        self.fill(&mut raw)?;
        if let Some(Frame::Array { remaining, .. }) = self.stack.last_mut() {
            *remaining -= count;
        }
        Ok(match id {
            TagId::ByteArray => {
                Token::ByteArrayContent(raw.into_iter().map(|b| b as i8).collect())
            }
            TagId::IntArray => Token::IntArrayContent(
                raw.chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            _ => Token::LongArrayContent(
                raw.chunks_exact(8)
                    .map(|c| i64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
        })
    }

    fn push(&mut self, frame: Frame) -> Result<()> {
        let depth = self.stack.len() + 1;
        if depth > self.options.max_depth {
            return Err(Error::TooDeep {
                depth,
                offset: self.offset,
            });
        }
        trace!(depth, ?frame, "push frame");
        self.stack.push(frame);
        Ok(())
    }

    fn pop(&mut self) {
        let frame = self.stack.pop();
        trace!(depth = self.stack.len(), ?frame, "pop frame");
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.input.read_exact(buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn read_id(&mut self) -> Result<TagId> {
        let offset = self.offset;
        let [id] = self.read_bytes::<1>()?;
        TagId::from_id(id).ok_or(Error::UnknownTagId { id, offset })
    }

    fn read_length(&mut self) -> Result<usize> {
        let offset = self.offset;
        let length = i32::from_be_bytes(self.read_bytes()?);
        usize::try_from(length).map_err(|_| Error::NegativeLength { length, offset })
    }

    fn read_string(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.read_bytes()?);
        let start = self.offset;
        let mut raw = vec![0u8; usize::from(len)];
        self.fill(&mut raw)?;
        mutf8::decode(&raw).map_err(|(at, reason)| Error::InvalidString {
            offset: start + at as u64,
            reason: reason.to_string(),
        })
    }
}

impl<R: Read> Iterator for TokenReader<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read> FusedIterator for TokenReader<R> {}
