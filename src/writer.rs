//! Binary encoding: tokens in, bytes out.
//!
//! [`TokenWriter`] makes one linear pass over a token stream with constant extra
//! state: the name waiting for its value, and whether the leading name has been
//! seen. Every start token must already carry its size and element kind. Streams
//! that may lack them should go through
//! [`calculate_optional_info`](crate::calculate_optional_info) first, which
//! [`write_tokens`](crate::write_tokens) does automatically.
//!
//! ## Usage
//!
//! ```rust
//! use nbt_stream::{Token, TokenWriter};
//!
//! let mut writer = TokenWriter::new(Vec::new());
//! for token in [
//!     Token::Name(String::new()),
//!     Token::CompoundStart,
//!     Token::Name("a".to_string()),
//!     Token::Byte(1),
//!     Token::CompoundEnd,
//! ] {
//!     writer.write_token(&token).unwrap();
//! }
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes, vec![10, 0, 0, 1, 0, 1, b'a', 1, 0]);
//! ```

use crate::id::TagId;
use crate::mutf8;
use crate::token::Token;
use crate::{Error, Result};
use std::io::Write;
use tracing::trace;

/// Writes a fully specified token stream as NBT bytes.
pub struct TokenWriter<W> {
    output: W,
    /// Name waiting for the id of the value that follows it. When no name is
    /// pending, the next value is a list element and gets neither id nor name.
    pending_name: Option<String>,
    seen_first_name: bool,
}

impl<W: Write> TokenWriter<W> {
    /// Creates a writer over the given byte sink.
    pub fn new(output: W) -> Self {
        TokenWriter {
            output,
            pending_name: None,
            seen_first_name: false,
        }
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.output
    }

    /// Writes every token of `tokens`, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `tokens` or by writing.
    pub fn write_all<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        for token in tokens {
            self.write_token(&token?)?;
        }
        Ok(())
    }

    /// Writes a single token.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRootName`] if the first token is not a name; nothing is written
    /// - [`Error::MissingInfo`] if a start token lacks its size or element kind
    /// - [`Error::Encode`] for misplaced names and oversized strings or arrays
    /// - [`Error::Io`] if the sink fails
    pub fn write_token(&mut self, token: &Token) -> Result<()> {
        if !self.seen_first_name {
            if !matches!(token, Token::Name(_)) {
                return Err(Error::MissingRootName);
            }
            trace!("writing document");
            self.seen_first_name = true;
        }
        match token {
            Token::Name(name) => {
                if self.pending_name.is_some() {
                    return Err(Error::encode(format!(
                        "{token} follows another name without a value"
                    )));
                }
                self.pending_name = Some(name.clone());
            }
            Token::Byte(v) => {
                self.write_header(TagId::Byte)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::Short(v) => {
                self.write_header(TagId::Short)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::Int(v) => {
                self.write_header(TagId::Int)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::Long(v) => {
                self.write_header(TagId::Long)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::Float(v) => {
                self.write_header(TagId::Float)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::Double(v) => {
                self.write_header(TagId::Double)?;
                self.output.write_all(&v.to_be_bytes())?;
            }
            Token::String(v) => {
                self.write_header(TagId::String)?;
                self.write_string(v)?;
            }
            Token::ByteArrayStart { size }
            | Token::IntArrayStart { size }
            | Token::LongArrayStart { size } => {
                let size = size.ok_or_else(|| missing_info(token))?;
                let id = token.opens().unwrap_or(TagId::ByteArray);
                self.write_header(id)?;
                self.write_length(size)?;
            }
            Token::ListStart { size, element_id } => {
                let (Some(size), Some(element_id)) = (size, element_id) else {
                    return Err(missing_info(token));
                };
                self.write_header(TagId::List)?;
                self.output.write_all(&[element_id.id()])?;
                self.write_length(*size)?;
            }
            Token::CompoundStart => self.write_header(TagId::Compound)?,
            Token::ByteArrayContent(values) => {
                let raw: Vec<u8> = values.iter().map(|&b| b as u8).collect();
                self.output.write_all(&raw)?;
            }
            Token::IntArrayContent(values) => {
                let mut raw = Vec::with_capacity(values.len() * 4);
                for v in values {
                    raw.extend_from_slice(&v.to_be_bytes());
                }
                self.output.write_all(&raw)?;
            }
            Token::LongArrayContent(values) => {
                let mut raw = Vec::with_capacity(values.len() * 8);
                for v in values {
                    raw.extend_from_slice(&v.to_be_bytes());
                }
                self.output.write_all(&raw)?;
            }
            Token::CompoundEnd => {
                self.reject_pending_name(token)?;
                self.output.write_all(&[TagId::End.id()])?;
            }
            // Sizes were committed by the start token.
            Token::ByteArrayEnd | Token::IntArrayEnd | Token::LongArrayEnd | Token::ListEnd => {
                self.reject_pending_name(token)?;
            }
        }
        Ok(())
    }

    /// Flushes the sink and returns it.
    ///
    /// If no token was written at all, a lone END byte is written first: that is
    /// the encoding of an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is still waiting for its value, or if the sink fails.
    pub fn finish(mut self) -> Result<W> {
        if !self.seen_first_name {
            self.output.write_all(&[TagId::End.id()])?;
        }
        if let Some(name) = self.pending_name.take() {
            return Err(Error::encode(format!(
                "stream ended after Name({name:?}) without a value"
            )));
        }
        self.output.flush()?;
        Ok(self.output)
    }

    fn write_header(&mut self, id: TagId) -> Result<()> {
        if let Some(name) = self.pending_name.take() {
            self.output.write_all(&[id.id()])?;
            self.write_string(&name)?;
        }
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        let encoded = mutf8::encode(s);
        let len = u16::try_from(encoded.len()).map_err(|_| {
            Error::encode(format!(
                "string of {} bytes exceeds the {} byte limit",
                encoded.len(),
                u16::MAX
            ))
        })?;
        self.output.write_all(&len.to_be_bytes())?;
        self.output.write_all(&encoded)?;
        Ok(())
    }

    fn write_length(&mut self, size: usize) -> Result<()> {
        let size = i32::try_from(size)
            .map_err(|_| Error::encode(format!("length {size} does not fit in an i32")))?;
        self.output.write_all(&size.to_be_bytes())?;
        Ok(())
    }

    fn reject_pending_name(&self, token: &Token) -> Result<()> {
        match &self.pending_name {
            Some(name) => Err(Error::encode(format!(
                "Name({name:?}) cannot be followed by {token}"
            ))),
            None => Ok(()),
        }
    }
}

fn missing_info(token: &Token) -> Error {
    Error::MissingInfo {
        token: token.to_string(),
    }
}
