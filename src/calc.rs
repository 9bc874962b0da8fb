//! Filling in sizes and list element kinds that a token producer left out.
//!
//! The wire format puts every array and list length, and every list element kind,
//! in front of the content. A producer that builds a stream incrementally may not
//! know them up front, so start tokens are allowed to leave them empty.
//! [`OptionalInfoCalculator`] wraps such a stream and repairs it lazily.
//!
//! ## Cost
//!
//! Tokens that already carry their info pass straight through, one at a time,
//! with no buffering. When an incomplete start token arrives, every token of its
//! subtree up to the matching end is held in memory, because the corrected start
//! token can only be emitted after the content has been counted. Incomplete
//! subtrees nested inside are resolved innermost first as each one closes. This
//! window is the only place where memory grows with input size.
//!
//! ## Rules
//!
//! - Array size: total element count of the array's content tokens
//! - List size: number of completed direct children
//! - List element kind: the declared kind if present, otherwise the kind of the
//!   first child, otherwise END for an empty list
//! - A child whose kind differs from the list's element kind is an error
//!
//! ```rust
//! use nbt_stream::{calculate_optional_info, TagId, Token};
//!
//! let tokens = vec![
//!     Token::Name(String::new()),
//!     Token::ListStart { size: None, element_id: None },
//!     Token::Int(1),
//!     Token::Int(2),
//!     Token::ListEnd,
//! ];
//! let fixed: Vec<Token> = calculate_optional_info(tokens.into_iter().map(Ok))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(fixed[1], Token::ListStart { size: Some(2), element_id: Some(TagId::Int) });
//! ```

use crate::id::TagId;
use crate::token::Token;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::debug;

/// One open container inside the buffering window.
struct Pending {
    start: Token,
    tokens: Vec<Token>,
    /// Completed children for lists, element count for arrays.
    count: usize,
    /// Element kind of a list: declared, or fixed by its first child.
    element_id: Option<TagId>,
}

impl Pending {
    fn new(start: Token) -> Self {
        let element_id = match &start {
            Token::ListStart { element_id, .. } => *element_id,
            _ => None,
        };
        Pending {
            start,
            tokens: Vec::new(),
            count: 0,
            element_id,
        }
    }

    fn kind(&self) -> Option<TagId> {
        self.start.opens()
    }

    fn child_completed(&mut self, child: TagId) -> Result<()> {
        if self.kind() != Some(TagId::List) {
            return Ok(());
        }
        match self.element_id {
            Some(expected) if expected != child => {
                return Err(Error::ElementMismatch {
                    expected,
                    found: child,
                })
            }
            Some(_) => {}
            None => self.element_id = Some(child),
        }
        self.count += 1;
        Ok(())
    }

    /// Consumes the frame into its full token run, with the start token repaired.
    ///
    /// A size the producer declared is kept and must match what arrived.
    fn into_run(self, end: Token) -> Result<Vec<Token>> {
        let start = if self.start.is_missing_info() {
            if let (Some(kind), Some(declared)) = (self.kind(), self.start.size()) {
                if declared != self.count {
                    return Err(Error::structure(format!(
                        "{kind} declared {declared} elements but held {}",
                        self.count
                    )));
                }
            }
            let element_id = self.element_id.unwrap_or(TagId::End);
            self.start.with_info(self.count, element_id)
        } else {
            self.start
        };
        let mut run = Vec::with_capacity(self.tokens.len() + 2);
        run.push(start);
        run.extend(self.tokens);
        run.push(end);
        Ok(run)
    }
}

/// A token stream adapter that resolves missing sizes and element kinds.
///
/// Applying it to its own output changes nothing.
pub struct OptionalInfoCalculator<I> {
    inner: I,
    ready: VecDeque<Token>,
    failed: bool,
}

impl<I> OptionalInfoCalculator<I>
where
    I: Iterator<Item = Result<Token>>,
{
    /// Wraps a token stream.
    pub fn new(inner: I) -> Self {
        OptionalInfoCalculator {
            inner,
            ready: VecDeque::new(),
            failed: false,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(token) = self.ready.pop_front() {
            return Ok(Some(token));
        }
        let Some(token) = self.inner.next().transpose()? else {
            return Ok(None);
        };
        if !token.is_missing_info() {
            return Ok(Some(token));
        }
        self.buffer_subtree(token)?;
        Ok(self.ready.pop_front())
    }

    /// Buffers from `start` through its matching end, then queues the repaired run.
    fn buffer_subtree(&mut self, start: Token) -> Result<()> {
        debug!(%start, "buffering subtree with missing info");
        let mut stack = vec![Pending::new(start)];
        loop {
            let Some(token) = self.inner.next().transpose()? else {
                return Err(Error::structure(
                    "token stream ended inside an unfinished container",
                ));
            };
            let Some(top) = stack.last_mut() else {
                break;
            };
            if token.is_start() {
                stack.push(Pending::new(token));
            } else if let Some(closed) = token.closes() {
                if top.kind() != Some(closed) {
                    return Err(Error::structure(format!(
                        "{token} does not close {}",
                        top.start
                    )));
                }
                let Some(frame) = stack.pop() else {
                    break;
                };
                let run = frame.into_run(token)?;
                match stack.last_mut() {
                    Some(parent) => {
                        parent.tokens.extend(run);
                        parent.child_completed(closed)?;
                    }
                    None => {
                        debug!(tokens = run.len(), "resolved buffered subtree");
                        self.ready.extend(run);
                        break;
                    }
                }
            } else if let Some(array) = token.content_of() {
                if top.kind() != Some(array) {
                    return Err(Error::structure(format!(
                        "{token} inside {}",
                        top.start
                    )));
                }
                top.count += token.content_len();
                top.tokens.push(token);
            } else if let Some(value) = token.opens() {
                top.tokens.push(token);
                top.child_completed(value)?;
            } else {
                top.tokens.push(token);
            }
        }
        Ok(())
    }
}

impl<I> Iterator for OptionalInfoCalculator<I>
where
    I: Iterator<Item = Result<Token>>,
{
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

impl<I> FusedIterator for OptionalInfoCalculator<I> where I: Iterator<Item = Result<Token>> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculate(tokens: Vec<Token>) -> Result<Vec<Token>> {
        OptionalInfoCalculator::new(tokens.into_iter().map(Ok)).collect()
    }

    fn complete_document() -> Vec<Token> {
        vec![
            Token::Name("root".to_string()),
            Token::CompoundStart,
            Token::Name("a".to_string()),
            Token::IntArrayStart { size: Some(2) },
            Token::IntArrayContent(vec![1, 2]),
            Token::IntArrayEnd,
            Token::Name("l".to_string()),
            Token::ListStart {
                size: Some(1),
                element_id: Some(TagId::String),
            },
            Token::String("x".to_string()),
            Token::ListEnd,
            Token::CompoundEnd,
        ]
    }

    #[test]
    fn test_complete_stream_passes_through() {
        let tokens = complete_document();
        assert_eq!(calculate(tokens.clone()).unwrap(), tokens);
    }

    #[test]
    fn test_complete_stream_is_not_buffered() {
        let mut calculator =
            OptionalInfoCalculator::new(complete_document().into_iter().map(Ok));
        while let Some(token) = calculator.next() {
            token.unwrap();
            assert!(calculator.ready.is_empty());
        }
    }

    #[test]
    fn test_array_size_from_content() {
        let tokens = calculate(vec![
            Token::Name("a".to_string()),
            Token::ByteArrayStart { size: None },
            Token::ByteArrayContent(vec![1, 2, 3]),
            Token::ByteArrayContent(vec![4]),
            Token::ByteArrayEnd,
        ])
        .unwrap();
        assert_eq!(tokens[1], Token::ByteArrayStart { size: Some(4) });
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_empty_list_becomes_end_typed() {
        let tokens = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::ListEnd,
        ])
        .unwrap();
        assert_eq!(
            tokens[1],
            Token::ListStart {
                size: Some(0),
                element_id: Some(TagId::End)
            }
        );
    }

    #[test]
    fn test_nested_incomplete_resolved_innermost_first() {
        let tokens = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::Long(1),
            Token::ListEnd,
            Token::CompoundStart,
            Token::CompoundEnd,
            Token::ListEnd,
        ]);
        let err = tokens.unwrap_err();
        assert!(matches!(
            err,
            Error::ElementMismatch {
                expected: TagId::List,
                found: TagId::Compound
            }
        ));

        let tokens = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::Long(1),
            Token::Long(2),
            Token::ListEnd,
            Token::ListStart {
                size: Some(0),
                element_id: Some(TagId::End),
            },
            Token::ListEnd,
            Token::ListEnd,
        ])
        .unwrap();
        assert_eq!(
            tokens[1],
            Token::ListStart {
                size: Some(2),
                element_id: Some(TagId::List)
            }
        );
        assert_eq!(
            tokens[2],
            Token::ListStart {
                size: Some(2),
                element_id: Some(TagId::Long)
            }
        );
    }

    #[test]
    fn test_compound_children_are_counted_once() {
        let tokens = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::CompoundStart,
            Token::Name("x".to_string()),
            Token::Int(1),
            Token::Name("y".to_string()),
            Token::Int(2),
            Token::CompoundEnd,
            Token::ListEnd,
        ])
        .unwrap();
        assert_eq!(
            tokens[1],
            Token::ListStart {
                size: Some(1),
                element_id: Some(TagId::Compound)
            }
        );
    }

    #[test]
    fn test_declared_kind_is_kept_and_checked() {
        let err = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: Some(TagId::Int),
            },
            Token::Short(1),
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::ElementMismatch { .. }));
    }

    #[test]
    fn test_declared_size_is_kept_and_checked() {
        let err = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: Some(3),
                element_id: None,
            },
            Token::Int(1),
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(
            matches!(&err, Error::Structure(msg) if msg == "LIST declared 3 elements but held 1"),
            "{err}"
        );

        let tokens = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: Some(2),
                element_id: None,
            },
            Token::Int(1),
            Token::Int(2),
            Token::ListEnd,
        ])
        .unwrap();
        assert_eq!(
            tokens[1],
            Token::ListStart {
                size: Some(2),
                element_id: Some(TagId::Int)
            }
        );
    }

    #[test]
    fn test_content_only_inside_matching_array() {
        let err = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::IntArrayContent(vec![1, 2]),
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));

        let err = calculate(vec![
            Token::Name("l".to_string()),
            Token::ListStart {
                size: None,
                element_id: None,
            },
            Token::CompoundStart,
            Token::ByteArrayContent(vec![1]),
            Token::CompoundEnd,
            Token::ListEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));

        let err = calculate(vec![
            Token::Name("a".to_string()),
            Token::IntArrayStart { size: None },
            Token::LongArrayContent(vec![1]),
            Token::IntArrayEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_idempotent() {
        let once = calculate(vec![
            Token::Name(String::new()),
            Token::CompoundStart,
            Token::Name("a".to_string()),
            Token::LongArrayStart { size: None },
            Token::LongArrayContent(vec![1, 2, 3]),
            Token::LongArrayEnd,
            Token::CompoundEnd,
        ])
        .unwrap();
        let twice = calculate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unterminated_window() {
        let err = calculate(vec![
            Token::Name("a".to_string()),
            Token::IntArrayStart { size: None },
            Token::IntArrayContent(vec![1]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_mismatched_end() {
        let err = calculate(vec![
            Token::Name("a".to_string()),
            Token::IntArrayStart { size: None },
            Token::LongArrayEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }
}
