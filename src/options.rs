//! Configuration options for decoding.
//!
//! ## Examples
//!
//! ```rust
//! use nbt_stream::{ReadOptions, TokenReader};
//!
//! let bytes: &[u8] = &[10, 0, 0, 0];
//!
//! // Smaller content chunks and a tighter nesting limit
//! let options = ReadOptions::new().with_chunk_size(256).with_max_depth(64);
//! let tokens: Vec<_> = TokenReader::with_options(bytes, options)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(tokens.len(), 3);
//! ```

/// Default upper bound on array payload bytes carried by one content token.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default upper bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Configuration options for [`TokenReader`](crate::TokenReader).
///
/// # Examples
///
/// ```rust
/// use nbt_stream::ReadOptions;
///
/// let options = ReadOptions::new();
/// assert_eq!(options.chunk_size, 4096);
/// assert_eq!(options.max_depth, 512);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum number of array payload bytes per content token.
    pub chunk_size: usize,
    /// Maximum container nesting depth before decoding fails.
    pub max_depth: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReadOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum payload bytes per content token.
    ///
    /// A chunk always holds at least one element, so values smaller than the
    /// element width behave like the element width.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::ReadOptions;
    ///
    /// let options = ReadOptions::new().with_chunk_size(16);
    /// assert_eq!(options.elements_per_chunk(8), 2);
    /// assert_eq!(options.elements_per_chunk(32), 1);
    /// ```
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the maximum container nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of elements of `width` bytes that fit in one content token.
    #[must_use]
    pub fn elements_per_chunk(&self, width: usize) -> usize {
        (self.chunk_size / width.max(1)).max(1)
    }
}
