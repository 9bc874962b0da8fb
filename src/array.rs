//! Flat numeric array tags.
//!
//! Each array tag owns its elements exclusively. Reads come in two flavors:
//! [`value`](ByteArrayTag::value) hands out a fresh copy, and
//! [`view`](ByteArrayTag::view) lends a shared slice. Neither can write back into
//! the tag.
//!
//! ```rust
//! use nbt_stream::IntArrayTag;
//!
//! let tag = IntArrayTag::new(&[0xCAFE, 0xBABE]);
//! let mut copy = tag.value();
//! copy[0] = 0;
//! assert_eq!(tag.view(), &[0xCAFE, 0xBABE]);
//! ```

use crate::options::DEFAULT_CHUNK_SIZE;
use serde::{Serialize, Serializer};
use std::slice::Chunks;

macro_rules! array_tag {
    ($(#[$meta:meta])* $name:ident, $elem:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(Box<[$elem]>);

        impl $name {
            /// Creates a tag holding a copy of `values`.
            #[must_use]
            pub fn new(values: &[$elem]) -> Self {
                $name(values.into())
            }

            /// Returns a copy of the elements.
            #[must_use]
            pub fn value(&self) -> Vec<$elem> {
                self.0.to_vec()
            }

            /// Borrows the elements without copying.
            #[inline]
            #[must_use]
            pub fn view(&self) -> &[$elem] {
                &self.0
            }

            /// Returns the element at `index`, if any.
            #[inline]
            #[must_use]
            pub fn get(&self, index: usize) -> Option<$elem> {
                self.0.get(index).copied()
            }

            #[inline]
            #[must_use]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Splits the elements into content-token sized runs.
            pub(crate) fn chunks(&self) -> Chunks<'_, $elem> {
                let per_chunk = (DEFAULT_CHUNK_SIZE / std::mem::size_of::<$elem>()).max(1);
                self.0.chunks(per_chunk)
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(values: Vec<$elem>) -> Self {
                $name(values.into_boxed_slice())
            }
        }

        impl From<&[$elem]> for $name {
            fn from(values: &[$elem]) -> Self {
                $name::new(values)
            }
        }

        impl<const N: usize> From<[$elem; N]> for $name {
            fn from(values: [$elem; N]) -> Self {
                $name(Box::new(values))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_seq(self.0.iter())
            }
        }
    };
}

array_tag!(
    /// An array of signed bytes.
    ByteArrayTag,
    i8
);

array_tag!(
    /// An array of 32-bit integers.
    IntArrayTag,
    i32
);

array_tag!(
    /// An array of 64-bit integers.
    LongArrayTag,
    i64
);
