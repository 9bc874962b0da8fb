//! Homogeneous list tags.
//!
//! Every element of a [`ListTag`] has the list's declared element kind. An empty
//! list may declare any kind, END included; a non-empty list never declares END.
//!
//! ```rust
//! use nbt_stream::{ListTag, Tag, TagId};
//!
//! let mut builder = ListTag::builder(TagId::Int);
//! builder.add(Tag::Int(1))?.add(Tag::Int(2))?;
//!
//! // A rejected add leaves the builder usable.
//! assert!(builder.add(Tag::from("three")).is_err());
//! builder.add(Tag::Int(3))?;
//!
//! let list = builder.build()?;
//! assert_eq!(list.len(), 3);
//! # Ok::<(), nbt_stream::Error>(())
//! ```

use crate::id::TagId;
use crate::tag::Tag;
use crate::{Error, Result};
use serde::{Serialize, Serializer};

/// An ordered list of tags sharing one element kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ListTag {
    element_id: TagId,
    elements: Vec<Tag>,
}

impl ListTag {
    /// Creates a list, checking every element against `element_id`.
    ///
    /// # Errors
    ///
    /// [`Error::ElementMismatch`] for a foreign element, [`Error::EndTypedList`]
    /// for a non-empty END list.
    pub fn new(element_id: TagId, elements: Vec<Tag>) -> Result<Self> {
        let mut builder = ListBuilder::new(element_id);
        builder.add_all(elements)?;
        builder.build()
    }

    /// An empty list of the given element kind.
    #[must_use]
    pub fn empty(element_id: TagId) -> Self {
        ListTag {
            element_id,
            elements: Vec::new(),
        }
    }

    /// Starts building a list of the given element kind.
    #[must_use]
    pub fn builder(element_id: TagId) -> ListBuilder {
        ListBuilder::new(element_id)
    }

    /// Starts a builder holding a copy of this list's elements.
    #[must_use]
    pub fn to_builder(&self) -> ListBuilder {
        ListBuilder {
            element_id: self.element_id,
            elements: self.elements.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn element_id(&self) -> TagId {
        self.element_id
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[Tag] {
        &self.elements
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.elements.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.elements.iter()
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl IntoIterator for ListTag {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl Serialize for ListTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.elements)
    }
}

/// Accumulates list elements, checking each one as it is added.
#[derive(Clone, Debug)]
pub struct ListBuilder {
    element_id: TagId,
    elements: Vec<Tag>,
}

impl ListBuilder {
    /// Creates an empty builder for the given element kind.
    #[must_use]
    pub fn new(element_id: TagId) -> Self {
        ListBuilder {
            element_id,
            elements: Vec::new(),
        }
    }

    /// Appends an element.
    ///
    /// # Errors
    ///
    /// [`Error::ElementMismatch`] if the tag's kind differs from the element kind.
    /// The builder is unchanged in that case.
    pub fn add(&mut self, tag: Tag) -> Result<&mut Self> {
        if tag.id() != self.element_id {
            return Err(Error::ElementMismatch {
                expected: self.element_id,
                found: tag.id(),
            });
        }
        self.elements.push(tag);
        Ok(self)
    }

    /// Appends every tag of `tags`, stopping at the first rejected one.
    ///
    /// # Errors
    ///
    /// The first error from [`ListBuilder::add`].
    pub fn add_all<I>(&mut self, tags: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Tag>,
    {
        for tag in tags {
            self.add(tag)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn element_id(&self) -> TagId {
        self.element_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Finishes the list.
    ///
    /// # Errors
    ///
    /// [`Error::EndTypedList`] if the list is non-empty and declares END.
    pub fn build(self) -> Result<ListTag> {
        if self.element_id == TagId::End && !self.elements.is_empty() {
            return Err(Error::EndTypedList);
        }
        Ok(ListTag {
            element_id: self.element_id,
            elements: self.elements,
        })
    }
}
