//! Named, insertion-ordered compound tags.
//!
//! [`CompoundTag`] wraps an [`IndexMap`] so iteration follows insertion order,
//! which also fixes the order entries are written in. Names are unique and END
//! is never a valid value.
//!
//! ## Builders
//!
//! [`CompoundBuilder`] comes in two modes:
//!
//! - **strict** ([`CompoundTag::builder`]): putting a name twice is an error
//! - **loose** ([`CompoundBuilder::loose`], [`CompoundTag::to_builder`]): a later
//!   put replaces the earlier value and keeps its original position
//!
//! ```rust
//! use nbt_stream::{CompoundTag, Tag};
//!
//! let mut builder = CompoundTag::builder();
//! builder.put("first", 1)?.put("second", "two")?;
//! assert!(builder.put("first", 3).is_err());
//!
//! let tag = builder.build();
//! let keys: Vec<_> = tag.keys().cloned().collect();
//! assert_eq!(keys, vec!["first", "second"]);
//! # Ok::<(), nbt_stream::Error>(())
//! ```

use crate::id::TagId;
use crate::tag::{Tag, TagTokens};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A map of unique names to tags that remembers insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompoundTag(IndexMap<String, Tag>);

impl CompoundTag {
    /// Creates an empty compound.
    #[must_use]
    pub fn new() -> Self {
        CompoundTag(IndexMap::new())
    }

    /// Wraps an existing map, rejecting END values.
    ///
    /// # Errors
    ///
    /// [`Error::EndInCompound`] if any value is [`Tag::End`].
    pub fn from_map(map: IndexMap<String, Tag>) -> Result<Self> {
        if map.values().any(|tag| tag.id() == TagId::End) {
            return Err(Error::EndInCompound);
        }
        Ok(CompoundTag(map))
    }

    /// Starts a strict builder.
    #[must_use]
    pub fn builder() -> CompoundBuilder {
        CompoundBuilder::new()
    }

    /// Starts a loose builder holding a copy of this compound's entries.
    #[must_use]
    pub fn to_builder(&self) -> CompoundBuilder {
        CompoundBuilder {
            map: self.0.clone(),
            loose: true,
        }
    }

    /// Returns the tag stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.0.get(name)
    }

    /// Returns the tag under `name`, requiring it to be of kind `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoSuchTag`] if nothing is stored under `name`
    /// - [`Error::WrongTagType`] if the stored tag has another kind
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nbt_stream::{compound, TagId};
    ///
    /// let tag = compound! { "Hello" => "World!" }.unwrap();
    /// assert_eq!(tag.get_tag("Hello", TagId::String).unwrap().as_str(), Some("World!"));
    /// assert!(tag.get_tag("Hello", TagId::LongArray).is_err());
    /// assert!(tag.get_tag("Goodbye", TagId::String).is_err());
    /// ```
    pub fn get_tag(&self, name: &str, id: TagId) -> Result<&Tag> {
        let tag = self
            .get(name)
            .ok_or_else(|| Error::NoSuchTag(name.to_string()))?;
        if tag.id() != id {
            return Err(Error::WrongTagType {
                name: name.to_string(),
                expected: id,
                found: tag.id(),
            });
        }
        Ok(tag)
    }

    /// Like [`get_tag`](CompoundTag::get_tag), but returns `None` instead of an error.
    #[must_use]
    pub fn find_tag(&self, name: &str, id: TagId) -> Option<&Tag> {
        self.get(name).filter(|tag| tag.id() == id)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Tag> {
        self.0.keys()
    }

    /// Returns an iterator over the tags, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Tag> {
        self.0.values()
    }

    /// Returns an iterator over the entries, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Tag> {
        self.0.iter()
    }

    /// The tokens of this compound, from `CompoundStart` to `CompoundEnd`.
    pub fn tokens(&self) -> TagTokens<'_> {
        TagTokens::for_compound(self)
    }
}

impl<'a> IntoIterator for &'a CompoundTag {
    type Item = (&'a String, &'a Tag);
    type IntoIter = indexmap::map::Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for CompoundTag {
    type Item = (String, Tag);
    type IntoIter = indexmap::map::IntoIter<String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for CompoundTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tag) in &self.0 {
            map.serialize_entry(name, tag)?;
        }
        map.end()
    }
}

/// Accumulates compound entries, checking each one as it is put.
#[derive(Clone, Debug, Default)]
pub struct CompoundBuilder {
    map: IndexMap<String, Tag>,
    loose: bool,
}

impl CompoundBuilder {
    /// Creates a strict builder: duplicate names are rejected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loose builder: duplicate names overwrite.
    #[must_use]
    pub fn loose() -> Self {
        CompoundBuilder {
            map: IndexMap::new(),
            loose: true,
        }
    }

    /// Adds an entry.
    ///
    /// # Errors
    ///
    /// - [`Error::EndInCompound`] if the value is [`Tag::End`]
    /// - [`Error::DuplicateName`] if a strict builder already holds `name`
    ///
    /// The builder is unchanged when an error is returned.
    pub fn put<K, V>(&mut self, name: K, tag: V) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Tag>,
    {
        let name = name.into();
        let tag = tag.into();
        if tag.id() == TagId::End {
            return Err(Error::EndInCompound);
        }
        if !self.loose && self.map.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.map.insert(name, tag);
        Ok(self)
    }

    /// Adds every entry of `entries`, stopping at the first rejected one.
    ///
    /// # Errors
    ///
    /// The first error from [`CompoundBuilder::put`].
    pub fn put_all<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Tag>,
    {
        for (name, tag) in entries {
            self.put(name, tag)?;
        }
        Ok(self)
    }

    /// Removes an entry, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        self.map.shift_remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Finishes the compound.
    #[must_use]
    pub fn build(self) -> CompoundTag {
        CompoundTag(self.map)
    }
}
