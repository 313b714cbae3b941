//! Object views, keyed lookup and iteration.

use crate::error::{Error, Result};
use crate::tape::TapeDoc;

use super::element::pointer_token;
use super::Element;

/// An element known to be an object.
#[derive(Debug, Clone, Copy)]
pub struct Object<'p> {
    doc: &'p TapeDoc,
    start: usize,
}

impl<'p> Object<'p> {
    pub(crate) fn new(doc: &'p TapeDoc, start: usize) -> Self {
        Self { doc, start }
    }

    /// Number of key/value pairs. Saturates at `0xFF_FFFF`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc.scope_count(self.start)
    }

    /// `true` for `{}`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(key, value)` pairs in document order. Duplicate keys are
    /// all yielded.
    #[must_use]
    pub fn iter(&self) -> ObjectIter<'p> {
        ObjectIter {
            doc: self.doc,
            current: self.start + 1,
            end: self.doc.matching_index(self.start),
        }
    }

    /// First value stored under `key` (document order).
    ///
    /// # Errors
    ///
    /// `NoSuchField` when no pair matches.
    pub fn at_key(&self, key: &str) -> Result<Element<'p>> {
        self.iter()
            .find_map(|(k, v)| (k == key).then_some(v))
            .ok_or(Error::NoSuchField)
    }

    /// Like [`at_key`](Self::at_key), folding ASCII case only.
    ///
    /// # Errors
    ///
    /// `NoSuchField` when no pair matches.
    pub fn at_key_case_insensitive(&self, key: &str) -> Result<Element<'p>> {
        self.iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(key).then_some(v))
            .ok_or(Error::NoSuchField)
    }

    /// This object as a plain element again.
    #[must_use]
    pub fn as_element(&self) -> Element<'p> {
        Element::new(self.doc, self.start)
    }

    /// JSON pointer resolution relative to this object.
    ///
    /// # Errors
    ///
    /// `InvalidJsonPointer` for malformed pointers; `NoSuchField` for
    /// missing keys; descent errors propagate unchanged.
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Element<'p>> {
        if json_pointer.is_empty() {
            return Ok(self.as_element());
        }
        if !json_pointer.starts_with('/') {
            return Err(Error::InvalidJsonPointer);
        }
        let (token, remainder) = pointer_token(json_pointer)?;
        let child = self.at_key(&token)?;
        if remainder.is_empty() {
            Ok(child)
        } else {
            child.at_pointer(remainder)
        }
    }
}

impl<'p> IntoIterator for &Object<'p> {
    type Item = (&'p str, Element<'p>);
    type IntoIter = ObjectIter<'p>;

    fn into_iter(self) -> ObjectIter<'p> {
        self.iter()
    }
}

/// Iterator over an object's key/value pairs.
#[derive(Debug, Clone)]
pub struct ObjectIter<'p> {
    doc: &'p TapeDoc,
    current: usize,
    end: usize,
}

impl<'p> Iterator for ObjectIter<'p> {
    type Item = (&'p str, Element<'p>);

    fn next(&mut self) -> Option<(&'p str, Element<'p>)> {
        if self.current >= self.end {
            return None;
        }
        let key = self.doc.string_at(self.current);
        let value = Element::new(self.doc, self.current + 1);
        self.current = self.doc.after_element(self.current + 1);
        Some((key, value))
    }
}
