//! Array views and iteration.

use crate::error::{Error, Result};
use crate::tape::TapeDoc;

use super::element::pointer_token;
use super::Element;

/// An element known to be an array.
#[derive(Debug, Clone, Copy)]
pub struct Array<'p> {
    doc: &'p TapeDoc,
    start: usize,
}

impl<'p> Array<'p> {
    pub(crate) fn new(doc: &'p TapeDoc, start: usize) -> Self {
        Self { doc, start }
    }

    /// Number of direct children. Saturates at `0xFF_FFFF`; iterate for an
    /// exact count past that.
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc.scope_count(self.start)
    }

    /// `true` for `[]`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates elements in document order.
    #[must_use]
    pub fn iter(&self) -> ArrayIter<'p> {
        ArrayIter {
            doc: self.doc,
            current: self.start + 1,
            end: self.doc.matching_index(self.start),
        }
    }

    /// The element at `index`; costs `index` sibling jumps.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` past the end.
    pub fn at(&self, index: usize) -> Result<Element<'p>> {
        self.iter()
            .nth(index)
            .ok_or(Error::IndexOutOfBounds)
    }

    /// This array as a plain element again.
    #[must_use]
    pub fn as_element(&self) -> Element<'p> {
        Element::new(self.doc, self.start)
    }

    /// JSON pointer resolution relative to this array.
    ///
    /// # Errors
    ///
    /// `InvalidJsonPointer` for malformed pointers or tokens that are not
    /// clean decimal indexes; `IndexOutOfBounds` for `-` and out-of-range
    /// indexes; `IncorrectType` for non-numeric tokens.
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Element<'p>> {
        if json_pointer.is_empty() {
            return Ok(self.as_element());
        }
        if !json_pointer.starts_with('/') {
            return Err(Error::InvalidJsonPointer);
        }
        let (token, remainder) = pointer_token(json_pointer)?;
        let child = self.at(parse_array_index(&token)?)?;
        if remainder.is_empty() {
            Ok(child)
        } else {
            child.at_pointer(remainder)
        }
    }
}

impl<'p> IntoIterator for &Array<'p> {
    type Item = Element<'p>;
    type IntoIter = ArrayIter<'p>;

    fn into_iter(self) -> ArrayIter<'p> {
        self.iter()
    }
}

/// Parses an RFC 6901 array token: plain decimal, no leading zeros, with `-`
/// mapped to the past-the-end error.
fn parse_array_index(token: &str) -> Result<usize> {
    if token == "-" {
        // The "new element" index never resolves to an existing one.
        return Err(Error::IndexOutOfBounds);
    }
    if token.is_empty() {
        return Err(Error::InvalidJsonPointer);
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::IncorrectType);
    }
    if token.len() > 1 && token.starts_with('0') {
        return Err(Error::InvalidJsonPointer);
    }
    token.parse().map_err(|_| Error::IndexOutOfBounds)
}

/// Iterator over an array's elements.
#[derive(Debug, Clone)]
pub struct ArrayIter<'p> {
    doc: &'p TapeDoc,
    current: usize,
    end: usize,
}

impl<'p> Iterator for ArrayIter<'p> {
    type Item = Element<'p>;

    fn next(&mut self) -> Option<Element<'p>> {
        if self.current >= self.end {
            return None;
        }
        let element = Element::new(self.doc, self.current);
        self.current = self.doc.after_element(self.current);
        Some(element)
    }
}
