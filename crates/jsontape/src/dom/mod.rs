//! Tape navigation: typed cursors over a parsed document.
//!
//! A [`Document`] borrows the parser's tape for as long as the parser is not
//! reused; [`Element`] is a copyable (document, tape index) pair; [`Array`]
//! and [`Object`] refine elements whose kind is known. Iteration jumps from
//! sibling to sibling using the scope cross-references stage 2 patched in,
//! so skipping a subtree costs one read no matter its size.

mod array;
mod element;
mod object;
#[cfg(feature = "serde")]
mod serde_impl;

pub use array::{Array, ArrayIter};
pub use element::{Element, ElementType};
pub use object::{Object, ObjectIter};

use crate::error::{Error, Result};
use crate::tape::TapeDoc;

/// A parsed document: a view over one parser's current tape.
///
/// Lives until the owning parser is mutated again; the borrow checker
/// enforces that.
#[derive(Debug, Clone, Copy)]
pub struct Document<'p> {
    pub(crate) doc: &'p TapeDoc,
}

impl<'p> Document<'p> {
    /// The root element (tape index 1).
    #[must_use]
    pub fn root(&self) -> Element<'p> {
        Element::new(self.doc, 1)
    }

    /// RFC 6901 resolution from the root.
    ///
    /// # Errors
    ///
    /// See [`Element::at_pointer`].
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Element<'p>> {
        self.root().at_pointer(json_pointer)
    }

    /// JSONPath (`$.field` / `$[index]` subset) resolution from the root.
    ///
    /// # Errors
    ///
    /// See [`Element::at_path`].
    pub fn at_path(&self, json_path: &str) -> Result<Element<'p>> {
        self.root().at_path(json_path)
    }

    /// One annotated line per tape slot. Diagnostics only; the exact format
    /// is not a stable interface.
    #[must_use]
    pub fn dump_raw_tape(&self) -> String {
        self.doc.dump_raw_tape()
    }
}

/// Converts the supported JSONPath subset into a JSON pointer.
///
/// A leading `$` is optional; what follows must be `.field` or `[token]`
/// steps. `~` and `/` inside tokens are pointer-escaped.
pub(crate) fn json_path_to_pointer(json_path: &str) -> Result<String> {
    let bytes = json_path.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'$'));
    if i >= bytes.len() || (bytes[i] != b'.' && bytes[i] != b'[') {
        return Err(Error::InvalidJsonPointer);
    }

    let mut pointer = Vec::with_capacity(json_path.len() * 2);
    while i < bytes.len() {
        match bytes[i] {
            b'.' => pointer.push(b'/'),
            b'[' => {
                pointer.push(b'/');
                i += 1;
                while i < bytes.len() && bytes[i] != b']' {
                    push_escaped(&mut pointer, bytes[i]);
                    i += 1;
                }
                if i == bytes.len() {
                    return Err(Error::InvalidJsonPointer);
                }
            }
            b => push_escaped(&mut pointer, b),
        }
        i += 1;
    }
    // Only ASCII was inserted or escaped; multi-byte input passes through
    // byte-for-byte, so the result is still UTF-8.
    String::from_utf8(pointer).map_err(|_| Error::InvalidJsonPointer)
}

fn push_escaped(pointer: &mut Vec<u8>, b: u8) {
    match b {
        b'~' => pointer.extend_from_slice(b"~0"),
        b'/' => pointer.extend_from_slice(b"~1"),
        _ => pointer.push(b),
    }
}

#[cfg(test)]
mod tests {
    use super::json_path_to_pointer;
    use crate::error::Error;

    #[test]
    fn json_path_conversion() {
        assert_eq!(json_path_to_pointer("$.a.b"), Ok("/a/b".into()));
        assert_eq!(json_path_to_pointer("$[0]"), Ok("/0".into()));
        assert_eq!(json_path_to_pointer("$.a[12].b"), Ok("/a/12/b".into()));
        assert_eq!(json_path_to_pointer(".a"), Ok("/a".into()));
        assert_eq!(json_path_to_pointer("$.a~b/c"), Ok("/a~0b~1c".into()));
        assert_eq!(json_path_to_pointer("$"), Err(Error::InvalidJsonPointer));
        assert_eq!(json_path_to_pointer(""), Err(Error::InvalidJsonPointer));
        assert_eq!(json_path_to_pointer("a.b"), Err(Error::InvalidJsonPointer));
        assert_eq!(json_path_to_pointer("$[0"), Err(Error::InvalidJsonPointer));
    }
}
