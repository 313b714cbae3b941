//! The element cursor and its typed accessors.

use crate::error::{Error, Result};
use crate::tape::{TapeDoc, TapeTag};

use super::{json_path_to_pointer, Array, Object};

/// The JSON kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// `[...]`
    Array,
    /// `{...}`
    Object,
    /// `"..."`
    String,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned integer above `i64::MAX`.
    U64,
    /// Double-precision float.
    F64,
    /// `true` or `false`.
    Bool,
    /// `null`
    Null,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Array => "array",
            Self::Object => "object",
            Self::String => "string",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F64 => "double",
            Self::Bool => "bool",
            Self::Null => "null",
        })
    }
}

/// A typed cursor at one tape index. Cheap to copy; all accessors return
/// `Result` and never consume the element.
#[derive(Debug, Clone, Copy)]
pub struct Element<'p> {
    doc: &'p TapeDoc,
    index: usize,
}

impl<'p> Element<'p> {
    pub(crate) fn new(doc: &'p TapeDoc, index: usize) -> Self {
        Self { doc, index }
    }

    /// The kind of this element.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        // Elements are only ever constructed on value words, so the root and
        // scope-end tags cannot appear here.
        match self.doc.tag_at(self.index) {
            Some(TapeTag::StartArray) => ElementType::Array,
            Some(TapeTag::StartObject) => ElementType::Object,
            Some(TapeTag::String) => ElementType::String,
            Some(TapeTag::Int64) => ElementType::I64,
            Some(TapeTag::Uint64) => ElementType::U64,
            Some(TapeTag::Double) => ElementType::F64,
            Some(TapeTag::True | TapeTag::False) => ElementType::Bool,
            _ => {
                debug_assert!(
                    matches!(self.doc.tag_at(self.index), Some(TapeTag::Null)),
                    "element on a non-value tape word"
                );
                ElementType::Null
            }
        }
    }

    /// `true` when this element is JSON `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.doc.tag_at(self.index) == Some(TapeTag::Null)
    }

    /// Reads a boolean.
    ///
    /// # Errors
    ///
    /// `IncorrectType` unless the element is `true` or `false`.
    pub fn get_bool(&self) -> Result<bool> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::True) => Ok(true),
            Some(TapeTag::False) => Ok(false),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Reads a signed integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-integers; `NumberOutOfRange` for unsigned
    /// values above `i64::MAX`.
    pub fn get_i64(&self) -> Result<i64> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::Int64) => Ok(self.doc.number_bits(self.index) as i64),
            Some(TapeTag::Uint64) => {
                let v = self.doc.number_bits(self.index);
                i64::try_from(v).map_err(|_| Error::NumberOutOfRange)
            }
            _ => Err(Error::IncorrectType),
        }
    }

    /// Reads an unsigned integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-integers; `NumberOutOfRange` for negative
    /// values.
    pub fn get_u64(&self) -> Result<u64> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::Uint64) => Ok(self.doc.number_bits(self.index)),
            Some(TapeTag::Int64) => {
                let v = self.doc.number_bits(self.index) as i64;
                u64::try_from(v).map_err(|_| Error::NumberOutOfRange)
            }
            _ => Err(Error::IncorrectType),
        }
    }

    /// Reads a double; integers widen losslessly where they fit.
    ///
    /// # Errors
    ///
    /// `IncorrectType` unless the element is a number.
    pub fn get_f64(&self) -> Result<f64> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::Double) => Ok(f64::from_bits(self.doc.number_bits(self.index))),
            Some(TapeTag::Int64) => Ok(self.doc.number_bits(self.index) as i64 as f64),
            Some(TapeTag::Uint64) => Ok(self.doc.number_bits(self.index) as f64),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Reads a string; the slice lives as long as the document.
    ///
    /// # Errors
    ///
    /// `IncorrectType` unless the element is a string.
    pub fn get_str(&self) -> Result<&'p str> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::String) => Ok(self.doc.string_at(self.index)),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Views this element as an array.
    ///
    /// # Errors
    ///
    /// `IncorrectType` unless the element is an array.
    pub fn get_array(&self) -> Result<Array<'p>> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::StartArray) => Ok(Array::new(self.doc, self.index)),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Views this element as an object.
    ///
    /// # Errors
    ///
    /// `IncorrectType` unless the element is an object.
    pub fn get_object(&self) -> Result<Object<'p>> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::StartObject) => Ok(Object::new(self.doc, self.index)),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Array indexing; linear in `index` via sibling jumps.
    ///
    /// # Errors
    ///
    /// `IncorrectType` on non-arrays, `IndexOutOfBounds` past the end.
    pub fn at(&self, index: usize) -> Result<Element<'p>> {
        self.get_array()?.at(index)
    }

    /// First value stored under `key`.
    ///
    /// # Errors
    ///
    /// `IncorrectType` on non-objects, `NoSuchField` when absent.
    pub fn at_key(&self, key: &str) -> Result<Element<'p>> {
        self.get_object()?.at_key(key)
    }

    /// Like [`at_key`](Self::at_key) with ASCII case folding.
    ///
    /// # Errors
    ///
    /// `IncorrectType` on non-objects, `NoSuchField` when absent.
    pub fn at_key_case_insensitive(&self, key: &str) -> Result<Element<'p>> {
        self.get_object()?.at_key_case_insensitive(key)
    }

    /// RFC 6901 JSON pointer resolution relative to this element.
    ///
    /// The empty pointer returns the element itself; anything else must
    /// start with `/`.
    ///
    /// # Errors
    ///
    /// `InvalidJsonPointer` for malformed pointers, plus whatever the
    /// individual lookups raise (`NoSuchField`, `IndexOutOfBounds`,
    /// `IncorrectType`).
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Element<'p>> {
        match self.doc.tag_at(self.index) {
            Some(TapeTag::StartObject) => Object::new(self.doc, self.index).at_pointer(json_pointer),
            Some(TapeTag::StartArray) => Array::new(self.doc, self.index).at_pointer(json_pointer),
            _ => {
                if json_pointer.is_empty() {
                    Ok(*self)
                } else {
                    // A non-empty pointer cannot descend into a scalar.
                    Err(Error::InvalidJsonPointer)
                }
            }
        }
    }

    /// JSONPath subset resolution: `$.field` and `$[index]` steps only.
    ///
    /// # Errors
    ///
    /// `InvalidJsonPointer` for unsupported syntax, plus lookup errors.
    pub fn at_path(&self, json_path: &str) -> Result<Element<'p>> {
        self.at_pointer(&json_path_to_pointer(json_path)?)
    }
}

/// Splits the leading token off a pointer (after its `/`) and unescapes it.
pub(super) fn pointer_token(json_pointer: &str) -> Result<(String, &str)> {
    debug_assert!(json_pointer.starts_with('/'));
    let rest = &json_pointer[1..];
    let (token, remainder) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, ""),
    };
    if !token.contains('~') {
        return Ok((token.to_owned(), remainder));
    }
    let mut unescaped = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => unescaped.push('~'),
            Some('1') => unescaped.push('/'),
            _ => return Err(Error::InvalidJsonPointer),
        }
    }
    Ok((unescaped, remainder))
}
