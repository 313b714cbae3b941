//! On-demand parsing: a forward cursor over stage-1 output.
//!
//! Nothing is decoded until asked for. One [`JsonIterator`] per document owns
//! the position, the depth, and the latched error; every handle ([`Value`],
//! [`ArrayRef`], [`ObjectRef`], [`Field`]) holds a mutable reborrow of it, so
//! the borrow checker enforces the single-active-container rule: while a
//! child handle is alive, the parent cannot move. Abandoned values are swept
//! up lazily; the next access on the parent skips whatever the child left
//! unconsumed. Input errors latch in the iterator and every later operation
//! reports the same error; type mismatches stay local to the failing call
//! and consume nothing.

use memchr::memchr;

use crate::error::{Error, Result};
use crate::number::{parse_number, Number};
use crate::stage1::StructuralIndex;
use crate::strings::{parse_string, raw_string_end};
use crate::tables::is_structural_or_whitespace;

/// The shared cursor: structural index, raw bytes, depth, latched error.
#[derive(Debug)]
pub(crate) struct JsonIterator<'p> {
    src: &'p [u8],
    indexes: &'p [u32],
    pos: usize,
    depth: usize,
    err: Option<Error>,
    scratch: Vec<u8>,
}

impl<'p> JsonIterator<'p> {
    pub(crate) fn new(src: &'p [u8], index: &'p StructuralIndex) -> Self {
        Self {
            src,
            indexes: &index.indexes[..index.n],
            pos: 0,
            depth: 0,
            err: None,
            scratch: Vec::new(),
        }
    }

    #[inline]
    fn peek(&self) -> Option<usize> {
        self.indexes.get(self.pos).map(|&offset| offset as usize)
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.peek().map(|offset| self.src[offset])
    }

    #[inline]
    fn advance(&mut self) -> Option<usize> {
        let offset = self.peek()?;
        self.pos += 1;
        Some(offset)
    }

    /// Latches the first input error; returns it (or the earlier one).
    fn fail(&mut self, err: Error) -> Error {
        *self.err.get_or_insert(err)
    }

    fn check(&self) -> Result<()> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Consumes one whole untouched value, containers included.
    fn skip_value(&mut self) -> Result<()> {
        let Some(t) = self.advance() else {
            return Err(self.fail(Error::IncompleteArrayOrObject));
        };
        if matches!(self.src[t], b'{' | b'[') {
            let mut level = 1usize;
            while level > 0 {
                let Some(t) = self.advance() else {
                    return Err(self.fail(Error::IncompleteArrayOrObject));
                };
                match self.src[t] {
                    b'{' | b'[' => level += 1,
                    b'}' | b']' => level -= 1,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Unwinds partially-consumed children until the cursor is back at
    /// `target` depth (just past the deepest open scope's close).
    fn skip_to_depth(&mut self, target: usize) -> Result<()> {
        while self.depth > target {
            let Some(t) = self.advance() else {
                return Err(self.fail(Error::IncompleteArrayOrObject));
            };
            match self.src[t] {
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => self.depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn check_atom(&mut self, at: usize, literal: &[u8], err: Error) -> Result<()> {
        if &self.src[at..at + literal.len()] != literal
            || !is_structural_or_whitespace(self.src[at + literal.len()])
        {
            return Err(self.fail(err));
        }
        Ok(())
    }
}

fn key_span_matches(src: &[u8], start: usize, end: usize, name: &str) -> Result<bool> {
    let raw = &src[start..end];
    if memchr(b'\\', raw).is_none() {
        return Ok(raw == name.as_bytes());
    }
    // Escaped key: decode into a throwaway buffer and compare the body.
    let mut decoded = Vec::with_capacity(raw.len() + 4);
    let (_, _) = parse_string(src, start - 1, &mut decoded)?;
    Ok(&decoded[4..] == name.as_bytes())
}

/// An on-demand document; create with `Parser::iterate`.
#[derive(Debug)]
pub struct OndemandDocument<'p> {
    iter: JsonIterator<'p>,
}

impl<'p> OndemandDocument<'p> {
    pub(crate) fn new(iter: JsonIterator<'p>) -> Self {
        Self { iter }
    }

    /// The root value. Scalar roots must use the typed accessors instead.
    ///
    /// # Errors
    ///
    /// `ScalarDocumentAsValue` when the root is not an object or array.
    pub fn get_value(&mut self) -> Result<Value<'_, 'p>> {
        self.iter.check()?;
        match self.iter.peek_byte() {
            Some(b'{' | b'[') => Ok(Value {
                iter: &mut self.iter,
            }),
            Some(_) => Err(Error::ScalarDocumentAsValue),
            None => Err(Error::OutOfBounds),
        }
    }

    /// Enters the root object.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for an array root, `ScalarDocumentAsValue` for a
    /// scalar root.
    pub fn get_object(&mut self) -> Result<ObjectRef<'_, 'p>> {
        self.iter.check()?;
        match self.iter.peek_byte() {
            Some(b'{') => Value {
                iter: &mut self.iter,
            }
            .get_object(),
            Some(b'[') => Err(Error::IncorrectType),
            Some(_) => Err(Error::ScalarDocumentAsValue),
            None => Err(Error::OutOfBounds),
        }
    }

    /// Enters the root array.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for an object root, `ScalarDocumentAsValue` for a
    /// scalar root.
    pub fn get_array(&mut self) -> Result<ArrayRef<'_, 'p>> {
        self.iter.check()?;
        match self.iter.peek_byte() {
            Some(b'[') => Value {
                iter: &mut self.iter,
            }
            .get_array(),
            Some(b'{') => Err(Error::IncorrectType),
            Some(_) => Err(Error::ScalarDocumentAsValue),
            None => Err(Error::OutOfBounds),
        }
    }

    /// Reads a scalar root as a boolean.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the root is not a boolean.
    pub fn get_bool(&mut self) -> Result<bool> {
        Value {
            iter: &mut self.iter,
        }
        .get_bool()
    }

    /// Reads a scalar root as an unsigned integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` / `NumberOutOfRange` as for [`Value::get_u64`].
    pub fn get_u64(&mut self) -> Result<u64> {
        Value {
            iter: &mut self.iter,
        }
        .get_u64()
    }

    /// Reads a scalar root as a signed integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` / `NumberOutOfRange` as for [`Value::get_i64`].
    pub fn get_i64(&mut self) -> Result<i64> {
        Value {
            iter: &mut self.iter,
        }
        .get_i64()
    }

    /// Reads a scalar root as a double.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the root is not a number.
    pub fn get_f64(&mut self) -> Result<f64> {
        Value {
            iter: &mut self.iter,
        }
        .get_f64()
    }

    /// Reads a scalar root as a string.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the root is not a string.
    pub fn get_str(&mut self) -> Result<&str> {
        Value {
            iter: &mut self.iter,
        }
        .get_str()
    }

    /// `true` when the root is `null` (and consumes it).
    ///
    /// # Errors
    ///
    /// Propagates latched input errors.
    pub fn is_null(&mut self) -> Result<bool> {
        let mut value = Value {
            iter: &mut self.iter,
        };
        value.is_null()
    }

    /// `true` once every structural of this document has been consumed.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.iter.pos >= self.iter.indexes.len()
    }
}

/// The syntactic kind of a not-yet-decoded value, judged from its first
/// byte. Numbers are not classified further until decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `{...}`
    Object,
    /// `[...]`
    Array,
    /// `"..."`
    String,
    /// Integer or double; decode to find out.
    Number,
    /// `true` or `false`.
    Bool,
    /// `null`
    Null,
}

/// One not-yet-decoded value. Scalar accessors consume the handle and the
/// underlying token; container accessors hand activity to the new handle.
/// On a type mismatch nothing is consumed, so the parent can still skip it.
#[derive(Debug)]
pub struct Value<'i, 'p> {
    iter: &'i mut JsonIterator<'p>,
}

impl<'i, 'p> Value<'i, 'p> {
    /// Classifies this value without consuming anything.
    ///
    /// # Errors
    ///
    /// Propagates latched input errors; `TapeError` when the cursor sits on
    /// a byte no value can start with.
    pub fn kind(&self) -> Result<ValueKind> {
        self.iter.check()?;
        match self.iter.peek_byte() {
            Some(b'{') => Ok(ValueKind::Object),
            Some(b'[') => Ok(ValueKind::Array),
            Some(b'"') => Ok(ValueKind::String),
            Some(b't' | b'f') => Ok(ValueKind::Bool),
            Some(b'n') => Ok(ValueKind::Null),
            Some(b'-' | b'0'..=b'9') => Ok(ValueKind::Number),
            Some(_) => Err(Error::TapeError),
            None => Err(Error::IncompleteArrayOrObject),
        }
    }

    /// Decodes any number to its natural width.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-numbers, `NumberError` for malformed ones.
    pub fn get_number(self) -> Result<Number> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        if !matches!(byte, b'-' | b'0'..=b'9') {
            return Err(Error::IncorrectType);
        }
        let (value, _) = parse_number(this.iter.src, at).map_err(|e| match e {
            Error::NumberError => this.iter.fail(e),
            other => other,
        })?;
        let _ = this.iter.advance();
        Ok(value)
    }

    fn peek_or_truncated(&mut self) -> Result<(usize, u8)> {
        self.iter.check()?;
        match self.iter.peek() {
            Some(offset) => Ok((offset, self.iter.src[offset])),
            None => Err(self.iter.fail(Error::IncompleteArrayOrObject)),
        }
    }

    /// Reads `true` or `false`.
    ///
    /// # Errors
    ///
    /// `IncorrectType` (nothing consumed) when this value is not a boolean.
    pub fn get_bool(self) -> Result<bool> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        let result = match byte {
            b't' => {
                this.iter.check_atom(at, b"true", Error::TAtomError)?;
                true
            }
            b'f' => {
                this.iter.check_atom(at, b"false", Error::FAtomError)?;
                false
            }
            _ => return Err(Error::IncorrectType),
        };
        let _ = this.iter.advance();
        Ok(result)
    }

    /// `true` when this value is `null`, consuming it. Otherwise leaves the
    /// value untouched so a typed accessor can follow.
    ///
    /// # Errors
    ///
    /// Propagates latched input errors and malformed `n` atoms.
    pub fn is_null(&mut self) -> Result<bool> {
        let (at, byte) = self.peek_or_truncated()?;
        if byte != b'n' {
            return Ok(false);
        }
        self.iter.check_atom(at, b"null", Error::NAtomError)?;
        let _ = self.iter.advance();
        Ok(true)
    }

    /// Reads an unsigned integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-numbers, `NumberOutOfRange` for negatives and
    /// doubles that are not integers, `NumberError` for malformed numbers.
    pub fn get_u64(self) -> Result<u64> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        if !matches!(byte, b'-' | b'0'..=b'9') {
            return Err(Error::IncorrectType);
        }
        let (value, _) = parse_number(this.iter.src, at).map_err(|e| match e {
            Error::NumberError => this.iter.fail(e),
            other => other,
        })?;
        let result = match value {
            Number::U64(v) => v,
            Number::I64(v) => u64::try_from(v).map_err(|_| Error::NumberOutOfRange)?,
            Number::F64(_) => return Err(Error::IncorrectType),
        };
        let _ = this.iter.advance();
        Ok(result)
    }

    /// Reads a signed integer.
    ///
    /// # Errors
    ///
    /// As [`get_u64`](Self::get_u64), with the ranges mirrored.
    pub fn get_i64(self) -> Result<i64> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        if !matches!(byte, b'-' | b'0'..=b'9') {
            return Err(Error::IncorrectType);
        }
        let (value, _) = parse_number(this.iter.src, at).map_err(|e| match e {
            Error::NumberError => this.iter.fail(e),
            other => other,
        })?;
        let result = match value {
            Number::I64(v) => v,
            Number::U64(v) => i64::try_from(v).map_err(|_| Error::NumberOutOfRange)?,
            Number::F64(_) => return Err(Error::IncorrectType),
        };
        let _ = this.iter.advance();
        Ok(result)
    }

    /// Reads any number as a double.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-numbers, `NumberError` for malformed ones.
    pub fn get_f64(self) -> Result<f64> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        if !matches!(byte, b'-' | b'0'..=b'9') {
            return Err(Error::IncorrectType);
        }
        let (value, _) = parse_number(this.iter.src, at).map_err(|e| match e {
            Error::NumberError => this.iter.fail(e),
            other => other,
        })?;
        let _ = this.iter.advance();
        Ok(match value {
            Number::F64(v) => v,
            Number::I64(v) => v as f64,
            Number::U64(v) => v as f64,
        })
    }

    /// Decodes the string into the iterator's scratch buffer; the slice is
    /// valid until the next string is decoded.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-strings, `StringError` for bad escapes.
    pub fn get_str(self) -> Result<&'i str> {
        let mut this = self;
        let (at, byte) = this.peek_or_truncated()?;
        if byte != b'"' {
            return Err(Error::IncorrectType);
        }
        let iter = this.iter;
        iter.scratch.clear();
        if let Err(e) = parse_string(iter.src, at, &mut iter.scratch) {
            return Err(iter.fail(e));
        }
        let _ = iter.advance();
        // SAFETY: the string decoder only writes valid UTF-8 after the
        // 4-byte length prefix.
        Ok(unsafe { std::str::from_utf8_unchecked(&iter.scratch[4..]) })
    }

    /// Enters this value as an object.
    ///
    /// # Errors
    ///
    /// `IncorrectType` (nothing consumed) when it is not one.
    pub fn get_object(self) -> Result<ObjectRef<'i, 'p>> {
        let mut this = self;
        let (_, byte) = this.peek_or_truncated()?;
        if byte != b'{' {
            return Err(Error::IncorrectType);
        }
        let _ = this.iter.advance();
        this.iter.depth += 1;
        let depth = this.iter.depth;
        let start_pos = this.iter.pos;
        Ok(ObjectRef {
            depth,
            start_pos,
            value_start: start_pos,
            at_start: true,
            finished: false,
            iter: this.iter,
        })
    }

    /// Enters this value as an array.
    ///
    /// # Errors
    ///
    /// `IncorrectType` (nothing consumed) when it is not one.
    pub fn get_array(self) -> Result<ArrayRef<'i, 'p>> {
        let mut this = self;
        let (_, byte) = this.peek_or_truncated()?;
        if byte != b'[' {
            return Err(Error::IncorrectType);
        }
        let _ = this.iter.advance();
        this.iter.depth += 1;
        let depth = this.iter.depth;
        let element_start = this.iter.pos;
        Ok(ArrayRef {
            depth,
            element_start,
            at_start: true,
            finished: false,
            iter: this.iter,
        })
    }

    /// Discards this value, containers included.
    ///
    /// # Errors
    ///
    /// Propagates latched input errors.
    pub fn skip(self) -> Result<()> {
        self.iter.check()?;
        self.iter.skip_value()
    }
}

/// Cursor into an array being iterated. Not a `std` iterator: each yielded
/// [`Value`] borrows the cursor, so elements are pulled one at a time with
/// [`next`](Self::next).
#[derive(Debug)]
pub struct ArrayRef<'i, 'p> {
    iter: &'i mut JsonIterator<'p>,
    depth: usize,
    /// Cursor position of the most recently vended element; an element whose
    /// position has not moved was never consumed and gets skipped whole.
    element_start: usize,
    at_start: bool,
    finished: bool,
}

impl<'i, 'p> ArrayRef<'i, 'p> {
    /// The next element, or `None` past the closing bracket.
    ///
    /// The previous element need not have been consumed; whatever is left of
    /// it is skipped first.
    ///
    /// # Errors
    ///
    /// Structural errors (missing comma, truncation) are yielded once; the
    /// cursor then reports itself finished.
    pub fn next(&mut self) -> Result<Option<Value<'_, 'p>>> {
        if self.finished {
            return Ok(None);
        }
        if let Some(err) = self.iter.err {
            self.finished = true;
            return Err(err);
        }
        debug_assert!(
            self.iter.depth >= self.depth,
            "array cursor resumed after its scope closed"
        );
        if self.iter.depth < self.depth {
            self.finished = true;
            return Err(self.iter.fail(Error::OutOfOrderIteration));
        }

        if self.at_start {
            self.at_start = false;
            return match self.iter.peek_byte() {
                Some(b']') => {
                    let _ = self.iter.advance();
                    self.iter.depth -= 1;
                    self.finished = true;
                    Ok(None)
                }
                Some(_) => {
                    self.element_start = self.iter.pos;
                    Ok(Some(Value {
                        iter: &mut *self.iter,
                    }))
                }
                None => {
                    self.finished = true;
                    Err(self.iter.fail(Error::IncompleteArrayOrObject))
                }
            };
        }

        if let Err(err) = self.settle_previous_element() {
            self.finished = true;
            return Err(err);
        }
        match self.iter.advance() {
            Some(t) => match self.iter.src[t] {
                b',' => {
                    self.element_start = self.iter.pos;
                    Ok(Some(Value {
                        iter: &mut *self.iter,
                    }))
                }
                b']' => {
                    self.iter.depth -= 1;
                    self.finished = true;
                    Ok(None)
                }
                _ => {
                    self.finished = true;
                    Err(self.iter.fail(Error::TapeError))
                }
            },
            None => {
                self.finished = true;
                Err(self.iter.fail(Error::IncompleteArrayOrObject))
            }
        }
    }

    /// Leaves the cursor right after the previous element, whether the user
    /// consumed it fully, partially, or not at all.
    fn settle_previous_element(&mut self) -> Result<()> {
        if self.iter.pos == self.element_start {
            // Never touched: consume the whole element.
            self.iter.skip_value()
        } else {
            // Touched: unwind whatever nesting was left open.
            self.iter.skip_to_depth(self.depth)
        }
    }
}

/// One object field: the raw key plus the value cursor.
#[derive(Debug)]
pub struct Field<'f, 'p> {
    key_start: usize,
    key_end: usize,
    value: Value<'f, 'p>,
}

impl<'f, 'p> Field<'f, 'p> {
    /// The key bytes exactly as they appear in the document (escapes intact,
    /// quotes excluded).
    #[must_use]
    pub fn key_raw(&self) -> &'p [u8] {
        &self.value.iter.src[self.key_start..self.key_end]
    }

    /// Compares the key against `name`, decoding escapes only when present.
    ///
    /// # Errors
    ///
    /// `StringError` when the key contains a malformed escape.
    pub fn key_matches(&self, name: &str) -> Result<bool> {
        key_span_matches(self.value.iter.src, self.key_start, self.key_end, name)
    }

    /// The key with escapes decoded.
    ///
    /// # Errors
    ///
    /// `StringError` when the key contains a malformed escape.
    pub fn unescaped_key(&self) -> Result<String> {
        let src = self.value.iter.src;
        let mut decoded = Vec::with_capacity(self.key_end - self.key_start + 4);
        parse_string(src, self.key_start - 1, &mut decoded)?;
        decoded.drain(..4);
        String::from_utf8(decoded).map_err(|_| Error::StringError)
    }

    /// Hands over the value cursor.
    #[must_use]
    pub fn value(self) -> Value<'f, 'p> {
        self.value
    }
}

/// Cursor into an object being iterated.
#[derive(Debug)]
pub struct ObjectRef<'i, 'p> {
    iter: &'i mut JsonIterator<'p>,
    depth: usize,
    /// Cursor position of the first token after `{`; the unordered lookup
    /// rewinds here for its second pass.
    start_pos: usize,
    /// Cursor position of the most recently vended field value; a value
    /// whose position has not moved was never consumed.
    value_start: usize,
    at_start: bool,
    finished: bool,
}

impl<'i, 'p> ObjectRef<'i, 'p> {
    /// The next field in document order, or `None` past the closing brace.
    ///
    /// # Errors
    ///
    /// Structural errors are yielded once; the cursor then reports itself
    /// finished.
    pub fn next_field(&mut self) -> Result<Option<Field<'_, 'p>>> {
        match self.advance_to_next_key()? {
            None => Ok(None),
            Some((key_start, key_end)) => Ok(Some(Field {
                key_start,
                key_end,
                value: Value {
                    iter: &mut *self.iter,
                },
            })),
        }
    }

    /// Forward-only lookup: consumes fields up to the first whose key equals
    /// `name`. Earlier fields cannot be revisited.
    ///
    /// # Errors
    ///
    /// `NoSuchField` once the closing brace is reached.
    pub fn find_field(&mut self, name: &str) -> Result<Value<'_, 'p>> {
        loop {
            match self.advance_to_next_key()? {
                None => return Err(Error::NoSuchField),
                Some((start, end)) => {
                    if key_span_matches(self.iter.src, start, end, name)? {
                        return Ok(Value {
                            iter: &mut *self.iter,
                        });
                    }
                    self.iter.skip_value()?;
                }
            }
        }
    }

    /// Order-insensitive lookup: scans forward, then wraps once from the
    /// object's start. `NoSuchField` only after a full loop.
    ///
    /// # Errors
    ///
    /// `NoSuchField` when no field matches anywhere in the object.
    pub fn find_field_unordered(&mut self, name: &str) -> Result<Value<'_, 'p>> {
        let search_start = self.iter.pos;
        let began_at_start = self.at_start;
        let mut matched = false;
        loop {
            match self.advance_to_next_key()? {
                None => break,
                Some((start, end)) => {
                    if key_span_matches(self.iter.src, start, end, name)? {
                        matched = true;
                        break;
                    }
                    self.iter.skip_value()?;
                }
            }
        }
        if matched {
            return Ok(Value {
                iter: &mut *self.iter,
            });
        }
        if began_at_start {
            return Err(Error::NoSuchField);
        }

        // Wrap: reopen the scope the forward scan just closed and rescan the
        // fields before the original position.
        self.iter.pos = self.start_pos;
        self.iter.depth += 1;
        self.at_start = true;
        self.finished = false;
        while self.iter.pos < search_start {
            match self.advance_to_next_key()? {
                None => break,
                Some((start, end)) => {
                    if key_span_matches(self.iter.src, start, end, name)? {
                        return Ok(Value {
                            iter: &mut *self.iter,
                        });
                    }
                    self.iter.skip_value()?;
                }
            }
        }
        // Not found: run the cursor out to the close so the object ends in a
        // consistent finished state.
        while self.advance_to_next_key()?.is_some() {
            self.iter.skip_value()?;
        }
        Err(Error::NoSuchField)
    }

    /// Moves to the next key, skipping the previous field's remains; returns
    /// the raw key span with the cursor parked on the value.
    fn advance_to_next_key(&mut self) -> Result<Option<(usize, usize)>> {
        if self.finished {
            return Ok(None);
        }
        if let Some(err) = self.iter.err {
            self.finished = true;
            return Err(err);
        }
        debug_assert!(
            self.iter.depth >= self.depth,
            "object cursor resumed after its scope closed"
        );
        if self.iter.depth < self.depth {
            self.finished = true;
            return Err(self.iter.fail(Error::OutOfOrderIteration));
        }

        if self.at_start {
            self.at_start = false;
            return match self.iter.peek_byte() {
                Some(b'}') => {
                    let _ = self.iter.advance();
                    self.iter.depth -= 1;
                    self.finished = true;
                    Ok(None)
                }
                Some(b'"') => self.read_key(),
                Some(_) => {
                    self.finished = true;
                    Err(self.iter.fail(Error::TapeError))
                }
                None => {
                    self.finished = true;
                    Err(self.iter.fail(Error::IncompleteArrayOrObject))
                }
            };
        }

        if let Err(err) = self.settle_previous_value() {
            self.finished = true;
            return Err(err);
        }
        match self.iter.advance() {
            Some(t) => match self.iter.src[t] {
                b',' => {
                    if self.iter.peek_byte() == Some(b'"') {
                        self.read_key()
                    } else {
                        self.finished = true;
                        Err(self.iter.fail(Error::TapeError))
                    }
                }
                b'}' => {
                    self.iter.depth -= 1;
                    self.finished = true;
                    Ok(None)
                }
                _ => {
                    self.finished = true;
                    Err(self.iter.fail(Error::TapeError))
                }
            },
            None => {
                self.finished = true;
                Err(self.iter.fail(Error::IncompleteArrayOrObject))
            }
        }
    }

    fn settle_previous_value(&mut self) -> Result<()> {
        if self.iter.pos == self.value_start {
            self.iter.skip_value()
        } else {
            self.iter.skip_to_depth(self.depth)
        }
    }

    /// Consumes `"key"` and the following `:`; returns the key's byte span.
    fn read_key(&mut self) -> Result<Option<(usize, usize)>> {
        let Some(key_at) = self.iter.advance() else {
            self.finished = true;
            return Err(self.iter.fail(Error::IncompleteArrayOrObject));
        };
        let key_end = match raw_string_end(self.iter.src, key_at) {
            Ok(end) => end,
            Err(err) => {
                self.finished = true;
                return Err(self.iter.fail(err));
            }
        };
        match self.iter.advance() {
            Some(colon) if self.iter.src[colon] == b':' => {
                self.value_start = self.iter.pos;
                Ok(Some((key_at + 1, key_end)))
            }
            Some(_) => {
                self.finished = true;
                Err(self.iter.fail(Error::TapeError))
            }
            None => {
                self.finished = true;
                Err(self.iter.fail(Error::IncompleteArrayOrObject))
            }
        }
    }
}
