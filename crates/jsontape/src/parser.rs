//! The reusable parser context.
//!
//! A [`Parser`] owns the stage-1 structural index, the tape and the string
//! buffer, and re-uses them across documents so steady-state parsing does
//! not allocate. The mutating entry points (`parse`, `iterate`,
//! `parse_many`) borrow the parser for the lifetime of what they return,
//! which is how handles from a previous document are invalidated.

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::ondemand::{JsonIterator, OndemandDocument};
use crate::padded::{PaddedString, PaddedStringView};
use crate::stage1::{self, Stage1Mode, StructuralIndex};
use crate::stage2;
use crate::stream::DocumentStream;
use crate::tape::TapeDoc;

/// Default nesting bound.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Default size bound: just under 4 GiB, the most 32-bit offsets can span.
pub const DEFAULT_MAX_CAPACITY: usize = stage1::MAX_DOCUMENT_BYTES;

/// A reusable JSON parser. Create once, feed many documents.
///
/// ```
/// use jsontape::{PaddedString, Parser};
///
/// let mut parser = Parser::new();
/// let json = PaddedString::from(r#"{"answer": 42}"#);
/// let doc = parser.parse(&json)?;
/// assert_eq!(doc.at_pointer("/answer")?.get_i64()?, 42);
/// # Ok::<(), jsontape::Error>(())
/// ```
#[derive(Debug)]
pub struct Parser {
    pub(crate) stage1: StructuralIndex,
    pub(crate) doc: TapeDoc,
    max_capacity: usize,
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser with the default capacity and depth bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_CAPACITY, DEFAULT_MAX_DEPTH)
    }

    /// A parser with explicit bounds.
    #[must_use]
    pub fn with_limits(max_capacity: usize, max_depth: usize) -> Self {
        Self {
            stage1: StructuralIndex::default(),
            doc: TapeDoc::default(),
            max_capacity: max_capacity.min(stage1::MAX_DOCUMENT_BYTES),
            max_depth,
        }
    }

    /// Largest document this parser will allocate for.
    #[must_use]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Adjusts the capacity bound; takes effect on the next parse.
    pub fn set_max_capacity(&mut self, max_capacity: usize) {
        self.max_capacity = max_capacity.min(stage1::MAX_DOCUMENT_BYTES);
    }

    /// Deepest nesting this parser accepts.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Adjusts the nesting bound; takes effect on the next parse.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Name of the block-classification kernel this process selected
    /// (`"avx2"`, `"sse2"`, `"neon"` or `"fallback"`).
    #[must_use]
    pub fn implementation_name() -> &'static str {
        crate::stage1::kernel::active().name
    }

    /// Parses one document to a tape and returns the navigable view.
    ///
    /// # Errors
    ///
    /// Any stage-1 or stage-2 error; `Capacity` when the input exceeds
    /// [`max_capacity`](Self::max_capacity).
    pub fn parse<'p>(&'p mut self, json: &'p PaddedString) -> Result<Document<'p>> {
        self.parse_view(json.as_view())
    }

    /// Like [`parse`](Self::parse) over a borrowed, caller-padded buffer.
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse).
    pub fn parse_view<'p>(&'p mut self, json: PaddedStringView<'p>) -> Result<Document<'p>> {
        self.check_capacity(json.len())?;
        stage1::index(
            json.padded_bytes(),
            json.len(),
            Stage1Mode::Single,
            &mut self.stage1,
        )?;
        self.doc.string_buf.reserve(json.len() + 64);
        stage2::build(
            json.padded_bytes(),
            &mut self.stage1,
            &mut self.doc,
            self.max_depth,
            true,
        )?;
        Ok(Document { doc: &self.doc })
    }

    /// Runs stage 1 only and returns the lazy on-demand cursor.
    ///
    /// # Errors
    ///
    /// Stage-1 validation errors; `Capacity` past the configured bound.
    pub fn iterate<'p>(&'p mut self, json: &'p PaddedString) -> Result<OndemandDocument<'p>> {
        self.check_capacity(json.len())?;
        stage1::index(
            json.padded_bytes(),
            json.len(),
            Stage1Mode::Single,
            &mut self.stage1,
        )?;
        Ok(OndemandDocument::new(JsonIterator::new(
            json.padded_bytes(),
            &self.stage1,
        )))
    }

    /// Parses a whitespace-separated concatenation of documents in windows
    /// of `batch_size` bytes.
    ///
    /// # Errors
    ///
    /// `Capacity` when `batch_size` exceeds the parser's capacity bound.
    pub fn parse_many<'p>(
        &'p mut self,
        json: &'p PaddedString,
        batch_size: usize,
    ) -> Result<DocumentStream<'p>> {
        DocumentStream::new(self, json, batch_size)
    }

    pub(crate) fn check_capacity(&self, len: usize) -> Result<()> {
        if len > self.max_capacity {
            return Err(Error::Capacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use crate::error::Error;
    use crate::padded::PaddedString;

    #[test]
    fn parser_reuse_produces_identical_tapes() {
        let mut parser = Parser::new();
        let json = PaddedString::from(r#"{"a":[1,2,{"b":"c"}],"d":null}"#);
        let first: Vec<u64> = {
            let doc = parser.parse(&json).unwrap();
            doc.dump_raw_tape();
            parser.doc.tape.clone()
        };
        let first_strings = parser.doc.string_buf.clone();
        let _ = parser.parse(&json).unwrap();
        assert_eq!(parser.doc.tape, first);
        assert_eq!(parser.doc.string_buf, first_strings);
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let mut parser = Parser::with_limits(8, 1024);
        let json = PaddedString::from(r#"{"too":"big"}"#);
        assert_eq!(parser.parse(&json).unwrap_err(), Error::Capacity);
        parser.set_max_capacity(1024);
        assert!(parser.parse(&json).is_ok());
    }

    #[test]
    fn depth_limit_is_configurable() {
        let mut parser = Parser::with_limits(1024, 2);
        let shallow = PaddedString::from(r#"{"a":[]}"#);
        assert!(parser.parse(&shallow).is_ok());
        let deep = PaddedString::from(r#"{"a":[[]]}"#);
        assert_eq!(parser.parse(&deep).unwrap_err(), Error::DepthError);
    }

    #[test]
    fn implementation_name_is_reported() {
        let name = Parser::implementation_name();
        assert!(["avx2", "sse2", "neon", "fallback"].contains(&name));
    }
}
