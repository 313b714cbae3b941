//! Stage 2: the structural walk that builds the tape.
//!
//! A pushdown automaton consumes the stage-1 index in order, decoding scalars
//! as it meets them and emitting tape words. Scope words are patched with
//! their partner's index at close time, so navigation can jump over a whole
//! subtree in one read. One call parses exactly one document, which is what
//! the stream driver leans on: the structural cursor is left at the next
//! document start and `Empty` signals an exhausted window.

use crate::error::{Error, Result};
use crate::number::{parse_number, Number};
use crate::stage1::StructuralIndex;
use crate::strings::parse_string;
use crate::tables::is_structural_or_whitespace;
use crate::tape::{word, TapeDoc, TapeTag, COUNT_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ObjectBegin,
    ObjectField,
    ObjectContinue,
    ArrayBegin,
    ArrayValue,
    ArrayContinue,
    DocumentEnd,
}

struct Scope {
    tape_index: usize,
    count: u32,
    is_array: bool,
}

/// Builds one document's tape from the next unconsumed structurals.
///
/// `single` demands that this document exhaust the index; streaming callers
/// pass `false` and call again for the following document.
pub(crate) fn build(
    src: &[u8],
    index: &mut StructuralIndex,
    doc: &mut TapeDoc,
    max_depth: usize,
    single: bool,
) -> Result<()> {
    doc.clear();
    doc.tape.reserve(index.n + 2);
    let mut builder = TapeBuilder {
        src,
        index,
        doc,
        max_depth,
        stack: Vec::new(),
    };
    builder.run(single)
}

struct TapeBuilder<'a> {
    src: &'a [u8],
    index: &'a mut StructuralIndex,
    doc: &'a mut TapeDoc,
    max_depth: usize,
    stack: Vec<Scope>,
}

impl TapeBuilder<'_> {
    fn run(&mut self, single: bool) -> Result<()> {
        let Some(first) = self.index.advance() else {
            return Err(Error::Empty);
        };
        let first = first as usize;
        // Root placeholder; patched once the document closes.
        self.doc.tape.push(0);

        let mut state = match self.src[first] {
            b'{' => {
                self.open_scope(false)?;
                State::ObjectBegin
            }
            b'[' => {
                self.open_scope(true)?;
                State::ArrayBegin
            }
            _ => {
                self.emit_scalar(first)?;
                State::DocumentEnd
            }
        };

        while state != State::DocumentEnd {
            state = self.step(state)?;
        }

        let terminal = self.doc.tape.len();
        self.doc.tape.push(word(TapeTag::Root, 0));
        self.doc.tape[0] = word(TapeTag::Root, (terminal + 1) as u64);

        if single && !self.index.is_exhausted() {
            return Err(Error::TapeError);
        }
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::ObjectBegin => {
                let t = self.advance_or_incomplete()?;
                match self.src[t] {
                    b'"' => {
                        self.bump_count();
                        self.emit_key(t)?;
                        Ok(State::ObjectField)
                    }
                    b'}' => self.close_scope(),
                    _ => Err(Error::TapeError),
                }
            }
            State::ObjectField => {
                let t = self.advance_or_incomplete()?;
                match self.src[t] {
                    b'{' => {
                        self.open_scope(false)?;
                        Ok(State::ObjectBegin)
                    }
                    b'[' => {
                        self.open_scope(true)?;
                        Ok(State::ArrayBegin)
                    }
                    _ => {
                        self.emit_scalar(t)?;
                        Ok(State::ObjectContinue)
                    }
                }
            }
            State::ObjectContinue => {
                let t = self.advance_or_incomplete()?;
                match self.src[t] {
                    b',' => {
                        self.bump_count();
                        let key = self.advance_or_incomplete()?;
                        if self.src[key] != b'"' {
                            return Err(Error::TapeError);
                        }
                        self.emit_key(key)?;
                        Ok(State::ObjectField)
                    }
                    b'}' => self.close_scope(),
                    _ => Err(Error::TapeError),
                }
            }
            State::ArrayBegin => {
                if self.peek_byte() == Some(b']') {
                    let _ = self.index.advance();
                    return self.close_scope();
                }
                self.bump_count();
                Ok(State::ArrayValue)
            }
            State::ArrayValue => {
                let t = self.advance_or_incomplete()?;
                match self.src[t] {
                    b'{' => {
                        self.open_scope(false)?;
                        Ok(State::ObjectBegin)
                    }
                    b'[' => {
                        self.open_scope(true)?;
                        Ok(State::ArrayBegin)
                    }
                    _ => {
                        self.emit_scalar(t)?;
                        Ok(State::ArrayContinue)
                    }
                }
            }
            State::ArrayContinue => {
                let t = self.advance_or_incomplete()?;
                match self.src[t] {
                    b',' => {
                        self.bump_count();
                        Ok(State::ArrayValue)
                    }
                    b']' => self.close_scope(),
                    _ => Err(Error::TapeError),
                }
            }
            State::DocumentEnd => Ok(State::DocumentEnd),
        }
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.index.peek().map(|offset| self.src[offset as usize])
    }

    #[inline]
    fn advance_or_incomplete(&mut self) -> Result<usize> {
        self.index
            .advance()
            .map(|offset| offset as usize)
            .ok_or(Error::IncompleteArrayOrObject)
    }

    #[inline]
    fn bump_count(&mut self) {
        if let Some(scope) = self.stack.last_mut() {
            scope.count = scope.count.saturating_add(1);
        }
    }

    fn open_scope(&mut self, is_array: bool) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::DepthError);
        }
        self.stack.push(Scope {
            tape_index: self.doc.tape.len(),
            count: 0,
            is_array,
        });
        // Placeholder; patched by close_scope with the partner index and the
        // saturated child count.
        self.doc.tape.push(0);
        Ok(())
    }

    fn close_scope(&mut self) -> Result<State> {
        let scope = self.stack.pop().ok_or(Error::UnexpectedError)?;
        let close_index = self.doc.tape.len();
        let (start_tag, end_tag) = if scope.is_array {
            (TapeTag::StartArray, TapeTag::EndArray)
        } else {
            (TapeTag::StartObject, TapeTag::EndObject)
        };
        self.doc.tape.push(word(end_tag, scope.tape_index as u64));
        let count = u64::from(scope.count.min(COUNT_MASK as u32));
        self.doc.tape[scope.tape_index] =
            word(start_tag, (close_index as u64) | (count << 32));
        Ok(match self.stack.last() {
            None => State::DocumentEnd,
            Some(parent) if parent.is_array => State::ArrayContinue,
            Some(_) => State::ObjectContinue,
        })
    }

    fn emit_key(&mut self, at: usize) -> Result<()> {
        let (prefix, _) = parse_string(self.src, at, &mut self.doc.string_buf)?;
        self.doc.tape.push(word(TapeTag::String, prefix));
        let colon = self.advance_or_incomplete()?;
        if self.src[colon] != b':' {
            return Err(Error::TapeError);
        }
        Ok(())
    }

    fn emit_scalar(&mut self, at: usize) -> Result<()> {
        match self.src[at] {
            b'"' => {
                let (prefix, _) = parse_string(self.src, at, &mut self.doc.string_buf)?;
                self.doc.tape.push(word(TapeTag::String, prefix));
            }
            b't' => {
                self.check_atom(at, b"true", Error::TAtomError)?;
                self.doc.tape.push(word(TapeTag::True, 0));
            }
            b'f' => {
                self.check_atom(at, b"false", Error::FAtomError)?;
                self.doc.tape.push(word(TapeTag::False, 0));
            }
            b'n' => {
                self.check_atom(at, b"null", Error::NAtomError)?;
                self.doc.tape.push(word(TapeTag::Null, 0));
            }
            b'-' | b'0'..=b'9' => {
                let (value, _) = parse_number(self.src, at)?;
                match value {
                    Number::I64(v) => {
                        self.doc.tape.push(word(TapeTag::Int64, 0));
                        self.doc.tape.push(v as u64);
                    }
                    Number::U64(v) => {
                        self.doc.tape.push(word(TapeTag::Uint64, 0));
                        self.doc.tape.push(v);
                    }
                    Number::F64(v) => {
                        self.doc.tape.push(word(TapeTag::Double, 0));
                        self.doc.tape.push(v.to_bits());
                    }
                }
            }
            _ => return Err(Error::TapeError),
        }
        Ok(())
    }

    /// Atom literals are matched byte-exact; the following byte must end the
    /// token. The padding guarantees both reads are in bounds.
    fn check_atom(&self, at: usize, literal: &[u8], err: Error) -> Result<()> {
        if &self.src[at..at + literal.len()] != literal
            || !is_structural_or_whitespace(self.src[at + literal.len()])
        {
            return Err(err);
        }
        Ok(())
    }
}
