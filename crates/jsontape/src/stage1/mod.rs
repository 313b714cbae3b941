//! Stage 1: structural indexing.
//!
//! One streaming pass over the raw bytes, 64 at a time, that validates UTF-8,
//! masks out string bodies (so quotes and braces inside strings are inert),
//! and records the offset of every structural character and scalar start.
//! Stage 2 and the on-demand front-end never look at a byte stage 1 did not
//! point them at.

pub(crate) mod bitmask;
pub(crate) mod kernel;
pub(crate) mod utf8;

use bitmask::{follows, EscapeScanner, StringScanner};
use kernel::Implementation;
use utf8::Utf8Validator;

use crate::error::{Error, Result};

/// Largest single buffer the indexer accepts: offsets are 32-bit and the
/// padding must stay addressable, so cap just under 4 GiB.
pub(crate) const MAX_DOCUMENT_BYTES: usize = 0xFFFF_FFC0;

/// How a window relates to the byte stream it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage1Mode {
    /// The buffer is one whole document.
    Single,
    /// A stream window with more input after it: the index is trimmed back
    /// to the last complete document and the remainder carries over.
    StreamingPartial,
    /// The last stream window: trailing truncated input is dropped and
    /// accounted, not retried.
    StreamingFinal,
}

/// Stage-1 output: the structural index plus the cursor consumed by stage 2.
#[derive(Debug, Default, Clone)]
pub(crate) struct StructuralIndex {
    /// Offsets of structural characters and scalar starts, strictly
    /// increasing, followed by one sentinel pointing at the consumed length
    /// so lookahead never reads past the window.
    pub indexes: Vec<u32>,
    /// Number of real entries in `indexes` (excludes the sentinel).
    pub n: usize,
    /// Cursor of the next structural to hand to stage 2 / on-demand.
    pub next: usize,
    /// Bytes of this window consumed; the next stream window starts here.
    pub window_consumed: usize,
    /// Final-window bytes belonging to an incomplete trailing document.
    pub truncated_bytes: usize,
}

impl StructuralIndex {
    fn reset(&mut self) {
        self.indexes.clear();
        self.n = 0;
        self.next = 0;
        self.window_consumed = 0;
        self.truncated_bytes = 0;
    }

    /// Offset of the next structural, without consuming it.
    #[inline]
    pub(crate) fn peek(&self) -> Option<u32> {
        (self.next < self.n).then(|| self.indexes[self.next])
    }

    /// Consumes and returns the next structural offset.
    #[inline]
    pub(crate) fn advance(&mut self) -> Option<u32> {
        let offset = self.peek()?;
        self.next += 1;
        Some(offset)
    }

    /// `true` once stage 2 has consumed every structural.
    #[inline]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.next >= self.n
    }
}

/// Runs stage 1 over `window` (`len` logical bytes, padding readable beyond)
/// and fills `out`.
///
/// # Errors
///
/// `Empty` when no structural characters remain, `Utf8Error` /
/// `UnescapedChars` / `UnclosedString` on validation failures, `Capacity`
/// when a streamed document cannot fit one window.
pub(crate) fn index(window: &[u8], len: usize, mode: Stage1Mode, out: &mut StructuralIndex) -> Result<()> {
    out.reset();
    if len == 0 {
        return Err(Error::Empty);
    }
    if len > MAX_DOCUMENT_BYTES {
        return Err(Error::Capacity);
    }
    out.indexes.reserve(len + 1);

    let implementation = kernel::active();
    let mut scanners = BlockScanners::default();

    let full_blocks = len / 64;
    for block_index in 0..full_blocks {
        let base = block_index * 64;
        let block: &[u8; 64] = window[base..base + 64]
            .try_into()
            .map_err(|_| Error::UnexpectedError)?;
        scanners.step(implementation, block, base, &mut out.indexes);
    }

    let tail = len % 64;
    if tail != 0 {
        // The tail is re-staged into a space-filled scratch block so the
        // classifier never sees bytes past the logical window, even when the
        // underlying buffer continues (stream windows).
        let base = full_blocks * 64;
        let mut scratch = [b' '; 64];
        scratch[..tail].copy_from_slice(&window[base..len]);
        scanners.step(implementation, &scratch, base, &mut out.indexes);
    }

    if !scanners.utf8.finish() {
        return Err(Error::Utf8Error);
    }
    if let Some(err) = scanners.in_string_error {
        return Err(err);
    }

    let unclosed = scanners.strings.still_in_string();
    out.n = out.indexes.len();
    match mode {
        Stage1Mode::Single => {
            if unclosed {
                return Err(Error::UnclosedString);
            }
            if out.n == 0 {
                return Err(Error::Empty);
            }
            out.window_consumed = len;
            out.indexes.push(len as u32);
            Ok(())
        }
        Stage1Mode::StreamingPartial => {
            if unclosed {
                // The opening quote of the unfinished string belongs to the
                // truncated document; drop it before looking for a boundary.
                out.indexes.pop();
                out.n -= 1;
                if out.n == 0 {
                    return Err(Error::Capacity);
                }
            }
            let keep = find_document_boundary(window, &out.indexes[..out.n]);
            if keep == 0 {
                if out.n > 0 && out.indexes[0] == 0 {
                    // One incomplete document fills the window from byte 0:
                    // no amount of carrying over will ever complete it.
                    return Err(Error::Capacity);
                }
                out.window_consumed = if out.n > 0 {
                    out.indexes[0] as usize
                } else {
                    len
                };
                out.n = 0;
                out.indexes.clear();
                out.indexes.push(out.window_consumed as u32);
                return Err(Error::Empty);
            }
            out.window_consumed = if keep < out.n {
                out.indexes[keep] as usize
            } else {
                len
            };
            out.n = keep;
            out.indexes.truncate(keep);
            out.indexes.push(out.window_consumed as u32);
            Ok(())
        }
        Stage1Mode::StreamingFinal => {
            let mut open_quote = None;
            if unclosed && out.n > 0 {
                open_quote = out.indexes.pop().map(|q| q as usize);
                out.n -= 1;
            }
            let keep = find_document_boundary(window, &out.indexes[..out.n]);
            let boundary = if keep < out.n {
                out.indexes[keep] as usize
            } else {
                len
            };
            // The truncated tail starts at the dangling document, or at the
            // unclosed quote if that came first.
            let truncation_start = open_quote.map_or(boundary, |q| q.min(boundary));
            out.truncated_bytes = len - truncation_start;
            out.n = keep;
            out.indexes.truncate(keep);
            out.indexes.push(len as u32);
            out.window_consumed = len;
            if out.n == 0 {
                return Err(Error::Empty);
            }
            Ok(())
        }
    }
}

/// Rolling state threaded through consecutive blocks.
#[derive(Default)]
struct BlockScanners {
    escapes: EscapeScanner,
    strings: StringScanner,
    utf8: Utf8Validator,
    prev_scalar: u64,
    in_string_error: Option<Error>,
}

impl BlockScanners {
    #[inline]
    fn step(
        &mut self,
        implementation: &Implementation,
        block: &[u8; 64],
        base: usize,
        out: &mut Vec<u32>,
    ) {
        let c = (implementation.classify)(block);

        if c.non_ascii != 0 || self.utf8.in_flight() || !self.utf8.is_ok() {
            self.utf8.update(block);
        }

        let escaped = self.escapes.next(c.backslash);
        let quote = c.raw_quote & !escaped;
        let in_string = self.strings.next(quote);
        // Body plus closing quote; the opening quote stays structural.
        let string_tail = in_string ^ quote;

        if c.ctrl & in_string != 0 && self.in_string_error.is_none() {
            self.in_string_error = Some(Error::UnescapedChars);
        }

        let scalar = !(c.op | c.whitespace);
        let nonquote_scalar = scalar & !quote;
        let follows_scalar = follows(nonquote_scalar, &mut self.prev_scalar);
        // A scalar byte opens a value only when the preceding byte was not
        // itself part of a scalar; that keeps `true` or `1234` down to one
        // index for the whole token.
        let scalar_start = scalar & !follows_scalar;

        let mut structural = (c.op | scalar_start) & !string_tail;
        while structural != 0 {
            out.push((base + structural.trailing_zeros() as usize) as u32);
            structural &= structural - 1;
        }
    }
}

/// Returns how many leading structurals form a whole number of complete
/// documents, scanning backwards and balancing scopes.
fn find_document_boundary(buf: &[u8], indexes: &[u32]) -> usize {
    let n = indexes.len();
    if n == 0 {
        return 0;
    }
    let mut arrays = 0i64;
    let mut objects = 0i64;
    let mut i = n - 1;
    while i > 0 {
        match buf[indexes[i] as usize] {
            b':' | b',' => {
                i -= 1;
                continue;
            }
            b'}' => {
                objects -= 1;
                i -= 1;
                continue;
            }
            b']' => {
                arrays -= 1;
                i -= 1;
                continue;
            }
            b'{' => objects += 1,
            b'[' => arrays += 1,
            _ => {}
        }
        // An opening brace or a scalar preceded by one of these is a value
        // inside some container, not a document start.
        if matches!(buf[indexes[i - 1] as usize], b'{' | b'[' | b':' | b',') {
            i -= 1;
            continue;
        }
        if arrays == 0 && objects == 0 {
            return n;
        }
        return i;
    }
    match buf[indexes[0] as usize] {
        b'}' | b']' | b':' | b',' => return 0,
        b'{' => objects += 1,
        b'[' => arrays += 1,
        _ => {}
    }
    if arrays == 0 && objects == 0 {
        return n;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::{index, Stage1Mode, StructuralIndex};
    use crate::error::Error;
    use crate::padded::PaddedString;

    fn run(json: &str) -> Result<Vec<u32>, Error> {
        let padded = PaddedString::from(json);
        let mut out = StructuralIndex::default();
        index(padded.padded_bytes(), padded.len(), Stage1Mode::Single, &mut out)?;
        Ok(out.indexes[..out.n].to_vec())
    }

    fn offsets_of(json: &str) -> Vec<u32> {
        run(json).expect("valid input")
    }

    #[test]
    fn indexes_ops_and_scalar_starts() {
        assert_eq!(offsets_of(r#"{"a":1}"#), vec![0, 1, 4, 5, 6]);
        // One index per scalar token, at its first byte.
        assert_eq!(offsets_of("true"), vec![0]);
        assert_eq!(offsets_of("  -12.5e3 "), vec![2]);
        assert_eq!(offsets_of("[1, 23, 456]"), vec![0, 1, 2, 4, 6, 8, 11]);
    }

    #[test]
    fn string_bodies_are_masked() {
        // Braces, commas and colons inside the string emit nothing.
        assert_eq!(offsets_of(r#"["{a,b}:c"]"#), vec![0, 1, 10]);
        // The escaped quote does not close the string.
        assert_eq!(offsets_of(r#"["a\"b"]"#), vec![0, 1, 7]);
        // Even-length backslash run: the quote after it does close.
        assert_eq!(offsets_of(r#"["a\\"]"#), vec![0, 1, 6]);
    }

    #[test]
    fn spans_block_boundaries() {
        // A string straddling the 64-byte boundary keeps its interior inert.
        let filler = "x".repeat(60);
        let json = format!(r#"["{filler},{{}}"]"#);
        let offsets = offsets_of(&json);
        assert_eq!(offsets, vec![0, 1, json.len() as u32 - 1]);
    }

    #[test]
    fn detects_unclosed_string() {
        assert_eq!(run(r#"["abc"#), Err(Error::UnclosedString));
        // Closing quote escaped away.
        assert_eq!(run(r#"["abc\""#), Err(Error::UnclosedString));
    }

    #[test]
    fn detects_unescaped_control_characters() {
        assert_eq!(run("[\"a\u{1}b\"]"), Err(Error::UnescapedChars));
        assert_eq!(run("[\"tab\tinside\"]"), Err(Error::UnescapedChars));
    }

    #[test]
    fn control_bytes_outside_strings_are_not_string_errors() {
        // A stray control byte outside a string is a scalar start for stage 2
        // to reject; stage 1 just indexes it.
        let offsets = run("[\u{1}]");
        assert!(offsets.is_ok());
    }

    #[test]
    fn validates_utf8() {
        let bad = PaddedString::from_bytes(&[b'[', b'"', 0xC0, 0xAF, b'"', b']']);
        let mut out = StructuralIndex::default();
        assert_eq!(
            index(bad.padded_bytes(), bad.len(), Stage1Mode::Single, &mut out),
            Err(Error::Utf8Error)
        );

        let good = PaddedString::from(r#"["héllo, wörld"]"#);
        assert!(index(good.padded_bytes(), good.len(), Stage1Mode::Single, &mut out).is_ok());
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(run(""), Err(Error::Empty));
        assert_eq!(run("   \n\t  "), Err(Error::Empty));
    }

    #[test]
    fn sentinel_points_past_the_end() {
        let padded = PaddedString::from(r#"{"a":1}"#);
        let mut out = StructuralIndex::default();
        index(padded.padded_bytes(), padded.len(), Stage1Mode::Single, &mut out).unwrap();
        assert_eq!(out.indexes[out.n], padded.len() as u32);
    }

    #[test]
    fn partial_mode_trims_to_document_boundary() {
        // Window cuts the second document in half.
        let stream = br#"{"a":1} {"b":22222"#;
        let padded = PaddedString::from_bytes(stream);
        let mut out = StructuralIndex::default();
        index(
            padded.padded_bytes(),
            padded.len(),
            Stage1Mode::StreamingPartial,
            &mut out,
        )
        .unwrap();
        // Only the first document's structurals survive.
        assert_eq!(out.n, 5);
        // The next window starts at the `{` of the second document.
        assert_eq!(out.window_consumed, 8);
    }

    #[test]
    fn partial_mode_rejects_oversized_document() {
        let padded = PaddedString::from(r#"{"a": [1, 2, 3"#);
        let mut out = StructuralIndex::default();
        assert_eq!(
            index(
                padded.padded_bytes(),
                padded.len(),
                Stage1Mode::StreamingPartial,
                &mut out,
            ),
            Err(Error::Capacity)
        );
    }

    #[test]
    fn partial_mode_with_unclosed_string_drops_the_quote() {
        let stream = br#"{"a":1} {"trunca"#;
        let padded = PaddedString::from_bytes(stream);
        let mut out = StructuralIndex::default();
        index(
            padded.padded_bytes(),
            padded.len(),
            Stage1Mode::StreamingPartial,
            &mut out,
        )
        .unwrap();
        assert_eq!(out.n, 5);
        assert_eq!(out.window_consumed, 8);
    }

    #[test]
    fn final_mode_accounts_truncated_bytes() {
        let stream = br#"{"a":1} {"b""#;
        let padded = PaddedString::from_bytes(stream);
        let mut out = StructuralIndex::default();
        index(
            padded.padded_bytes(),
            padded.len(),
            Stage1Mode::StreamingFinal,
            &mut out,
        )
        .unwrap();
        assert_eq!(out.n, 5);
        assert_eq!(out.truncated_bytes, stream.len() - 8);
    }

    #[test]
    fn cursor_walks_in_order() {
        let padded = PaddedString::from("[10,20]");
        let mut out = StructuralIndex::default();
        index(padded.padded_bytes(), padded.len(), Stage1Mode::Single, &mut out).unwrap();
        let mut seen = Vec::new();
        while let Some(offset) = out.advance() {
            seen.push(offset);
        }
        assert_eq!(seen, vec![0, 1, 3, 4, 6]);
        assert!(out.is_exhausted());
    }
}
