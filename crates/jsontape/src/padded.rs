//! Input buffers with the readable-padding contract.
//!
//! The block kernels read the input 64 bytes at a time and may touch up to
//! [`PADDING`] bytes past the logical end of the document. [`PaddedString`]
//! owns a buffer allocated with that slack; [`PaddedStringView`] wraps a
//! caller-supplied buffer and merely checks that the slack exists.

use std::{fs::File, io::Read, path::Path};

use crate::error::{Error, Result};

/// Number of readable bytes required past the logical end of the input.
pub const PADDING: usize = 64;

/// An owned JSON input buffer with [`PADDING`] readable (zeroed) bytes past
/// its logical length.
///
/// ```
/// use jsontape::PaddedString;
///
/// let json = PaddedString::from(r#"{"a":1}"#);
/// assert_eq!(json.len(), 7);
/// assert!(json.padded_bytes().len() >= json.len() + jsontape::PADDING);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddedString {
    buf: Vec<u8>,
    len: usize,
}

impl PaddedString {
    /// Copies `bytes` into a freshly padded buffer.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(bytes.len() + PADDING);
        buf.extend_from_slice(bytes);
        buf.resize(bytes.len() + PADDING, 0);
        Self {
            buf,
            len: bytes.len(),
        }
    }

    /// Reads a whole file, allocating the padding up front.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] when the file cannot be opened or read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut buf = Vec::with_capacity(hint + PADDING);
        file.read_to_end(&mut buf)?;
        let len = buf.len();
        buf.resize(len + PADDING, 0);
        Ok(Self { buf, len })
    }

    /// Logical length of the document, excluding padding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the document is zero bytes long.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The document bytes without padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The document bytes including the trailing padding.
    #[must_use]
    pub fn padded_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Borrows this buffer as a checked view.
    #[must_use]
    pub fn as_view(&self) -> PaddedStringView<'_> {
        PaddedStringView {
            buf: &self.buf,
            len: self.len,
        }
    }
}

impl From<&str> for PaddedString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<&[u8]> for PaddedString {
    fn from(b: &[u8]) -> Self {
        Self::from_bytes(b)
    }
}

impl From<String> for PaddedString {
    fn from(s: String) -> Self {
        let len = s.len();
        let mut buf = s.into_bytes();
        buf.resize(len + PADDING, 0);
        Self { buf, len }
    }
}

impl From<Vec<u8>> for PaddedString {
    fn from(mut buf: Vec<u8>) -> Self {
        let len = buf.len();
        buf.resize(len + PADDING, 0);
        Self { buf, len }
    }
}

/// A borrowed input buffer whose owner promises [`PADDING`] readable bytes
/// past the logical length.
///
/// Unlike [`PaddedString`] this never copies; the checked constructor is the
/// only guard, so the promise is the caller's to keep. The padding bytes
/// should be NUL or whitespace: the scalar decoders read the byte after a
/// token to know where it ends, so a digit sitting in the padding would glue
/// itself onto a number that touches the buffer edge.
#[derive(Debug, Clone, Copy)]
pub struct PaddedStringView<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> PaddedStringView<'a> {
    /// Wraps `buf`, treating the first `len` bytes as the document.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientPadding`] unless `buf` extends at least
    /// [`PADDING`] bytes past `len`.
    pub fn new(buf: &'a [u8], len: usize) -> Result<Self> {
        if buf.len() < len || buf.len() - len < PADDING {
            return Err(Error::InsufficientPadding);
        }
        Ok(Self { buf, len })
    }

    /// Logical length of the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the document is zero bytes long.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The document bytes without padding.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buf[..self.len]
    }

    /// The document bytes including the trailing padding.
    #[must_use]
    pub fn padded_bytes(&self) -> &'a [u8] {
        self.buf
    }
}
