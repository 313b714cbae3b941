//! Error codes shared by every fallible operation in the crate.
//!
//! The numeric code of each variant is stable: it is part of the public
//! contract and reporting tools may persist it. `Ok(())` plays the role of
//! code 0 (success), so the enum itself starts at 1.

use thiserror::Error;

/// Total number of error codes, counting code 0 (success).
pub const NUM_ERROR_CODES: u8 = 30;

/// Every way a parse or a lookup can fail.
///
/// Variants carry no payload so that `Result<T, Error>` stays word-sized and
/// copyable; the human-readable message for each code is the `Display`
/// rendering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[non_exhaustive]
pub enum Error {
    /// The document exceeds what this parser is configured to allocate for.
    #[error("this parser cannot support a document that big")]
    Capacity = 1,
    /// An allocation failed while growing a parser buffer.
    #[error("error allocating memory, we are most likely out of memory")]
    MemAlloc = 2,
    /// The document has an improper structure: missing or superfluous commas,
    /// braces, missing keys and so forth.
    #[error("the JSON document has an improper structure")]
    TapeError = 3,
    /// Nesting went past the configured maximum depth.
    #[error("the JSON document was too deep (too many nested objects and arrays)")]
    DepthError = 4,
    /// A string could not be decoded (bad escape, lone surrogate, ...).
    #[error("problem while parsing a string")]
    StringError = 5,
    /// A scalar starting with `t` was not the literal `true`.
    #[error("problem while parsing an atom starting with the letter 't'")]
    TAtomError = 6,
    /// A scalar starting with `f` was not the literal `false`.
    #[error("problem while parsing an atom starting with the letter 'f'")]
    FAtomError = 7,
    /// A scalar starting with `n` was not the literal `null`.
    #[error("problem while parsing an atom starting with the letter 'n'")]
    NAtomError = 8,
    /// A number does not match the JSON grammar.
    #[error("problem while parsing a number")]
    NumberError = 9,
    /// The input is not valid UTF-8.
    #[error("the input is not valid UTF-8")]
    Utf8Error = 10,
    /// The value was never initialized by a successful parse.
    #[error("uninitialized")]
    Uninitialized = 11,
    /// No JSON value found in the input (or the current stream window).
    #[error("empty: no JSON found")]
    Empty = 12,
    /// A control character appeared unescaped inside a string.
    #[error("within strings, some characters must be escaped, we found unescaped characters")]
    UnescapedChars = 13,
    /// A string was opened but never closed.
    #[error("a string is opened, but never closed")]
    UnclosedString = 14,
    /// No kernel is available for this CPU architecture.
    #[error("no parser kernel is supported by this CPU architecture")]
    UnsupportedArchitecture = 15,
    /// The element does not have the requested type.
    #[error("the JSON element does not have the requested type")]
    IncorrectType = 16,
    /// The number is too large or too small to fit in the requested type.
    #[error("the JSON number is too large or too small to fit within the requested type")]
    NumberOutOfRange = 17,
    /// An array index was past the end of the array.
    #[error("attempted to access an element of a JSON array that is beyond its length")]
    IndexOutOfBounds = 18,
    /// The requested field does not exist in this object.
    #[error("the JSON field referenced does not exist in this object")]
    NoSuchField = 19,
    /// Reading the input file failed.
    #[error("error reading the file")]
    IoError = 20,
    /// A JSON pointer was syntactically invalid.
    #[error("invalid JSON pointer syntax")]
    InvalidJsonPointer = 21,
    /// A URI fragment was syntactically invalid.
    #[error("invalid URI fragment syntax")]
    InvalidUriFragment = 22,
    /// An error that indicates a bug in the library rather than in the input.
    #[error("unexpected error, consider reporting this problem as you may have found a bug")]
    UnexpectedError = 23,
    /// A new document was requested while another one is still borrowed.
    #[error("cannot parse a new document while a document is still in use")]
    ParserInUse = 24,
    /// Objects and arrays can only be iterated when they are first
    /// encountered; this handle is stale.
    #[error("objects and arrays can only be iterated when they are first encountered")]
    OutOfOrderIteration = 25,
    /// The input buffer does not carry the required readable padding.
    #[error("insufficient padding in the input buffer")]
    InsufficientPadding = 26,
    /// The document ended in the middle of an object or array.
    #[error("the JSON document ended early in the middle of an object or array")]
    IncompleteArrayOrObject = 27,
    /// A scalar document was accessed as if it were a container value.
    #[error("a JSON document made of a scalar (number, string, true, false, null) is treated as a value")]
    ScalarDocumentAsValue = 28,
    /// An access went outside the bounds of the document.
    #[error("attempted to access a location outside of the document")]
    OutOfBounds = 29,
}

impl Error {
    /// The stable numeric code of this error.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Recovers an error from its stable code. Code 0 (success) and anything
    /// at or past [`NUM_ERROR_CODES`] yield `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Capacity,
            2 => Self::MemAlloc,
            3 => Self::TapeError,
            4 => Self::DepthError,
            5 => Self::StringError,
            6 => Self::TAtomError,
            7 => Self::FAtomError,
            8 => Self::NAtomError,
            9 => Self::NumberError,
            10 => Self::Utf8Error,
            11 => Self::Uninitialized,
            12 => Self::Empty,
            13 => Self::UnescapedChars,
            14 => Self::UnclosedString,
            15 => Self::UnsupportedArchitecture,
            16 => Self::IncorrectType,
            17 => Self::NumberOutOfRange,
            18 => Self::IndexOutOfBounds,
            19 => Self::NoSuchField,
            20 => Self::IoError,
            21 => Self::InvalidJsonPointer,
            22 => Self::InvalidUriFragment,
            23 => Self::UnexpectedError,
            24 => Self::ParserInUse,
            25 => Self::OutOfOrderIteration,
            26 => Self::InsufficientPadding,
            27 => Self::IncompleteArrayOrObject,
            28 => Self::ScalarDocumentAsValue,
            29 => Self::OutOfBounds,
            _ => return None,
        })
    }

    /// Message lookup by code, including code 0.
    #[must_use]
    pub fn message_for_code(code: u8) -> String {
        if code == 0 {
            return "no error".to_owned();
        }
        match Self::from_code(code) {
            Some(err) => err.to_string(),
            None => "unknown error code".to_owned(),
        }
    }

    /// `true` for errors that invalidate the whole document rather than a
    /// single lookup.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::TapeError | Self::IncompleteArrayOrObject)
    }
}

impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Self::IoError
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{Error, NUM_ERROR_CODES};

    #[test]
    fn codes_round_trip() {
        for code in 1..NUM_ERROR_CODES {
            let err = Error::from_code(code).expect("code within range");
            assert_eq!(err.code(), code);
        }
        assert_eq!(Error::from_code(0), None);
        assert_eq!(Error::from_code(NUM_ERROR_CODES), None);
    }

    #[test]
    fn messages_match_display() {
        for code in 1..NUM_ERROR_CODES {
            let err = Error::from_code(code).expect("code within range");
            assert_eq!(err.to_string(), Error::message_for_code(code));
        }
        assert_eq!(Error::message_for_code(0), "no error");
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::TapeError.is_fatal());
        assert!(Error::IncompleteArrayOrObject.is_fatal());
        assert!(!Error::NoSuchField.is_fatal());
    }
}
