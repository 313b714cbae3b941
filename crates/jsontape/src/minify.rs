//! Whitespace-stripping minifier.
//!
//! The one JSON-producing utility in the crate: drops insignificant
//! whitespace while copying string literals byte-for-byte. It does not
//! validate grammar beyond string termination, so it can shrink documents
//! the parser proper would reject.

use crate::error::Result;
use crate::strings::raw_string_end;

/// Returns `input` minus all whitespace outside string literals.
///
/// # Errors
///
/// `UnclosedString` when a string literal never terminates.
pub fn minify(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'"' => {
                let end = raw_string_end(input, i)?;
                out.extend_from_slice(&input[i..=end]);
                i = end + 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::minify;
    use crate::error::Error;

    #[test]
    fn strips_whitespace_outside_strings() {
        assert_eq!(
            minify(b" { \"a\" : [ 1 , 2 ] } \n").unwrap(),
            b"{\"a\":[1,2]}"
        );
    }

    #[test]
    fn preserves_string_bodies() {
        assert_eq!(
            minify(br#"{ "a b" : " c\t d " }"#).unwrap(),
            br#"{"a b":" c\t d "}"#
        );
        // Escaped quotes do not end the literal.
        assert_eq!(minify(br#"[" \" x "]"#).unwrap(), br#"[" \" x "]"#);
    }

    #[test]
    fn reports_unclosed_strings() {
        assert_eq!(minify(br#"{"a": "unclosed"#).unwrap_err(), Error::UnclosedString);
    }

    #[test]
    fn already_minified_input_is_unchanged() {
        let json = br#"{"a":[1,2,3],"b":{"c":"d"}}"#;
        assert_eq!(minify(json).unwrap(), json);
    }
}
