//! JSON number decoding.
//!
//! Integers without fraction or exponent come back as `i64` when they fit,
//! then `u64` for the unsigned overflow range, then `f64`. Anything with a
//! fraction or exponent is a double, rounded to nearest-even: a fast path
//! covers significands that fit 53 bits with small decimal exponents (exact
//! power-of-ten float arithmetic, provably correctly rounded), and everything
//! else goes through the standard library's correctly-rounded conversion.

use crate::error::{Error, Result};
use crate::tables::is_structural_or_whitespace;

/// A decoded JSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Fits a signed 64-bit integer.
    I64(i64),
    /// Exceeds `i64::MAX` but fits unsigned.
    U64(u64),
    /// Everything else.
    F64(f64),
}

/// Exact `f64` powers of ten. `10^22` is the largest exactly representable.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Decodes the number starting at `src[at]`. The buffer must be padded so
/// reading the terminator byte is always in bounds.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// `NumberError` for grammar violations, `NumberOutOfRange` when a double
/// overflows to infinity.
pub(crate) fn parse_number(src: &[u8], at: usize) -> Result<(Number, usize)> {
    let mut i = at;
    let negative = src[i] == b'-';
    if negative {
        i += 1;
    }

    let digits_start = i;
    if src[i] == b'0' {
        i += 1;
        if src[i].is_ascii_digit() {
            // 0 cannot be followed by more digits.
            return Err(Error::NumberError);
        }
    } else {
        if !src[i].is_ascii_digit() {
            // A sign with no digits, or a stray '+'/'.': not a number.
            return Err(Error::NumberError);
        }
        while src[i].is_ascii_digit() {
            i += 1;
        }
    }
    let int_digits = i - digits_start;

    let mut has_fraction = false;
    let mut fraction_digits = 0usize;
    if src[i] == b'.' {
        has_fraction = true;
        i += 1;
        let fraction_start = i;
        while src[i].is_ascii_digit() {
            i += 1;
        }
        fraction_digits = i - fraction_start;
        if fraction_digits == 0 {
            return Err(Error::NumberError);
        }
    }

    let mut has_exponent = false;
    let mut exp_value = 0i64;
    let mut exp_negative = false;
    if src[i] == b'e' || src[i] == b'E' {
        has_exponent = true;
        i += 1;
        if src[i] == b'+' {
            i += 1;
        } else if src[i] == b'-' {
            exp_negative = true;
            i += 1;
        }
        let exp_start = i;
        while src[i].is_ascii_digit() {
            // Saturate: an exponent this large overflows or underflows
            // regardless of further digits.
            exp_value = (exp_value * 10 + i64::from(src[i] - b'0')).min(1_000_000);
            i += 1;
        }
        if i == exp_start {
            return Err(Error::NumberError);
        }
    }

    if !is_structural_or_whitespace(src[i]) {
        return Err(Error::NumberError);
    }
    let consumed = i - at;

    if !has_fraction && !has_exponent {
        return integer_value(src, digits_start, int_digits, negative).map(|n| (n, consumed));
    }

    // Collect up to 19 significant digits; beyond that the fast path cannot
    // prove the rounding and the slow path re-reads the text anyway.
    let mut mantissa = 0u64;
    let mut mantissa_digits = 0usize;
    let mut truncated = false;
    for &b in &src[digits_start..digits_start + int_digits] {
        if mantissa_digits < 19 {
            mantissa = mantissa * 10 + u64::from(b - b'0');
            mantissa_digits += 1;
        } else {
            truncated = true;
        }
    }
    let mut exp10 = if exp_negative { -exp_value } else { exp_value };
    if has_fraction {
        let fraction_start = digits_start + int_digits + 1;
        let mut used = 0usize;
        for &b in &src[fraction_start..fraction_start + fraction_digits] {
            if mantissa_digits < 19 {
                mantissa = mantissa * 10 + u64::from(b - b'0');
                mantissa_digits += 1;
                used += 1;
            } else {
                truncated = true;
            }
        }
        exp10 -= used as i64;
    }

    let value = if !truncated && mantissa < (1u64 << 53) && (-22..=22).contains(&exp10) {
        // Both the mantissa and the power of ten are exact doubles, so one
        // multiply or divide rounds correctly by IEEE semantics.
        let m = mantissa as f64;
        let f = if exp10 >= 0 {
            m * POW10[exp10 as usize]
        } else {
            m / POW10[(-exp10) as usize]
        };
        if negative { -f } else { f }
    } else {
        slow_path(&src[at..at + consumed])?
    };

    if value.is_infinite() {
        return Err(Error::NumberOutOfRange);
    }
    Ok((Number::F64(value), consumed))
}

fn integer_value(src: &[u8], digits_start: usize, int_digits: usize, negative: bool) -> Result<Number> {
    if int_digits > 20 {
        // Magnitude beyond u64: fall back to a (lossy) double.
        return slow_path(&src[digits_start - usize::from(negative)..digits_start + int_digits])
            .map(Number::F64);
    }
    let mut magnitude = 0u64;
    for &b in &src[digits_start..digits_start + int_digits] {
        let digit = u64::from(b - b'0');
        magnitude = match magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add(digit))
        {
            Some(m) => m,
            None => {
                return slow_path(
                    &src[digits_start - usize::from(negative)..digits_start + int_digits],
                )
                .map(Number::F64);
            }
        };
    }
    if negative {
        // -(2^63) is representable; anything larger in magnitude is not.
        if magnitude > (1u64 << 63) {
            return Ok(Number::F64(-(magnitude as f64)));
        }
        return Ok(Number::I64(magnitude.wrapping_neg() as i64));
    }
    if magnitude <= i64::MAX as u64 {
        return Ok(Number::I64(magnitude as i64));
    }
    Ok(Number::U64(magnitude))
}

fn slow_path(text: &[u8]) -> Result<f64> {
    // The grammar walk above only admits ASCII, so this cannot fail.
    let text = std::str::from_utf8(text).map_err(|_| Error::NumberError)?;
    text.parse::<f64>().map_err(|_| Error::NumberError)
}
