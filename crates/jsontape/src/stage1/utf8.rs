//! Streaming UTF-8 validation.
//!
//! The kernels flag blocks containing non-ASCII bytes; only those blocks (and
//! any block entered mid-sequence) are run through this table-driven
//! automaton. The automaton rejects overlong encodings, surrogate halves and
//! code points above U+10FFFF, and its state survives block boundaries so
//! multi-byte sequences may straddle them.

/// The accepting state. The validator must end here once the input runs out,
/// otherwise the final sequence was truncated.
pub(crate) const ACCEPT: u8 = 0;
const REJECT: u8 = 12;

/// Maps each byte to one of twelve character classes.
const CLASS: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut b = 0x80;
    while b <= 0x8F {
        t[b] = 1;
        b += 1;
    }
    while b <= 0x9F {
        t[b] = 9;
        b += 1;
    }
    while b <= 0xBF {
        t[b] = 7;
        b += 1;
    }
    t[0xC0] = 8;
    t[0xC1] = 8;
    b = 0xC2;
    while b <= 0xDF {
        t[b] = 2;
        b += 1;
    }
    t[0xE0] = 10;
    b = 0xE1;
    while b <= 0xEC {
        t[b] = 3;
        b += 1;
    }
    t[0xED] = 4;
    t[0xEE] = 3;
    t[0xEF] = 3;
    t[0xF0] = 11;
    b = 0xF1;
    while b <= 0xF3 {
        t[b] = 6;
        b += 1;
    }
    t[0xF4] = 5;
    b = 0xF5;
    while b <= 0xFF {
        t[b] = 8;
        b += 1;
    }
    t
};

/// State-transition table, indexed by `state + class`. States are
/// premultiplied by 12: 0 accept, 12 reject, then one state per pending
/// continuation pattern (lead byte determines which continuation ranges are
/// legal, which is how overlong forms and surrogates get caught).
#[rustfmt::skip]
const TRANSITION: [u8; 108] = [
    // class:  0   1   2   3   4   5   6   7   8   9  10  11
    /*  0 */   0, 12, 24, 36, 60, 96, 84, 12, 12, 12, 48, 72,
    /* 12 */  12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12,
    /* 24 */  12,  0, 12, 12, 12, 12, 12,  0, 12,  0, 12, 12,
    /* 36 */  12, 24, 12, 12, 12, 12, 12, 24, 12, 24, 12, 12,
    /* 48 */  12, 12, 12, 12, 12, 12, 12, 24, 12, 12, 12, 12,
    /* 60 */  12, 24, 12, 12, 12, 12, 12, 12, 12, 24, 12, 12,
    /* 72 */  12, 12, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12,
    /* 84 */  12, 36, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12,
    /* 96 */  12, 36, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12,
];

/// Incremental validator: feed byte slices in order, then check [`finish`].
///
/// [`finish`]: Utf8Validator::finish
#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf8Validator {
    state: u8,
}

impl Default for Utf8Validator {
    fn default() -> Self {
        Self { state: ACCEPT }
    }
}

impl Utf8Validator {
    /// Runs the automaton over `bytes`. Once rejected it stays rejected.
    #[inline]
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        let mut state = self.state;
        for &b in bytes {
            state = TRANSITION[(state + CLASS[b as usize]) as usize];
        }
        self.state = state;
    }

    /// `true` while no invalid sequence has been seen.
    #[inline]
    pub(crate) fn is_ok(&self) -> bool {
        self.state != REJECT
    }

    /// `true` when the automaton is mid-sequence and must see more input.
    #[inline]
    pub(crate) fn in_flight(&self) -> bool {
        self.state != ACCEPT && self.state != REJECT
    }

    /// Final verdict: valid iff nothing was rejected and no sequence is left
    /// dangling.
    #[inline]
    pub(crate) fn finish(&self) -> bool {
        self.state == ACCEPT
    }
}

#[cfg(test)]
mod tests {
    use super::Utf8Validator;

    fn validate(bytes: &[u8]) -> bool {
        let mut v = Utf8Validator::default();
        v.update(bytes);
        v.finish()
    }

    #[test]
    fn agrees_with_std_on_interesting_inputs() {
        let cases: &[&[u8]] = &[
            b"plain ascii",
            "héllo wörld".as_bytes(),
            "\u{10FFFF}".as_bytes(),
            "\u{FFFD}\u{0800}\u{07FF}".as_bytes(),
            &[0xC0, 0xAF],             // overlong '/'
            &[0xE0, 0x80, 0x80],       // overlong NUL
            &[0xED, 0xA0, 0x80],       // high surrogate
            &[0xED, 0xBF, 0xBF],       // low surrogate
            &[0xF4, 0x90, 0x80, 0x80], // U+110000
            &[0xF5, 0x80, 0x80, 0x80],
            &[0x80],
            &[0xC2],       // truncated two-byte
            &[0xE2, 0x82], // truncated three-byte
            &[0xFF],
        ];
        for &case in cases {
            assert_eq!(
                validate(case),
                std::str::from_utf8(case).is_ok(),
                "case {case:x?}"
            );
        }
    }

    #[test]
    fn sequences_may_straddle_updates() {
        let text = "日本語".as_bytes();
        for split in 0..=text.len() {
            let mut v = Utf8Validator::default();
            v.update(&text[..split]);
            v.update(&text[split..]);
            assert!(v.finish(), "split at {split}");
        }
    }

    #[test]
    fn exhaustive_two_byte_prefixes() {
        for b0 in 0u8..=255 {
            for b1 in [0x20u8, 0x80, 0xA0, 0xBF, 0xC0] {
                let case = [b0, b1];
                assert_eq!(
                    validate(&case),
                    std::str::from_utf8(&case).is_ok(),
                    "case {case:x?}"
                );
            }
        }
    }
}
