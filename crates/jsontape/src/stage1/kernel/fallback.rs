//! Scalar kernel: one branch-free pass per byte.
//!
//! This is the portable reference the vector kernels are tested against, and
//! the backend of last resort on architectures without a SIMD kernel.

use super::ClassifiedBlock;

pub(super) fn classify(block: &[u8; 64]) -> ClassifiedBlock {
    let mut c = ClassifiedBlock::default();
    for (i, &b) in block.iter().enumerate() {
        let bit = 1u64 << i;
        c.backslash |= u64::from(b == b'\\') * bit;
        c.raw_quote |= u64::from(b == b'"') * bit;
        c.op |= u64::from(matches!(b, b'{' | b'}' | b'[' | b']' | b':' | b',')) * bit;
        c.whitespace |= u64::from(matches!(b, b' ' | b'\t' | b'\n' | b'\r')) * bit;
        c.ctrl |= u64::from(b < 0x20) * bit;
        c.non_ascii |= u64::from(b >= 0x80) * bit;
    }
    c
}
