//! AVX2 kernel: two 32-byte lanes per block.
//!
//! Structural characters are matched with four byte compares after folding
//! `[` and `]` onto `{` and `}` with `| 0x20`; whitespace takes four compares;
//! control bytes come from an unsigned-max trick and the non-ASCII mask falls
//! out of the sign-bit movemask for free.

use core::arch::x86_64::{
    __m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_max_epu8, _mm256_movemask_epi8,
    _mm256_or_si256, _mm256_set1_epi8,
};

use super::ClassifiedBlock;

pub(super) fn classify(block: &[u8; 64]) -> ClassifiedBlock {
    // SAFETY: this entry point is only ever installed after
    // `is_x86_feature_detected!("avx2")` succeeded.
    unsafe { classify_avx2(block) }
}

#[target_feature(enable = "avx2")]
unsafe fn classify_avx2(block: &[u8; 64]) -> ClassifiedBlock {
    // SAFETY: `block` is 64 readable bytes; loadu has no alignment demands.
    let (lo, hi) = unsafe {
        (
            _mm256_loadu_si256(block.as_ptr().cast()),
            _mm256_loadu_si256(block.as_ptr().add(32).cast()),
        )
    };

    let backslash = eq_mask(lo, hi, b'\\');
    let raw_quote = eq_mask(lo, hi, b'"');
    let whitespace =
        eq_mask(lo, hi, b' ') | eq_mask(lo, hi, b'\t') | eq_mask(lo, hi, b'\n') | eq_mask(lo, hi, b'\r');

    // `| 0x20` folds 0x5B/0x5D onto 0x7B/0x7D so braces and brackets share a
    // compare; colon and comma are matched on the raw lanes.
    let curl_lo = _mm256_or_si256(lo, _mm256_set1_epi8(0x20));
    let curl_hi = _mm256_or_si256(hi, _mm256_set1_epi8(0x20));
    let op = eq_mask(curl_lo, curl_hi, b'{')
        | eq_mask(curl_lo, curl_hi, b'}')
        | eq_mask(lo, hi, b':')
        | eq_mask(lo, hi, b',');

    // max(v, 0x1F) == 0x1F exactly when v <= 0x1F.
    let cap = _mm256_set1_epi8(0x1F);
    let ctrl_lo = _mm256_cmpeq_epi8(_mm256_max_epu8(lo, cap), cap);
    let ctrl_hi = _mm256_cmpeq_epi8(_mm256_max_epu8(hi, cap), cap);
    let ctrl = movemask2(ctrl_lo, ctrl_hi);

    let non_ascii = movemask2(lo, hi);

    ClassifiedBlock {
        backslash,
        raw_quote,
        op,
        whitespace,
        ctrl,
        non_ascii,
    }
}

#[target_feature(enable = "avx2")]
fn eq_mask(lo: __m256i, hi: __m256i, byte: u8) -> u64 {
    let needle = _mm256_set1_epi8(byte as i8);
    movemask2(
        _mm256_cmpeq_epi8(lo, needle),
        _mm256_cmpeq_epi8(hi, needle),
    )
}

#[target_feature(enable = "avx2")]
fn movemask2(lo: __m256i, hi: __m256i) -> u64 {
    let ml = _mm256_movemask_epi8(lo) as u32 as u64;
    let mh = _mm256_movemask_epi8(hi) as u32 as u64;
    ml | (mh << 32)
}
