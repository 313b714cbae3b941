//! NEON kernel: four 16-byte lanes per block.
//!
//! AArch64 has no movemask instruction; lane masks are collapsed into a
//! 64-bit mask by AND-ing each lane with positional bit weights and folding
//! with three pairwise adds.

use core::arch::aarch64::{
    uint8x16_t, vandq_u8, vceqq_u8, vcgeq_u8, vcltq_u8, vdupq_n_u8, vgetq_lane_u64, vld1q_u8,
    vorrq_u8, vpaddq_u8, vreinterpretq_u64_u8,
};

use super::ClassifiedBlock;

pub(super) fn classify(block: &[u8; 64]) -> ClassifiedBlock {
    // SAFETY: NEON is baseline on aarch64.
    unsafe { classify_neon(block) }
}

#[target_feature(enable = "neon")]
unsafe fn classify_neon(block: &[u8; 64]) -> ClassifiedBlock {
    // SAFETY: `block` is 64 readable bytes.
    let v: [uint8x16_t; 4] = unsafe {
        [
            vld1q_u8(block.as_ptr()),
            vld1q_u8(block.as_ptr().add(16)),
            vld1q_u8(block.as_ptr().add(32)),
            vld1q_u8(block.as_ptr().add(48)),
        ]
    };

    let backslash = eq_mask(&v, b'\\');
    let raw_quote = eq_mask(&v, b'"');
    let whitespace = eq_mask(&v, b' ') | eq_mask(&v, b'\t') | eq_mask(&v, b'\n') | eq_mask(&v, b'\r');

    let twenty = vdupq_n_u8(0x20);
    let curled = [
        vorrq_u8(v[0], twenty),
        vorrq_u8(v[1], twenty),
        vorrq_u8(v[2], twenty),
        vorrq_u8(v[3], twenty),
    ];
    let op = eq_mask(&curled, b'{') | eq_mask(&curled, b'}') | eq_mask(&v, b':') | eq_mask(&v, b',');

    let space = vdupq_n_u8(0x20);
    let ctrl = to_bitmask([
        vcltq_u8(v[0], space),
        vcltq_u8(v[1], space),
        vcltq_u8(v[2], space),
        vcltq_u8(v[3], space),
    ]);

    let high = vdupq_n_u8(0x80);
    let non_ascii = to_bitmask([
        vcgeq_u8(v[0], high),
        vcgeq_u8(v[1], high),
        vcgeq_u8(v[2], high),
        vcgeq_u8(v[3], high),
    ]);

    ClassifiedBlock {
        backslash,
        raw_quote,
        op,
        whitespace,
        ctrl,
        non_ascii,
    }
}

#[target_feature(enable = "neon")]
fn eq_mask(lanes: &[uint8x16_t; 4], byte: u8) -> u64 {
    let needle = vdupq_n_u8(byte);
    to_bitmask([
        vceqq_u8(lanes[0], needle),
        vceqq_u8(lanes[1], needle),
        vceqq_u8(lanes[2], needle),
        vceqq_u8(lanes[3], needle),
    ])
}

#[target_feature(enable = "neon")]
fn to_bitmask(lanes: [uint8x16_t; 4]) -> u64 {
    const BIT_WEIGHTS: [u8; 16] = [
        0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40,
        0x80,
    ];
    // SAFETY: BIT_WEIGHTS is 16 readable bytes.
    let weights = unsafe { vld1q_u8(BIT_WEIGHTS.as_ptr()) };
    let sum0 = vpaddq_u8(vandq_u8(lanes[0], weights), vandq_u8(lanes[1], weights));
    let sum1 = vpaddq_u8(vandq_u8(lanes[2], weights), vandq_u8(lanes[3], weights));
    let sum = vpaddq_u8(sum0, sum1);
    let sum = vpaddq_u8(sum, sum);
    vgetq_lane_u64::<0>(vreinterpretq_u64_u8(sum))
}
