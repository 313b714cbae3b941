//! Block classification kernels.
//!
//! A kernel reduces one 64-byte block to six bitmasks; everything downstream
//! (escape tracking, string parity, structural extraction) is shared bit
//! arithmetic. The active kernel is chosen once per process from runtime CPU
//! capabilities; the scalar [`fallback`] is always available and doubles as
//! the correctness oracle for the vector kernels.

use std::sync::OnceLock;

mod fallback;

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod sse2;

#[cfg(target_arch = "aarch64")]
mod neon;

/// Per-class bitmasks for one 64-byte block; bit i describes byte i.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ClassifiedBlock {
    /// `\`
    pub backslash: u64,
    /// `"` (escaped or not; escape resolution happens downstream)
    pub raw_quote: u64,
    /// `{` `}` `[` `]` `:` `,`
    pub op: u64,
    /// space, tab, line feed, carriage return
    pub whitespace: u64,
    /// bytes below 0x20
    pub ctrl: u64,
    /// bytes at or above 0x80
    pub non_ascii: u64,
}

/// One selectable backend.
pub(crate) struct Implementation {
    pub name: &'static str,
    pub classify: fn(&[u8; 64]) -> ClassifiedBlock,
}

static FALLBACK: Implementation = Implementation {
    name: "fallback",
    classify: fallback::classify,
};

#[cfg(target_arch = "x86_64")]
static AVX2: Implementation = Implementation {
    name: "avx2",
    classify: avx2::classify,
};

#[cfg(target_arch = "x86_64")]
static SSE2: Implementation = Implementation {
    name: "sse2",
    classify: sse2::classify,
};

#[cfg(target_arch = "aarch64")]
static NEON: Implementation = Implementation {
    name: "neon",
    classify: neon::classify,
};

fn detect() -> &'static Implementation {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            return &AVX2;
        }
        if std::arch::is_x86_feature_detected!("sse2") {
            return &SSE2;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        return &NEON;
    }
    #[allow(unreachable_code)]
    &FALLBACK
}

/// The kernel this process runs on. Selected on first use, then fixed.
pub(crate) fn active() -> &'static Implementation {
    static ACTIVE: OnceLock<&'static Implementation> = OnceLock::new();
    ACTIVE.get_or_init(detect)
}

/// The always-available scalar kernel, kept reachable for differential tests.
#[cfg(test)]
pub(crate) fn scalar() -> &'static Implementation {
    &FALLBACK
}

#[cfg(test)]
mod tests {
    use super::{active, scalar};

    // Cheap deterministic byte stream; no RNG dependency needed for coverage
    // of the classifier, which only looks at individual byte values.
    fn xorshift_blocks(seed: u64, n: usize) -> Vec<[u8; 64]> {
        let mut state = seed;
        let mut blocks = Vec::with_capacity(n);
        for _ in 0..n {
            let mut block = [0u8; 64];
            for chunk in block.chunks_mut(8) {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                chunk.copy_from_slice(&state.to_le_bytes());
            }
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn active_kernel_matches_scalar_oracle() {
        let oracle = scalar();
        let kernel = active();
        for block in xorshift_blocks(0x9E37_79B9_7F4A_7C15, 256) {
            assert_eq!(
                (kernel.classify)(&block),
                (oracle.classify)(&block),
                "kernel {} diverged on {block:?}",
                kernel.name
            );
        }
    }

    #[test]
    fn dense_json_block_classification() {
        let mut block = [b' '; 64];
        block[..14].copy_from_slice(br#"{"a\"b": [1] }"#);
        let c = (scalar().classify)(&block);
        assert_eq!(c.op & 0b11, 0b1, "only the brace at offset 0 in low bits");
        assert_ne!(c.raw_quote & (1 << 1), 0);
        assert_ne!(c.backslash & (1 << 3), 0);
        assert_ne!(c.raw_quote & (1 << 4), 0, "escaped quote is still raw");
        assert_ne!(c.op & (1 << 7), 0, "colon");
        assert_ne!(c.whitespace & (1 << 8), 0);
        assert_eq!(c.ctrl, 0);
        assert_eq!(c.non_ascii, 0);
    }
}
