//! The synthetic workloads measured by the demo programs.

use std::hint::black_box;
use std::sync::Once;

use tracing::warn;

/// Iterations of [`branchy_sum`] run by `perf-test`.
pub const DEFAULT_ITERATIONS: u32 = 1_000_000;

/// Elements summed by `perf-test2`.
pub const DEFAULT_ELEMENTS: usize = 1024 * 1024;

/// Sum `0..iterations`, doubling the running total every 1000th step.
///
/// The periodic branch is there to give the branch predictor something to
/// get wrong. Each intermediate value goes through `black_box` so the loop
/// is not folded into a constant.
pub fn branchy_sum(iterations: u32) -> i32 {
    let mut sum: i32 = 0;
    for i in 0..iterations {
        sum = black_box(sum.wrapping_add(i as i32));
        if i % 1000 == 0 {
            sum = black_box(sum.wrapping_mul(2));
        }
    }
    sum
}

const LANES_PER_LINE: usize = 16;

#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct CacheLine([i32; LANES_PER_LINE]);

/// A heap buffer of `i32` whose first element sits on a 64-byte boundary.
pub struct AlignedBuffer {
    lines: Vec<CacheLine>,
    len: usize,
}

impl AlignedBuffer {
    /// A buffer of `len` elements where element `i` is `f(i)`.
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> i32) -> Self {
        let mut lines = vec![CacheLine([0; LANES_PER_LINE]); len.div_ceil(LANES_PER_LINE)];
        for (i, slot) in lines.iter_mut().flat_map(|l| l.0.iter_mut()).take(len).enumerate() {
            *slot = f(i);
        }
        AlignedBuffer { lines, len }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The elements, starting on a 64-byte boundary.
    pub fn as_slice(&self) -> &[i32] {
        // CacheLine is exactly sixteen i32s with no padding, so the lines
        // form one contiguous i32 array.
        unsafe { std::slice::from_raw_parts(self.lines.as_ptr() as *const i32, self.len) }
    }
}

/// Sum every element of `buf` with wrapping arithmetic.
///
/// Uses AVX2 eight lanes at a time when the CPU supports it, otherwise a
/// plain loop. Both paths return the same value.
pub fn simd_sum(buf: &AlignedBuffer) -> i32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            // Checked above.
            return unsafe { avx2::sum(buf) };
        }
    }

    static NO_SIMD: Once = Once::new();
    NO_SIMD.call_once(|| warn!("AVX2 not available, using the scalar loop"));

    scalar_sum(buf.as_slice())
}

/// Wrapping sum of `data`, one element at a time.
pub fn scalar_sum(data: &[i32]) -> i32 {
    data.iter().fold(0i32, |acc, &x| acc.wrapping_add(x))
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::*;

    use super::{scalar_sum, AlignedBuffer, LANES_PER_LINE};

    // How far ahead of the load cursor to prefetch, in elements.
    const PREFETCH_AHEAD: usize = 4 * LANES_PER_LINE;

    #[target_feature(enable = "avx2")]
    pub unsafe fn sum(buf: &AlignedBuffer) -> i32 {
        let data = buf.as_slice();
        let base = data.as_ptr();
        let vectors = data.len() / 8;

        let mut acc = _mm256_setzero_si256();
        for v in 0..vectors {
            let offset = v * 8;
            if offset % LANES_PER_LINE == 0 {
                _mm_prefetch::<_MM_HINT_T0>(base.wrapping_add(offset + PREFETCH_AHEAD) as *const i8);
            }
            // 64-byte aligned base plus a multiple of 32 bytes.
            let chunk = _mm256_load_si256(base.add(offset) as *const __m256i);
            acc = _mm256_add_epi32(acc, chunk);
        }

        let mut lanes = [0i32; 8];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);

        scalar_sum(&lanes).wrapping_add(scalar_sum(&data[vectors * 8..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branchy_sum() {
        assert_eq!(branchy_sum(0), 0);
        assert_eq!(branchy_sum(3), 3);
        // 0..=999 sums to 499500, +1000 then doubled at i = 1000, then +1001
        assert_eq!(branchy_sum(1002), 1_002_001);
    }

    #[test]
    fn test_buffer_alignment() {
        let buf = AlignedBuffer::from_fn(37, |i| i as i32);
        assert_eq!(buf.as_slice().as_ptr() as usize % 64, 0);
        assert_eq!(buf.len(), 37);
        assert_eq!(buf.as_slice()[36], 36);
        assert!(AlignedBuffer::from_fn(0, |_| 1).is_empty());
    }

    #[test]
    fn test_simd_matches_scalar() {
        for len in [0, 7, 8, 37, 1000, 4099] {
            let buf = AlignedBuffer::from_fn(len, |i| (i as i32).wrapping_mul(7919) - 13);
            assert_eq!(simd_sum(&buf), scalar_sum(buf.as_slice()), "len {}", len);
        }
    }

    #[test]
    fn test_simd_sum_wraps() {
        let buf = AlignedBuffer::from_fn(DEFAULT_ELEMENTS, |_| i32::MAX);
        // 2^20 * (2^31 - 1) mod 2^32 == -(2^20) mod 2^32
        assert_eq!(simd_sum(&buf), -(1 << 20));
    }

    #[test]
    fn test_simd_sum_small() {
        let buf = AlignedBuffer::from_fn(37, |i| i as i32);
        assert_eq!(simd_sum(&buf), 666);
    }
}
