//
// Copyright (c) 2013, Intel Corporation
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//
// * Redistributions of source code must retain the above copyright
//       notice, this list of conditions and the following disclaimer.
// * Redistributions in binary form must reproduce the above
//       copyright notice, this list of conditions and the following
//       disclaimer in the documentation and/or other materials provided
//       with the distribution.
// * Neither the name of Intel Corporation nor the names of its
//       contributors may be used to endorse or promote products
//       derived from this software without specific prior written
//       permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS
// FOR A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE
// COPYRIGHT OWNER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT,
// INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING,
// BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES;
// LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT
// LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN
// ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE
// POSSIBILITY OF SUCH DAMAGE.

//! Cache-blocked kernels. Tiling the iteration space into fixed-size
//! sub-squares cuts cache-line traffic on the strided side of the
//! transpose from one miss per element to one per block column. Tile
//! bounds are clamped to the matrix edge; divisibility of the order by
//! the block size is never assumed.

use crate::matrix::Matrix;

/// Tile side for the transpose kernels. Two 32x32 f32 tiles fit in L1.
pub const TRANSPOSE_BLOCK: usize = 32;

/// Tile side for the blocked symmetry scan.
pub const SYMMETRY_BLOCK: usize = 16;

/// Blocked scalar transpose. Scalar body, same tiling as the SIMD path.
pub fn transpose_blocked(src: &Matrix, dst: &mut Matrix, block: usize) {
    assert!(block > 0);
    let n = src.order();
    assert_eq!(n, dst.order());
    for i0 in (0..n).step_by(block) {
        let i1 = usize::min(i0 + block, n);
        for j0 in (0..n).step_by(block) {
            let j1 = usize::min(j0 + block, n);
            for i in i0..i1 {
                for j in j0..j1 {
                    dst.set(j, i, src.get(i, j));
                }
            }
        }
    }
}

/// Blocked transpose with a vectorized tile body where the target
/// supports it, falling back to [`transpose_blocked`] elsewhere.
pub fn transpose_simd(src: &Matrix, dst: &mut Matrix, block: usize) {
    assert!(block > 0);
    let n = src.order();
    assert_eq!(n, dst.order());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("sse") {
            // Safe: feature presence checked above, buffers are n*n.
            unsafe { sse::transpose_tiles(src.as_slice(), dst.as_mut_slice(), n, block) };
            return;
        }
    }

    transpose_blocked(src, dst, block);
}

/// Symmetry check over 16x16 tiles, clamped at the edges. Covers the
/// whole matrix rather than one triangle so that symmetric and
/// asymmetric inputs cost the same.
pub fn check_symmetry_blocked(m: &Matrix, tolerance: f32) -> bool {
    let n = m.order();
    let mut sym = true;
    for i0 in (0..n).step_by(SYMMETRY_BLOCK) {
        let i1 = usize::min(i0 + SYMMETRY_BLOCK, n);
        for j0 in (0..n).step_by(SYMMETRY_BLOCK) {
            let j1 = usize::min(j0 + SYMMETRY_BLOCK, n);
            for i in i0..i1 {
                for j in j0..j1 {
                    sym &= (m.get(i, j) - m.get(j, i)).abs() <= tolerance;
                }
            }
        }
    }
    sym
}

#[cfg(target_arch = "x86_64")]
mod sse {
    use std::arch::x86_64::*;

    /// Tile body: four contiguous source floats per 128-bit load, four
    /// strided stores into the destination rows, and a prefetch of the
    /// next load address to hide the read latency.
    ///
    /// # Safety
    ///
    /// Caller must ensure the CPU supports SSE and that both slices
    /// hold `n * n` elements.
    #[target_feature(enable = "sse")]
    pub unsafe fn transpose_tiles(src: &[f32], dst: &mut [f32], n: usize, block: usize) {
        debug_assert_eq!(src.len(), n * n);
        debug_assert_eq!(dst.len(), n * n);
        for i0 in (0..n).step_by(block) {
            let i1 = usize::min(i0 + block, n);
            for j0 in (0..n).step_by(block) {
                let j1 = usize::min(j0 + block, n);
                for i in i0..i1 {
                    let row = src.as_ptr().add(i * n);
                    let mut j = j0;
                    while j + 4 <= j1 {
                        if j + 8 <= j1 {
                            _mm_prefetch::<_MM_HINT_T0>(row.add(j + 4) as *const i8);
                        }
                        let v = _mm_loadu_ps(row.add(j));
                        let mut lanes = [0.0f32; 4];
                        _mm_storeu_ps(lanes.as_mut_ptr(), v);
                        *dst.get_unchecked_mut(j * n + i) = lanes[0];
                        *dst.get_unchecked_mut((j + 1) * n + i) = lanes[1];
                        *dst.get_unchecked_mut((j + 2) * n + i) = lanes[2];
                        *dst.get_unchecked_mut((j + 3) * n + i) = lanes[3];
                        j += 4;
                    }
                    while j < j1 {
                        *dst.get_unchecked_mut(j * n + i) = *src.get_unchecked(i * n + j);
                        j += 1;
                    }
                }
            }
        }
    }
}
