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

//! Sequential baseline kernels: the naive loops every other variant is
//! checked against, plus the 16-wide loop-unrolled forms. Unrolling
//! trims loop overhead and exposes instruction-level parallelism; the
//! memory-access pattern is unchanged.

use crate::matrix::Matrix;

/// `dst[j][i] = src[i][j]` for all pairs. The write side strides
/// column-wise through `dst`, which is exactly the cache behavior the
/// tiled variants exist to avoid.
pub fn transpose_naive(src: &Matrix, dst: &mut Matrix) {
    let n = src.order();
    assert_eq!(n, dst.order());
    for i in 0..n {
        for j in 0..n {
            dst.set(j, i, src.get(i, j));
        }
    }
}

/// Same contract as [`transpose_naive`], 16 destination rows per inner
/// step. The scalar tail handles `n % 16` trailing columns.
pub fn transpose_unrolled(src: &Matrix, dst: &mut Matrix) {
    let n = src.order();
    assert_eq!(n, dst.order());
    let main = n - n % 16;
    for i in 0..n {
        let mut j = 0;
        while j < main {
            dst.set(j, i, src.get(i, j));
            dst.set(j + 1, i, src.get(i, j + 1));
            dst.set(j + 2, i, src.get(i, j + 2));
            dst.set(j + 3, i, src.get(i, j + 3));
            dst.set(j + 4, i, src.get(i, j + 4));
            dst.set(j + 5, i, src.get(i, j + 5));
            dst.set(j + 6, i, src.get(i, j + 6));
            dst.set(j + 7, i, src.get(i, j + 7));
            dst.set(j + 8, i, src.get(i, j + 8));
            dst.set(j + 9, i, src.get(i, j + 9));
            dst.set(j + 10, i, src.get(i, j + 10));
            dst.set(j + 11, i, src.get(i, j + 11));
            dst.set(j + 12, i, src.get(i, j + 12));
            dst.set(j + 13, i, src.get(i, j + 13));
            dst.set(j + 14, i, src.get(i, j + 14));
            dst.set(j + 15, i, src.get(i, j + 15));
            j += 16;
        }
        for j in main..n {
            dst.set(j, i, src.get(i, j));
        }
    }
}

/// True iff `|M[i][j] - M[j][i]| <= tolerance` for all `j < i`. Only the
/// lower triangle is scanned; the relation is symmetric.
pub fn check_symmetry(m: &Matrix, tolerance: f32) -> bool {
    let n = m.order();
    for i in 0..n {
        for j in 0..i {
            if (m.get(i, j) - m.get(j, i)).abs() > tolerance {
                return false;
            }
        }
    }
    true
}

/// Lower-triangle scan in strides of 16 columns, clamped at the
/// diagonal.
pub fn check_symmetry_unrolled(m: &Matrix, tolerance: f32) -> bool {
    let n = m.order();
    for i in 0..n {
        let mut j = 0;
        while j < i {
            let end = usize::min(j + 16, i);
            for jj in j..end {
                if (m.get(i, jj) - m.get(jj, i)).abs() > tolerance {
                    return false;
                }
            }
            j += 16;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FLOAT_COMPARE_TOLERANCE;

    #[test]
    fn transposes_a_small_matrix() {
        let mut m = Matrix::zeroed(3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                m.set(i, j, (i * 3 + j) as f32);
            }
        }
        let mut t = Matrix::zeroed(3).unwrap();
        transpose_naive(&m, &mut t);
        assert_eq!(t.as_slice(), &[0.0, 3.0, 6.0, 1.0, 4.0, 7.0, 2.0, 5.0, 8.0]);
    }

    #[test]
    fn detects_a_single_broken_pair() {
        let mut m = Matrix::zeroed(8).unwrap();
        m.fill_constant(2.0);
        assert!(check_symmetry(&m, FLOAT_COMPARE_TOLERANCE));
        m.set(5, 2, m.get(5, 2) + 1.0);
        assert!(!check_symmetry(&m, FLOAT_COMPARE_TOLERANCE));
        assert!(!check_symmetry_unrolled(&m, FLOAT_COMPARE_TOLERANCE));
    }
}
