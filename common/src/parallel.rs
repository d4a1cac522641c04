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

//! Work-sharing variants on a rayon pool. Destination row-tiles are
//! disjoint write regions, so the transpose needs no synchronization
//! inside the parallel region; the pool join is the exit barrier.

use rayon::prelude::*;

use crate::error::Error;
use crate::matrix::Matrix;

/// Tiled parallel transpose. Row-tiles of the destination are handed
/// out across the pool; within each, column tiles are walked with
/// bounds clamped to the matrix edge.
pub fn transpose_parallel(src: &Matrix, dst: &mut Matrix, tile: usize) {
    assert!(tile > 0);
    let n = src.order();
    assert_eq!(n, dst.order());
    let a = src.as_slice();

    dst.as_mut_slice()
        .par_chunks_mut(tile * n)
        .enumerate()
        .for_each(|(row_tile, rows)| {
            let i0 = row_tile * tile;
            for j0 in (0..n).step_by(tile) {
                let j1 = usize::min(j0 + tile, n);
                for (di, row) in rows.chunks_mut(n).enumerate() {
                    let i = i0 + di;
                    for j in j0..j1 {
                        row[j] = a[j * n + i];
                    }
                }
            }
        });
}

/// Rows are partitioned across the pool; each worker folds a local
/// boolean over its rows and the results meet in an AND-reduction
/// after the implicit join. No shared flag, no early exit.
pub fn check_symmetry_parallel(m: &Matrix, tolerance: f32) -> bool {
    let n = m.order();
    (0..n)
        .into_par_iter()
        .fold(
            || true,
            |mut local, i| {
                for j in 0..i {
                    local &= (m.get(i, j) - m.get(j, i)).abs() <= tolerance;
                }
                local
            },
        )
        .reduce(|| true, |a, b| a && b)
}

/// Runs `f` inside a dedicated pool of exactly `threads` workers.
pub fn with_pool<R, F>(threads: usize, f: F) -> Result<R, Error>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
    Ok(pool.install(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Lcg;
    use crate::seq::transpose_naive;
    use crate::tiled::TRANSPOSE_BLOCK;
    use crate::FLOAT_COMPARE_TOLERANCE;

    #[test]
    fn matches_naive_on_odd_orders() {
        let mut m = Matrix::zeroed(33).unwrap();
        m.fill_random(&mut Lcg::seeded(11), 100.0);
        let mut expected = Matrix::zeroed(33).unwrap();
        let mut got = Matrix::zeroed(33).unwrap();
        transpose_naive(&m, &mut expected);
        transpose_parallel(&m, &mut got, TRANSPOSE_BLOCK);
        assert_eq!(expected.as_slice(), got.as_slice());
    }

    #[test]
    fn symmetry_reduction_finds_the_bad_pair() {
        let mut m = Matrix::zeroed(64).unwrap();
        m.fill_symmetric(&mut Lcg::new(), 100.0);
        assert!(check_symmetry_parallel(&m, FLOAT_COMPARE_TOLERANCE));
        m.set(63, 0, m.get(63, 0) + 1.0);
        assert!(!check_symmetry_parallel(&m, FLOAT_COMPARE_TOLERANCE));
    }
}
