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

//! The timing harness. One parameterized runner drives every
//! shared-memory variant over a size list: allocate, initialize, time
//! the symmetry check, time the transpose, self-check, repeat, average.

use std::time::{Duration, Instant};

use crate::error::Error;
use crate::matrix::Matrix;
use crate::rng::Lcg;
use crate::FLOAT_COMPARE_TOLERANCE;

/// The sweep used when no explicit order is given.
pub const DEFAULT_SIZES: [usize; 9] = [16, 32, 64, 128, 256, 512, 1024, 2048, 4096];

pub struct BenchConfig {
    pub sizes: Vec<usize>,
    pub iterations: u32,
    pub symmetric: bool,
    pub tolerance: f32,
}

impl BenchConfig {
    /// A single explicit order, or the default sweep when `None`.
    pub fn new(order: Option<usize>, iterations: u32, symmetric: bool) -> Self {
        BenchConfig {
            sizes: match order {
                Some(n) => vec![n],
                None => DEFAULT_SIZES.to_vec(),
            },
            iterations,
            symmetric,
            tolerance: FLOAT_COMPARE_TOLERANCE,
        }
    }
}

/// Averaged timings for one matrix order.
pub struct SizeSample {
    pub order: usize,
    pub symmetry_ms: f64,
    pub transpose_ms: f64,
    pub symmetric: bool,
}

/// Exact elementwise check of `dst[j][i] == src[i][j]`. The kernels
/// move bits, they never do arithmetic, so equality is exact.
pub fn verify_transpose(src: &Matrix, dst: &Matrix) -> bool {
    let n = src.order();
    if n != dst.order() {
        return false;
    }
    for i in 0..n {
        for j in 0..n {
            if src.get(i, j) != dst.get(j, i) {
                return false;
            }
        }
    }
    true
}

/// Runs `check` and `transpose` over every configured size. Matrices
/// are allocated and initialized fresh for every iteration; only the
/// kernel calls sit inside the clock. A failed self-check is fatal.
pub fn run<C, T>(cfg: &BenchConfig, mut check: C, mut transpose: T) -> Result<Vec<SizeSample>, Error>
where
    C: FnMut(&Matrix, f32) -> bool,
    T: FnMut(&Matrix, &mut Matrix),
{
    let mut rng = Lcg::new();
    let mut samples = Vec::with_capacity(cfg.sizes.len());

    for &order in &cfg.sizes {
        let mut sym_total = Duration::ZERO;
        let mut tr_total = Duration::ZERO;
        let mut symmetric = false;

        for _ in 0..cfg.iterations {
            let mut matrix = Matrix::zeroed(order)?;
            let mut transposed = Matrix::zeroed(order)?;
            if cfg.symmetric {
                matrix.fill_symmetric(&mut rng, 100.0);
            } else {
                matrix.fill_random(&mut rng, 100.0);
            }

            let start = Instant::now();
            symmetric = check(&matrix, cfg.tolerance);
            sym_total += start.elapsed();

            let start = Instant::now();
            transpose(&matrix, &mut transposed);
            tr_total += start.elapsed();

            if !verify_transpose(&matrix, &transposed) {
                println!("The matrix is not transposed correctly");
                return Err(Error::SelfCheck { order });
            }
        }

        let per_iter = f64::from(cfg.iterations.max(1));
        samples.push(SizeSample {
            order,
            symmetry_ms: sym_total.as_secs_f64() * 1e3 / per_iter,
            transpose_ms: tr_total.as_secs_f64() * 1e3 / per_iter,
            symmetric,
        });
    }

    Ok(samples)
}

/// Prints the two evaluation sections in the suite's stdout format.
pub fn report(samples: &[SizeSample]) {
    println!("TRANSPOSITION TIME EVALUATION");
    for s in samples {
        println!("Matrix size: {}, time: {:.6} ms", s.order, s.transpose_ms);
    }
    println!();
    println!("SYMMETRY CHECK TIME EVALUATION");
    for s in samples {
        println!(
            "Matrix size: {}, time: {:.6} ms ==> the matrix is {}",
            s.order,
            s.symmetry_ms,
            if s.symmetric { "symmetric" } else { "asymmetric" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::{check_symmetry, transpose_naive};

    #[test]
    fn runner_produces_one_sample_per_size() {
        let cfg = BenchConfig {
            sizes: vec![16, 17],
            iterations: 2,
            symmetric: false,
            tolerance: FLOAT_COMPARE_TOLERANCE,
        };
        let samples = run(&cfg, check_symmetry, transpose_naive).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].order, 16);
        assert_eq!(samples[1].order, 17);
    }

    #[test]
    fn runner_flags_a_broken_kernel() {
        let cfg = BenchConfig::new(Some(16), 1, false);
        // A "transpose" that copies instead of transposing must trip
        // the self-check.
        let result = run(&cfg, check_symmetry, |src: &Matrix, dst: &mut Matrix| {
            dst.as_mut_slice().copy_from_slice(src.as_slice());
        });
        assert!(matches!(result, Err(Error::SelfCheck { order: 16 })));
    }

    #[test]
    fn symmetric_config_reports_symmetric_input() {
        let cfg = BenchConfig::new(Some(32), 1, true);
        let samples = run(&cfg, check_symmetry, transpose_naive).unwrap();
        assert!(samples[0].symmetric);
    }
}
