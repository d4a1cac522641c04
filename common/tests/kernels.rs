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

//! Cross-variant identity checks: every optimized kernel against the
//! naive reference over seeded inputs, including tile-boundary orders.

use common::cluster::{check_symmetry_scatter, transpose_scatter};
use common::parallel::{check_symmetry_parallel, transpose_parallel, with_pool};
use common::seq::{
    check_symmetry, check_symmetry_unrolled, transpose_naive, transpose_unrolled,
};
use common::tiled::{
    check_symmetry_blocked, transpose_blocked, transpose_simd, TRANSPOSE_BLOCK,
};
use common::{Error, Lcg, Matrix, FLOAT_COMPARE_TOLERANCE};

fn random_matrix(n: usize, seed: u64) -> Matrix {
    let mut m = Matrix::zeroed(n).unwrap();
    m.fill_random(&mut Lcg::seeded(seed), 100.0);
    m
}

fn naive_transpose_of(m: &Matrix) -> Matrix {
    let mut t = Matrix::zeroed(m.order()).unwrap();
    transpose_naive(m, &mut t);
    t
}

#[test]
fn transpose_is_an_involution() {
    for n in [15, 16, 17, 64] {
        let m = random_matrix(n, 1);
        let t = naive_transpose_of(&m);
        let back = naive_transpose_of(&t);
        assert_eq!(m.as_slice(), back.as_slice(), "order {}", n);
    }
}

#[test]
fn every_element_lands_at_its_mirror_index() {
    // 17 against a 16-wide block exercises partial tiles on both axes.
    let m = random_matrix(17, 2);
    let mut t = Matrix::zeroed(17).unwrap();
    transpose_blocked(&m, &mut t, 16);
    for i in 0..17 {
        for j in 0..17 {
            assert_eq!(t.get(j, i), m.get(i, j), "element ({}, {})", i, j);
        }
    }
}

#[test]
fn unrolled_matches_naive_at_awkward_orders() {
    for n in [15, 16, 17, 31, 33, 100] {
        let m = random_matrix(n, 3);
        let expected = naive_transpose_of(&m);
        let mut got = Matrix::zeroed(n).unwrap();
        transpose_unrolled(&m, &mut got);
        assert_eq!(expected.as_slice(), got.as_slice(), "order {}", n);
    }
}

#[test]
fn blocked_and_simd_are_bit_identical_to_naive() {
    for n in [15, 16, 17, 31, 32] {
        let m = random_matrix(n, 4);
        let expected = naive_transpose_of(&m);

        let mut blocked = Matrix::zeroed(n).unwrap();
        transpose_blocked(&m, &mut blocked, TRANSPOSE_BLOCK);
        assert_eq!(expected.as_slice(), blocked.as_slice(), "blocked, order {}", n);

        let mut simd = Matrix::zeroed(n).unwrap();
        transpose_simd(&m, &mut simd, TRANSPOSE_BLOCK);
        assert_eq!(expected.as_slice(), simd.as_slice(), "simd, order {}", n);
    }
}

#[test]
fn blocked_and_simd_are_bit_identical_to_naive_at_full_scale() {
    let n = 4096;
    let m = random_matrix(n, 5);
    let expected = naive_transpose_of(&m);

    let mut blocked = Matrix::zeroed(n).unwrap();
    transpose_blocked(&m, &mut blocked, TRANSPOSE_BLOCK);
    assert_eq!(expected.as_slice(), blocked.as_slice());

    let mut simd = Matrix::zeroed(n).unwrap();
    transpose_simd(&m, &mut simd, TRANSPOSE_BLOCK);
    assert_eq!(expected.as_slice(), simd.as_slice());
}

#[test]
fn parallel_matches_sequential_for_every_thread_count() {
    let m = random_matrix(129, 6);
    let expected = naive_transpose_of(&m);
    for threads in [1, 2, 4, 8] {
        let got = with_pool(threads, || {
            let mut t = Matrix::zeroed(129).unwrap();
            transpose_parallel(&m, &mut t, TRANSPOSE_BLOCK);
            t
        })
        .unwrap();
        assert_eq!(expected.as_slice(), got.as_slice(), "{} threads", threads);
    }
}

#[test]
fn scatter_matches_sequential_for_every_rank_count() {
    let m = random_matrix(64, 7);
    let expected = naive_transpose_of(&m);
    for ranks in [1, 2, 4] {
        let got = transpose_scatter(&m, ranks).unwrap();
        assert_eq!(expected.as_slice(), got.as_slice(), "{} ranks", ranks);
    }
}

#[test]
fn scatter_rejects_an_indivisible_order() {
    let m = random_matrix(66, 8);
    assert!(matches!(
        transpose_scatter(&m, 4),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn mirrored_input_passes_every_checker() {
    let mut m = Matrix::zeroed(33).unwrap();
    m.fill_symmetric(&mut Lcg::seeded(9), 100.0);
    let eps = FLOAT_COMPARE_TOLERANCE;
    assert!(check_symmetry(&m, eps));
    assert!(check_symmetry_unrolled(&m, eps));
    assert!(check_symmetry_blocked(&m, eps));
    assert!(check_symmetry_parallel(&m, eps));
    assert!(check_symmetry_scatter(&m, 3, eps).unwrap());
}

#[test]
fn one_perturbed_pair_fails_every_checker() {
    let mut m = Matrix::zeroed(33).unwrap();
    m.fill_symmetric(&mut Lcg::seeded(10), 100.0);
    m.set(7, 3, m.get(7, 3) + 1.0);
    let eps = FLOAT_COMPARE_TOLERANCE;
    assert!(!check_symmetry(&m, eps));
    assert!(!check_symmetry_unrolled(&m, eps));
    assert!(!check_symmetry_blocked(&m, eps));
    assert!(!check_symmetry_parallel(&m, eps));
    assert!(!check_symmetry_scatter(&m, 3, eps).unwrap());
}
