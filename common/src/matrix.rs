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

//! Square, row-major, contiguous matrix of single-precision floats.
//! One allocation, fixed stride; every kernel in the suite indexes it
//! through [`Matrix::idx`] or reads the flat slice directly.

use crate::error::Error;
use crate::rng::Lcg;

#[derive(Debug, Clone)]
pub struct Matrix {
    order: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Allocates an `order * order` zero-filled matrix. Allocation is
    /// fallible so an out-of-memory condition reports as an error
    /// instead of aborting the process.
    pub fn zeroed(order: usize) -> Result<Self, Error> {
        let nelems = order.checked_mul(order).ok_or_else(|| {
            Error::InvalidConfiguration(format!("matrix order {} overflows", order))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(nelems)?;
        data.resize(nelems, 0.0);
        Ok(Matrix { order, data })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Flat index of element `(i, j)`.
    #[inline(always)]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i * self.order + j
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.order + j]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.order + j] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Fills every element with a uniform draw from `[0, bound)`.
    pub fn fill_random(&mut self, rng: &mut Lcg, bound: f32) {
        for v in &mut self.data {
            *v = rng.next_f32(bound);
        }
    }

    /// Fills the upper triangle with uniform draws and mirrors it into
    /// the lower triangle, so `M[i][j] == M[j][i]` holds for all pairs.
    pub fn fill_symmetric(&mut self, rng: &mut Lcg, bound: f32) {
        let n = self.order;
        for i in 0..n {
            for j in i..n {
                let v = rng.next_f32(bound);
                self.data[i * n + j] = v;
                self.data[j * n + i] = v;
            }
        }
    }

    pub fn fill_constant(&mut self, value: f32) {
        self.data.fill(value);
    }
}
