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

//! Message-passing execution: a fixed group of rank threads joined by
//! blocking collectives over channels. Rank 0 coordinates; it owns the
//! full matrix, scatters row blocks, and reassembles the transpose one
//! gathered row per source column.
//!
//! Every collective must be called by every rank in the group in the
//! same order. A mismatched sequence blocks the group forever; there is
//! no timeout and no recovery, the same fragility collective-based
//! protocols have everywhere. A rank that panics tears the whole group
//! down instead of leaving the others waiting.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use crate::bench::verify_transpose;
use crate::error::Error;
use crate::matrix::Matrix;
use crate::rng::Lcg;

enum Packet {
    Block(Vec<f32>),
    Flag(bool),
}

/// One member of the group. Handed to the rank's closure by
/// [`run_group`]; all communication goes through its methods.
pub struct Rank {
    id: usize,
    group: usize,
    barrier: Arc<Barrier>,
    to_root: Sender<(usize, Packet)>,
    inbox: Receiver<Packet>,
    // Coordinator only.
    root_rx: Option<Receiver<(usize, Packet)>>,
    peers: Vec<Sender<Packet>>,
}

impl Rank {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn group_size(&self) -> usize {
        self.group
    }

    pub fn is_coordinator(&self) -> bool {
        self.id == 0
    }

    /// Blocks until every rank in the group has arrived.
    pub fn barrier(&self) {
        self.barrier.wait();
    }

    /// Coordinator sends `data` to every rank; everyone returns a full
    /// copy of it.
    pub fn broadcast(&self, data: Option<&[f32]>) -> Vec<f32> {
        if self.is_coordinator() {
            let data = data.expect("broadcast: coordinator must supply the buffer");
            for peer in &self.peers[1..] {
                peer.send(Packet::Block(data.to_vec()))
                    .expect("broadcast: rank left the group");
            }
            data.to_vec()
        } else {
            self.recv_block()
        }
    }

    /// Coordinator splits `data` into `chunk`-element pieces, one per
    /// rank in rank order; every rank returns its piece.
    pub fn scatter(&self, data: Option<&[f32]>, chunk: usize) -> Vec<f32> {
        if self.is_coordinator() {
            let data = data.expect("scatter: coordinator must supply the buffer");
            assert_eq!(data.len(), chunk * self.group);
            for (r, peer) in self.peers.iter().enumerate().skip(1) {
                peer.send(Packet::Block(data[r * chunk..(r + 1) * chunk].to_vec()))
                    .expect("scatter: rank left the group");
            }
            data[..chunk].to_vec()
        } else {
            self.recv_block()
        }
    }

    /// Every rank contributes an equally-sized `chunk`; the coordinator
    /// assembles them in rank order into `out`.
    pub fn gather(&self, chunk: &[f32], out: Option<&mut [f32]>) {
        if self.is_coordinator() {
            let out = out.expect("gather: coordinator must supply the receive buffer");
            let len = chunk.len();
            assert_eq!(out.len(), len * self.group);
            out[..len].copy_from_slice(chunk);
            let rx = self.root_rx.as_ref().expect("coordinator channel");
            for _ in 1..self.group {
                let (r, packet) = rx.recv().expect("gather: rank left the group");
                match packet {
                    Packet::Block(b) => {
                        assert_eq!(b.len(), len);
                        out[r * len..(r + 1) * len].copy_from_slice(&b);
                    }
                    Packet::Flag(_) => panic!("gather: collective sequence mismatch"),
                }
            }
        } else {
            self.to_root
                .send((self.id, Packet::Block(chunk.to_vec())))
                .expect("gather: coordinator left the group");
        }
    }

    /// Logical AND of every rank's `local`, returned to every rank.
    pub fn all_reduce_and(&self, local: bool) -> bool {
        if self.is_coordinator() {
            let mut acc = local;
            let rx = self.root_rx.as_ref().expect("coordinator channel");
            for _ in 1..self.group {
                match rx.recv().expect("all-reduce: rank left the group").1 {
                    Packet::Flag(f) => acc &= f,
                    Packet::Block(_) => panic!("all-reduce: collective sequence mismatch"),
                }
            }
            for peer in &self.peers[1..] {
                peer.send(Packet::Flag(acc))
                    .expect("all-reduce: rank left the group");
            }
            acc
        } else {
            self.to_root
                .send((self.id, Packet::Flag(local)))
                .expect("all-reduce: coordinator left the group");
            match self.inbox.recv().expect("all-reduce: coordinator left the group") {
                Packet::Flag(f) => f,
                Packet::Block(_) => panic!("all-reduce: collective sequence mismatch"),
            }
        }
    }

    fn recv_block(&self) -> Vec<f32> {
        match self.inbox.recv().expect("collective: coordinator left the group") {
            Packet::Block(b) => b,
            Packet::Flag(_) => panic!("collective sequence mismatch"),
        }
    }
}

/// Spawns `group - 1` worker ranks and runs the coordinator closure on
/// the calling thread, returning its result. Worker panics propagate.
pub fn run_group<T, W, C>(group: usize, worker: W, coordinator: C) -> T
where
    W: Fn(Rank) + Sync,
    C: FnOnce(Rank) -> T,
{
    assert!(group >= 1, "the group needs at least one rank");

    let barrier = Arc::new(Barrier::new(group));
    let (to_root, root_rx) = mpsc::channel();
    let mut peers = Vec::with_capacity(group);
    let mut inboxes = Vec::with_capacity(group);
    for _ in 0..group {
        let (tx, rx) = mpsc::channel();
        peers.push(tx);
        inboxes.push(rx);
    }

    let mut inboxes = inboxes.into_iter();
    let root_inbox = inboxes.next().expect("group is non-empty");
    let workers: Vec<Rank> = inboxes
        .enumerate()
        .map(|(i, inbox)| Rank {
            id: i + 1,
            group,
            barrier: Arc::clone(&barrier),
            to_root: to_root.clone(),
            inbox,
            root_rx: None,
            peers: Vec::new(),
        })
        .collect();
    let rank0 = Rank {
        id: 0,
        group,
        barrier,
        to_root,
        inbox: root_inbox,
        root_rx: Some(root_rx),
        peers,
    };

    thread::scope(|s| {
        let worker = &worker;
        let handles: Vec<_> = workers
            .into_iter()
            .map(|rank| s.spawn(move || worker(rank)))
            .collect();
        let out = coordinator(rank0);
        for handle in handles {
            handle.join().expect("worker rank panicked");
        }
        out
    })
}

/// Symmetry protocol: broadcast the whole matrix, check the rank's row
/// range against the mirror elements above the diagonal, AND-reduce.
/// Rows are partitioned without overlap; the last rank absorbs the
/// remainder.
pub fn symmetry_phase(rank: &Rank, full: Option<&[f32]>, order: usize, tolerance: f32) -> bool {
    let m = rank.broadcast(full);
    let base = order / rank.group_size();
    let start = rank.id() * base;
    let end = if rank.id() == rank.group_size() - 1 {
        order
    } else {
        start + base
    };
    let mut local = true;
    for i in start..end {
        for j in i + 1..order {
            local &= (m[i * order + j] - m[j * order + i]).abs() <= tolerance;
        }
    }
    rank.all_reduce_and(local)
}

/// Transpose protocol: scatter contiguous row blocks, then for each
/// source column gather one assembled destination row at the
/// coordinator. `order` must be divisible by the group size; callers
/// validate before the group exists.
pub fn transpose_phase(rank: &Rank, full: Option<&[f32]>, order: usize, dst: Option<&mut [f32]>) {
    let group = rank.group_size();
    debug_assert_eq!(order % group, 0);
    let rows = order / group;

    let local = rank.scatter(full, rows * order);
    let mut column = vec![0.0f32; rows];
    let mut row_buf = vec![0.0f32; if rank.is_coordinator() { order } else { 0 }];
    let mut dst = dst;

    for col in 0..order {
        for r in 0..rows {
            column[r] = local[r * order + col];
        }
        let out = if rank.is_coordinator() {
            Some(&mut row_buf[..])
        } else {
            None
        };
        rank.gather(&column, out);
        if let Some(d) = dst.as_deref_mut() {
            d[col * order..(col + 1) * order].copy_from_slice(&row_buf);
        }
    }
}

fn validate_group(order: usize, ranks: usize, divisible: bool) -> Result<(), Error> {
    if ranks < 1 {
        return Err(Error::InvalidConfiguration(
            "the group needs at least one rank".into(),
        ));
    }
    if ranks > order {
        return Err(Error::InvalidConfiguration(format!(
            "matrix order {} is smaller than the rank count {}",
            order, ranks
        )));
    }
    if divisible && order % ranks != 0 {
        return Err(Error::InvalidConfiguration(format!(
            "matrix order {} is not divisible by the rank count {}",
            order, ranks
        )));
    }
    Ok(())
}

/// One-shot symmetry check across `ranks` rank threads.
pub fn check_symmetry_scatter(m: &Matrix, ranks: usize, tolerance: f32) -> Result<bool, Error> {
    let order = m.order();
    validate_group(order, ranks, false)?;
    Ok(run_group(
        ranks,
        |rank| {
            symmetry_phase(&rank, None, order, tolerance);
        },
        |rank| symmetry_phase(&rank, Some(m.as_slice()), order, tolerance),
    ))
}

/// One-shot transpose across `ranks` rank threads; only the coordinator
/// sees the assembled result, which is returned.
pub fn transpose_scatter(src: &Matrix, ranks: usize) -> Result<Matrix, Error> {
    let order = src.order();
    validate_group(order, ranks, true)?;
    let mut dst = Matrix::zeroed(order)?;
    run_group(
        ranks,
        |rank| {
            transpose_phase(&rank, None, order, None);
        },
        |rank| transpose_phase(&rank, Some(src.as_slice()), order, Some(dst.as_mut_slice())),
    );
    Ok(dst)
}

/// Averaged timings for one scatter-variant run.
pub struct ScatterReport {
    pub order: usize,
    pub ranks: usize,
    pub iterations: u32,
    pub symmetry_ms: f64,
    pub transpose_ms: f64,
    pub verified: bool,
}

/// Full benchmark: one group for all iterations, barriers around each
/// timed phase so trials are comparable, coordinator clock only.
pub fn run_benchmark(
    order: usize,
    ranks: usize,
    iterations: u32,
    tolerance: f32,
) -> Result<ScatterReport, Error> {
    validate_group(order, ranks, true)?;

    let mut rng = Lcg::new();
    let mut matrix = Matrix::zeroed(order)?;
    let mut transposed = Matrix::zeroed(order)?;
    let mut total_sym = Duration::ZERO;
    let mut total_tr = Duration::ZERO;
    let mut verified = true;

    run_group(
        ranks,
        |rank| {
            for _ in 0..iterations {
                rank.barrier();
                symmetry_phase(&rank, None, order, tolerance);
                rank.barrier();
                rank.barrier();
                transpose_phase(&rank, None, order, None);
                rank.barrier();
            }
        },
        |rank| {
            for _ in 0..iterations {
                matrix.fill_random(&mut rng, 10.0);

                rank.barrier();
                let start = Instant::now();
                symmetry_phase(&rank, Some(matrix.as_slice()), order, tolerance);
                rank.barrier();
                total_sym += start.elapsed();

                rank.barrier();
                let start = Instant::now();
                transpose_phase(
                    &rank,
                    Some(matrix.as_slice()),
                    order,
                    Some(transposed.as_mut_slice()),
                );
                rank.barrier();
                total_tr += start.elapsed();

                verified &= verify_transpose(&matrix, &transposed);
            }
        },
    );

    let per_iter = f64::from(iterations.max(1));
    Ok(ScatterReport {
        order,
        ranks,
        iterations,
        symmetry_ms: total_sym.as_secs_f64() * 1e3 / per_iter,
        transpose_ms: total_tr.as_secs_f64() * 1e3 / per_iter,
        verified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::transpose_naive;
    use crate::FLOAT_COMPARE_TOLERANCE;

    // Collectives block until every rank participates; these tests only
    // ever issue matched sequences. An unmatched sequence (e.g. one
    // rank skipping a gather round) deadlocks the group by design.

    #[test]
    fn gather_assembles_in_rank_order() {
        let out = run_group(
            4,
            |rank| {
                let chunk = [rank.id() as f32; 2];
                rank.gather(&chunk, None);
            },
            |rank| {
                let mut out = vec![0.0f32; 8];
                rank.gather(&[0.0, 0.0], Some(&mut out));
                out
            },
        );
        assert_eq!(out, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn all_reduce_is_a_logical_and() {
        let acc = run_group(
            3,
            |rank| {
                // Rank 2 votes false; everyone must see false.
                let vote = rank.id() != 2;
                assert!(!rank.all_reduce_and(vote));
            },
            |rank| rank.all_reduce_and(true),
        );
        assert!(!acc);
    }

    #[test]
    fn scatter_then_gather_round_trips() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let out = run_group(
            3,
            |rank| {
                let chunk = rank.scatter(None, 4);
                rank.gather(&chunk, None);
            },
            |rank| {
                let chunk = rank.scatter(Some(&data), 4);
                let mut out = vec![0.0f32; 12];
                rank.gather(&chunk, Some(&mut out));
                out
            },
        );
        assert_eq!(out, data);
    }

    #[test]
    fn single_rank_group_talks_to_itself() {
        let mut m = Matrix::zeroed(16).unwrap();
        m.fill_random(&mut Lcg::new(), 10.0);
        let mut expected = Matrix::zeroed(16).unwrap();
        transpose_naive(&m, &mut expected);
        let got = transpose_scatter(&m, 1).unwrap();
        assert_eq!(expected.as_slice(), got.as_slice());
    }

    #[test]
    fn rejects_indivisible_orders() {
        let m = Matrix::zeroed(66).unwrap();
        match transpose_scatter(&m, 4) {
            Err(Error::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn symmetry_partition_covers_remainder_rows() {
        // 10 rows over 3 ranks: base 3, last rank takes 4. The broken
        // pair sits in the remainder rows.
        let mut m = Matrix::zeroed(10).unwrap();
        m.fill_symmetric(&mut Lcg::new(), 10.0);
        assert!(check_symmetry_scatter(&m, 3, FLOAT_COMPARE_TOLERANCE).unwrap());
        m.set(9, 8, m.get(9, 8) + 1.0);
        assert!(!check_symmetry_scatter(&m, 3, FLOAT_COMPARE_TOLERANCE).unwrap());
    }
}
