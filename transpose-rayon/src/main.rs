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

///////////////////////////////////////////////
//
// NAME:    transpose-rayon
//
// PURPOSE: This program measures the time for the symmetry check and
//          the transpose of a row-major matrix with the work shared
//          across a fixed-size rayon pool. Destination row-tiles are
//          disjoint, so the parallel region needs no locking.
//
// USAGE:   transpose-rayon [--order <n>] [--iterations <k>]
//                          [--threads <t>] [--tile <b>] [--symmetric]
//
//          Without --order the program sweeps the default size list.
//          Without --threads the default rayon pool is used.
//
///////////////////////////////////////////////

use clap::Parser;
use common::bench::{self, BenchConfig};
use common::parallel;

#[derive(Parser, Debug)]
#[command(version, about = "Work-sharing transpose and symmetry benchmark", long_about = None)]
struct Args {
    /// Matrix order; sweeps the default size list when omitted
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(16..=4096))]
    order: Option<u64>,
    /// Timed repetitions per size
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    iterations: u32,
    /// Worker thread count; the default rayon pool when omitted
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=512))]
    threads: Option<u32>,
    /// Transpose tile side
    #[arg(short, long, default_value_t = 32, value_parser = clap::value_parser!(u64).range(1..=4096))]
    tile: u64,
    /// Fill the matrix so that it is symmetric
    #[arg(short, long)]
    symmetric: bool,
}

fn main() {
    let args = Args::parse();
    let tile = args.tile as usize;

    println!("Transpose kernels");
    println!("Work-sharing matrix transpose and symmetry check");
    println!("Number of iterations  = {}", args.iterations);
    match args.order {
        Some(order) => println!("Matrix order          = {}", order),
        None => println!("Matrix order          = sweep"),
    }
    println!(
        "Thread count          = {}",
        args.threads
            .map(|t| t as usize)
            .unwrap_or_else(rayon::current_num_threads)
    );
    println!("Tile size             = {}", tile);

    let cfg = BenchConfig::new(
        args.order.map(|n| n as usize),
        args.iterations,
        args.symmetric,
    );

    let run = || {
        bench::run(&cfg, parallel::check_symmetry_parallel, |src, dst| {
            parallel::transpose_parallel(src, dst, tile)
        })
    };

    let result = match args.threads {
        Some(t) => parallel::with_pool(t as usize, run).and_then(|r| r),
        None => run(),
    };

    match result {
        Ok(samples) => bench::report(&samples),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
