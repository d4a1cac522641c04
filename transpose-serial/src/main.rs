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
// NAME:    transpose-serial
//
// PURPOSE: This program measures the time for the symmetry check and
//          the transpose of a row-major matrix, using the naive
//          sequential kernels or their 16-wide loop-unrolled forms.
//
// USAGE:   transpose-serial [--order <n>] [--iterations <k>]
//                           [--symmetric] [--unrolled]
//
//          Without --order the program sweeps the default size list.
//
///////////////////////////////////////////////

use clap::Parser;
use common::bench::{self, BenchConfig};
use common::seq;

#[derive(Parser, Debug)]
#[command(version, about = "Sequential transpose and symmetry benchmark", long_about = None)]
struct Args {
    /// Matrix order; sweeps the default size list when omitted
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(16..=4096))]
    order: Option<u64>,
    /// Timed repetitions per size
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    iterations: u32,
    /// Fill the matrix so that it is symmetric
    #[arg(short, long)]
    symmetric: bool,
    /// Use the 16-wide unrolled kernels instead of the naive ones
    #[arg(short, long)]
    unrolled: bool,
}

fn main() {
    let args = Args::parse();

    println!("Transpose kernels");
    println!(
        "Sequential matrix transpose and symmetry check ({})",
        if args.unrolled { "unrolled" } else { "naive" }
    );
    println!("Number of iterations  = {}", args.iterations);
    match args.order {
        Some(order) => println!("Matrix order          = {}", order),
        None => println!("Matrix order          = sweep"),
    }

    let cfg = BenchConfig::new(
        args.order.map(|n| n as usize),
        args.iterations,
        args.symmetric,
    );

    let result = if args.unrolled {
        bench::run(&cfg, seq::check_symmetry_unrolled, seq::transpose_unrolled)
    } else {
        bench::run(&cfg, seq::check_symmetry, seq::transpose_naive)
    };

    match result {
        Ok(samples) => bench::report(&samples),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn rejects_orders_outside_the_range() {
        assert!(Args::try_parse_from(["transpose-serial", "--order", "8"]).is_err());
        assert!(Args::try_parse_from(["transpose-serial", "--order", "8192"]).is_err());
        assert!(Args::try_parse_from(["transpose-serial", "--order", "16"]).is_ok());
        assert!(Args::try_parse_from(["transpose-serial", "--order", "4096"]).is_ok());
    }

    #[test]
    fn rejects_iteration_counts_outside_the_range() {
        assert!(Args::try_parse_from(["transpose-serial", "--iterations", "0"]).is_err());
        assert!(Args::try_parse_from(["transpose-serial", "--iterations", "51"]).is_err());
        assert!(Args::try_parse_from(["transpose-serial", "--iterations", "1"]).is_ok());
        assert!(Args::try_parse_from(["transpose-serial", "--iterations", "50"]).is_ok());
    }
}
