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
// NAME:    transpose-scatter
//
// PURPOSE: This program measures the time for the symmetry check and
//          the transpose of a row-major matrix distributed across a
//          fixed group of rank threads: full-matrix broadcast for the
//          symmetry check, row-block scatter and column-wise gather
//          rounds for the transpose. Only the coordinator holds the
//          assembled result.
//
// USAGE:   transpose-scatter --exponent <e> [--iterations <k>]
//                            [--ranks <p>]
//
//          The matrix order is 2^e. The order must be divisible by
//          the rank count.
//
///////////////////////////////////////////////

use clap::Parser;
use common::cluster;
use common::FLOAT_COMPARE_TOLERANCE;

#[derive(Parser, Debug)]
#[command(version, about = "Message-passing transpose and symmetry benchmark", long_about = None)]
struct Args {
    /// Matrix order exponent: order = 2^e
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(4..=12))]
    exponent: u32,
    /// Timed repetitions
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    iterations: u32,
    /// Number of cooperating ranks
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=64))]
    ranks: u32,
}

fn main() {
    let args = Args::parse();
    let order = 1usize << args.exponent;
    let ranks = args.ranks as usize;

    println!("Transpose kernels");
    println!("Message-passing matrix transpose and symmetry check");
    println!("Number of iterations  = {}", args.iterations);
    println!("Matrix order          = {}", order);
    println!("Rank count            = {}", ranks);

    let report = match cluster::run_benchmark(order, ranks, args.iterations, FLOAT_COMPARE_TOLERANCE)
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("TRANSPOSITION TIME EVALUATION");
    println!(
        "Matrix size: {}, time: {:.6} ms",
        report.order, report.transpose_ms
    );
    println!();
    println!("SYMMETRY CHECK TIME EVALUATION");
    println!(
        "Matrix size: {}, time: {:.6} ms",
        report.order, report.symmetry_ms
    );

    if !report.verified {
        println!("The matrix is not transposed correctly");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn rejects_exponents_outside_the_range() {
        assert!(Args::try_parse_from(["transpose-scatter", "--exponent", "3"]).is_err());
        assert!(Args::try_parse_from(["transpose-scatter", "--exponent", "13"]).is_err());
        assert!(Args::try_parse_from(["transpose-scatter", "--exponent", "4"]).is_ok());
        assert!(Args::try_parse_from(["transpose-scatter", "--exponent", "12"]).is_ok());
    }

    #[test]
    fn rejects_iteration_counts_outside_the_range() {
        let base = ["transpose-scatter", "--exponent", "8"];
        let with = |extra: &[&str]| {
            let mut argv = base.to_vec();
            argv.extend_from_slice(extra);
            Args::try_parse_from(argv)
        };
        assert!(with(&["--iterations", "0"]).is_err());
        assert!(with(&["--iterations", "51"]).is_err());
        assert!(with(&["--iterations", "50"]).is_ok());
    }

    #[test]
    fn requires_an_exponent() {
        assert!(Args::try_parse_from(["transpose-scatter"]).is_err());
    }
}
