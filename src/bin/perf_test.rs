use std::process::ExitCode;

use clap::Parser;
use perfcount::workload::{self, DEFAULT_ITERATIONS};

mod common;

/// Count hardware events while running a branchy summation loop.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Iterations of the summation loop
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS, env = "PERFCOUNT_ITERATIONS")]
    iterations: u32,

    #[command(flatten)]
    counters: common::CounterArgs,
}

fn main() -> ExitCode {
    common::init_logging();
    let args = Args::parse();

    common::run(&args.counters, || workload::branchy_sum(args.iterations))
}
