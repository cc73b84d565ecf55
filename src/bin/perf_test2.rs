use std::process::ExitCode;

use clap::Parser;
use perfcount::sched::{self, MAX_RT_PRIORITY};
use perfcount::workload::{self, AlignedBuffer, DEFAULT_ELEMENTS};
use tracing::{info, warn};

mod common;

/// Count hardware events while summing a cache-aligned buffer with SIMD,
/// pinned to one core at real-time priority.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of i32 elements to sum
    #[arg(short, long, default_value_t = DEFAULT_ELEMENTS, env = "PERFCOUNT_ELEMENTS")]
    elements: usize,

    /// Core to pin the process to
    #[arg(long, default_value_t = 0, env = "PERFCOUNT_CORE")]
    core: usize,

    /// SCHED_FIFO priority to run at
    #[arg(long, default_value_t = MAX_RT_PRIORITY, env = "PERFCOUNT_PRIORITY")]
    priority: i32,

    /// Leave the CPU affinity alone
    #[arg(long)]
    no_pin: bool,

    /// Stay on the default scheduler
    #[arg(long)]
    no_rt: bool,

    #[command(flatten)]
    counters: common::CounterArgs,
}

fn main() -> ExitCode {
    common::init_logging();
    let args = Args::parse();

    // Both are best effort: without them the numbers are just noisier.
    if !args.no_pin {
        match sched::pin_to_core(args.core) {
            Ok(()) => info!(core = args.core, "pinned to core"),
            Err(e) => warn!("{}", e),
        }
    }
    if !args.no_rt {
        match sched::set_realtime_priority(args.priority) {
            Ok(()) => info!(priority = args.priority, "running at real-time priority"),
            Err(e) => warn!("{}", e),
        }
    }

    let buf = AlignedBuffer::from_fn(args.elements, |i| i as i32);

    common::run(&args.counters, || workload::simd_sum(&buf))
}
