//! Flags, logging and output shared by the demo binaries.

use std::process::ExitCode;

use clap::Args;
use perfcount::error::Error;
use perfcount::{CounterConfig, CounterSet, Event, CPU_ANY};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Args, Debug)]
pub struct CounterArgs {
    /// Comma separated events to count instead of the default set
    /// (e.g. cycles,instructions,branch-misses)
    #[arg(long, value_delimiter = ',', env = "PERFCOUNT_EVENTS")]
    pub events: Vec<Event>,

    /// Also count events while the CPU is in kernel mode
    #[arg(long, env = "PERFCOUNT_INCLUDE_KERNEL")]
    pub include_kernel: bool,

    /// Only count while the process runs on this CPU (-1 for any)
    #[arg(long, default_value_t = CPU_ANY, allow_hyphen_values = true, env = "PERFCOUNT_CPU")]
    pub cpu: i32,
}

impl CounterArgs {
    pub fn open(&self) -> Result<CounterSet, Error> {
        let config = CounterConfig::default()
            .set_cpu(self.cpu)
            .include_kernel(self.include_kernel);

        let events: &[Event] = if self.events.is_empty() {
            &Event::DEMO_SET
        } else {
            &self.events
        };

        CounterSet::open(&config, events)
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Open the counters, measure `workload` and print one line per counter.
pub fn run<F, R>(counters: &CounterArgs, workload: F) -> ExitCode
where
    F: FnOnce() -> R,
    R: std::fmt::Debug,
{
    let set = match counters.open() {
        Ok(set) => set,
        Err(e) => {
            error!("error opening perf event for {}", e);
            return ExitCode::FAILURE;
        }
    };

    match set.measure(workload) {
        Ok((result, report)) => {
            info!(?result, "workload finished");
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("measurement failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
