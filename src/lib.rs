#![warn(missing_docs)]

//! `perfcount-rs` opens Linux hardware performance counters around a piece
//! of code and reports how many micro-architectural events it caused.
//!
//! Counters are created with the [`perf_event_open(2)`] system call and
//! driven with the `PERF_EVENT_IOC_*` ioctls. Each [`Counter`] owns one file
//! descriptor; a [`CounterSet`] groups several of them so they can be reset,
//! enabled, disabled and read together around a workload:
//!
//! ```no_run
//! use perfcount::{workload, CounterConfig, CounterSet, Event};
//!
//! let set = CounterSet::open(&CounterConfig::default(), &Event::DEMO_SET)?;
//! let (_, report) = set.measure(|| workload::branchy_sum(1_000_000))?;
//!
//! print!("{}", report);
//! #
//! # Ok::<(), perfcount::error::Error>(())
//! ```
//!
//! The [`sched`] module pins the process to a core and raises it to
//! real-time priority, which removes most of the run-to-run noise caused by
//! migrations and preemption.
//!
//! Only Linux is supported. On other targets the crate builds but every
//! counter operation fails with [`ErrorKind::Unsupported`].
//!
//! [`perf_event_open(2)`]: https://man7.org/linux/man-pages/man2/perf_event_open.2.html
//! [`ErrorKind::Unsupported`]: error/enum.ErrorKind.html#variant.Unsupported

#[macro_use]
extern crate lazy_static;

pub mod error;
mod sys;
#[cfg(not(target_os = "linux"))]
mod stubs;

mod event;
pub use self::event::{Cache, CacheOp, CacheResult, Event, HardwareEvent};

mod counter;
pub use self::counter::{Counter, CounterConfig, Running};

mod group;
pub use self::group::CounterSet;

mod report;
pub use self::report::{Reading, Report};

pub mod sched;
pub mod workload;

/// Counters opened with `CPU_ANY` follow the measured process to whichever
/// CPU it runs on.
pub const CPU_ANY: i32 = -1;

/// Attaching to `PID_SELF` measures the calling process.
pub const PID_SELF: i32 = 0;

const PARANOID_PATH: &str = "/proc/sys/kernel/perf_event_paranoid";

lazy_static! {
    static ref PARANOID_LEVEL: Option<i32> = std::fs::read_to_string(PARANOID_PATH)
        .ok()
        .and_then(|s| s.trim().parse().ok());
}

/// The system's `perf_event_paranoid` setting, read once per process.
///
/// `None` if the file is missing or unreadable.
pub fn paranoid_level() -> Option<i32> {
    *PARANOID_LEVEL
}
