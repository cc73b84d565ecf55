use std::fmt;
use std::str::FromStr;

use crate::error::{new_error, Error, ErrorKind};
use crate::sys::bindings::*;

/// Generalised hardware events (`PERF_TYPE_HARDWARE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    /// Core clock cycles. Frequency scaling changes the rate.
    CpuCycles,
    /// Retired instructions.
    Instructions,
    /// Cache accesses, usually last-level cache references.
    CacheReferences,
    /// Cache misses, usually last-level cache misses.
    CacheMisses,
    /// Retired branch instructions.
    BranchInstructions,
    /// Mispredicted branch instructions.
    BranchMisses,
}

impl HardwareEvent {
    fn config(self) -> u64 {
        let id = match self {
            HardwareEvent::CpuCycles => PERF_COUNT_HW_CPU_CYCLES,
            HardwareEvent::Instructions => PERF_COUNT_HW_INSTRUCTIONS,
            HardwareEvent::CacheReferences => PERF_COUNT_HW_CACHE_REFERENCES,
            HardwareEvent::CacheMisses => PERF_COUNT_HW_CACHE_MISSES,
            HardwareEvent::BranchInstructions => PERF_COUNT_HW_BRANCH_INSTRUCTIONS,
            HardwareEvent::BranchMisses => PERF_COUNT_HW_BRANCH_MISSES,
        };
        u64::from(id)
    }
}

/// Cache levels addressable through `PERF_TYPE_HW_CACHE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cache {
    /// Level 1 data cache.
    L1Data,
    /// Level 1 instruction cache.
    L1Instruction,
    /// Last-level cache.
    LastLevel,
    /// Data TLB.
    DataTlb,
    /// Instruction TLB.
    InstructionTlb,
    /// Branch prediction unit.
    BranchPredictor,
}

/// The kind of cache access to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    /// Loads.
    Read,
    /// Stores.
    Write,
    /// Prefetches.
    Prefetch,
}

/// Whether to count every access or only the misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheResult {
    /// Every access.
    Access,
    /// Accesses that missed.
    Miss,
}

/// An event a [`Counter`] can be allocated for.
///
/// [`Counter`]: struct.Counter.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A generalised hardware event.
    Hardware(HardwareEvent),
    /// A cache event, counted at one cache level for one kind of access.
    Cache {
        /// Cache level.
        cache: Cache,
        /// Access kind.
        op: CacheOp,
        /// All accesses or only misses.
        result: CacheResult,
    },
}

impl Event {
    /// `cycles`
    pub const CPU_CYCLES: Event = Event::Hardware(HardwareEvent::CpuCycles);
    /// `instructions`
    pub const INSTRUCTIONS: Event = Event::Hardware(HardwareEvent::Instructions);
    /// `cache-references`
    pub const CACHE_REFERENCES: Event = Event::Hardware(HardwareEvent::CacheReferences);
    /// `cache-misses`
    pub const CACHE_MISSES: Event = Event::Hardware(HardwareEvent::CacheMisses);
    /// `branches`
    pub const BRANCHES: Event = Event::Hardware(HardwareEvent::BranchInstructions);
    /// `branch-misses`
    pub const BRANCH_MISSES: Event = Event::Hardware(HardwareEvent::BranchMisses);
    /// L1 data cache load misses.
    pub const L1D_MISSES: Event = Event::read_miss(Cache::L1Data);
    /// Last-level cache load misses.
    pub const LLC_MISSES: Event = Event::read_miss(Cache::LastLevel);
    /// Data TLB load misses.
    pub const DTLB_MISSES: Event = Event::read_miss(Cache::DataTlb);
    /// Instruction TLB misses.
    pub const ITLB_MISSES: Event = Event::read_miss(Cache::InstructionTlb);

    /// The counters both demo programs open, in the order they are printed.
    pub const DEMO_SET: [Event; 7] = [
        Event::CPU_CYCLES,
        Event::CACHE_MISSES,
        Event::BRANCH_MISSES,
        Event::L1D_MISSES,
        Event::LLC_MISSES,
        Event::DTLB_MISSES,
        Event::ITLB_MISSES,
    ];

    const fn read_miss(cache: Cache) -> Event {
        Event::Cache {
            cache,
            op: CacheOp::Read,
            result: CacheResult::Miss,
        }
    }

    /// The `perf_event_attr.type` value for this event.
    pub fn kind(&self) -> u32 {
        match self {
            Event::Hardware(_) => PERF_TYPE_HARDWARE,
            Event::Cache { .. } => PERF_TYPE_HW_CACHE,
        }
    }

    /// The `perf_event_attr.config` value for this event.
    ///
    /// Cache events are encoded as `id | (op << 8) | (result << 16)`.
    pub fn config(&self) -> u64 {
        match *self {
            Event::Hardware(hw) => hw.config(),
            Event::Cache { cache, op, result } => {
                let id = match cache {
                    Cache::L1Data => PERF_COUNT_HW_CACHE_L1D,
                    Cache::L1Instruction => PERF_COUNT_HW_CACHE_L1I,
                    Cache::LastLevel => PERF_COUNT_HW_CACHE_LL,
                    Cache::DataTlb => PERF_COUNT_HW_CACHE_DTLB,
                    Cache::InstructionTlb => PERF_COUNT_HW_CACHE_ITLB,
                    Cache::BranchPredictor => PERF_COUNT_HW_CACHE_BPU,
                };
                let op = match op {
                    CacheOp::Read => PERF_COUNT_HW_CACHE_OP_READ,
                    CacheOp::Write => PERF_COUNT_HW_CACHE_OP_WRITE,
                    CacheOp::Prefetch => PERF_COUNT_HW_CACHE_OP_PREFETCH,
                };
                let result = match result {
                    CacheResult::Access => PERF_COUNT_HW_CACHE_RESULT_ACCESS,
                    CacheResult::Miss => PERF_COUNT_HW_CACHE_RESULT_MISS,
                };
                u64::from(id) | (u64::from(op) << 8) | (u64::from(result) << 16)
            }
        }
    }

    /// Human readable label, printed next to the count.
    pub fn name(&self) -> &'static str {
        match *self {
            Event::Hardware(hw) => match hw {
                HardwareEvent::CpuCycles => "CPU Cycles",
                HardwareEvent::Instructions => "Instructions",
                HardwareEvent::CacheReferences => "Cache References",
                HardwareEvent::CacheMisses => "Cache Misses",
                HardwareEvent::BranchInstructions => "Branch Instructions",
                HardwareEvent::BranchMisses => "Branch Mispredictions",
            },
            Event::L1D_MISSES => "L1 Data Cache Misses",
            Event::LLC_MISSES => "Last-Level Cache Misses",
            Event::DTLB_MISSES => "Data TLB Misses",
            Event::ITLB_MISSES => "Instruction TLB Misses",
            Event::Cache { .. } => "Cache Event",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses the short spellings accepted on the command line, matching the
/// names `perf list` uses where one exists.
impl FromStr for Event {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let event = match s.trim().to_ascii_lowercase().as_str() {
            "cycles" | "cpu-cycles" => Event::CPU_CYCLES,
            "instructions" => Event::INSTRUCTIONS,
            "cache-references" => Event::CACHE_REFERENCES,
            "cache-misses" => Event::CACHE_MISSES,
            "branches" | "branch-instructions" => Event::BRANCHES,
            "branch-misses" => Event::BRANCH_MISSES,
            "l1d-misses" | "l1-dcache-load-misses" => Event::L1D_MISSES,
            "llc-misses" | "llc-load-misses" => Event::LLC_MISSES,
            "dtlb-misses" | "dtlb-load-misses" => Event::DTLB_MISSES,
            "itlb-misses" | "itlb-load-misses" => Event::ITLB_MISSES,
            _ => return Err(new_error(ErrorKind::InvalidEventSpec)),
        };
        Ok(event)
    }
}
