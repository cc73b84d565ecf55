#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};

/// The subset of `perf-event-open-sys` names this crate uses.
pub mod bindings {
    pub type perf_type_id = u32;

    pub const PERF_TYPE_HARDWARE: perf_type_id = 0;
    pub const PERF_TYPE_HW_CACHE: perf_type_id = 3;

    pub const PERF_COUNT_HW_CPU_CYCLES: u32 = 0;
    pub const PERF_COUNT_HW_INSTRUCTIONS: u32 = 1;
    pub const PERF_COUNT_HW_CACHE_REFERENCES: u32 = 2;
    pub const PERF_COUNT_HW_CACHE_MISSES: u32 = 3;
    pub const PERF_COUNT_HW_BRANCH_INSTRUCTIONS: u32 = 4;
    pub const PERF_COUNT_HW_BRANCH_MISSES: u32 = 5;

    pub const PERF_COUNT_HW_CACHE_L1D: u32 = 0;
    pub const PERF_COUNT_HW_CACHE_L1I: u32 = 1;
    pub const PERF_COUNT_HW_CACHE_LL: u32 = 2;
    pub const PERF_COUNT_HW_CACHE_DTLB: u32 = 3;
    pub const PERF_COUNT_HW_CACHE_ITLB: u32 = 4;
    pub const PERF_COUNT_HW_CACHE_BPU: u32 = 5;

    pub const PERF_COUNT_HW_CACHE_OP_READ: u32 = 0;
    pub const PERF_COUNT_HW_CACHE_OP_WRITE: u32 = 1;
    pub const PERF_COUNT_HW_CACHE_OP_PREFETCH: u32 = 2;

    pub const PERF_COUNT_HW_CACHE_RESULT_ACCESS: u32 = 0;
    pub const PERF_COUNT_HW_CACHE_RESULT_MISS: u32 = 1;

    pub const PERF_ATTR_SIZE_VER0: u32 = 64;

    #[derive(Debug, Default)]
    pub struct perf_event_attr {
        pub type_: u32,
        pub size: u32,
        pub config: u64,
        flags: u64,
    }

    impl perf_event_attr {
        pub fn disabled(&self) -> u64 {
            self.flags & 1
        }

        pub fn set_disabled(&mut self, val: u64) {
            self.set_bit(0, val)
        }

        pub fn exclude_kernel(&self) -> u64 {
            (self.flags >> 5) & 1
        }

        pub fn set_exclude_kernel(&mut self, val: u64) {
            self.set_bit(5, val)
        }

        pub fn exclude_hv(&self) -> u64 {
            (self.flags >> 6) & 1
        }

        pub fn set_exclude_hv(&mut self, val: u64) {
            self.set_bit(6, val)
        }

        fn set_bit(&mut self, bit: u32, val: u64) {
            self.flags = (self.flags & !(1 << bit)) | ((val & 1) << bit);
        }
    }
}

use self::bindings::perf_event_attr;

pub const CPU_SETSIZE: usize = 1024;

fn unsupported() -> io::Error {
    io::Error::from_raw_os_error(libc::ENOSYS)
}

pub fn new_attr(type_: u32, config: u64) -> perf_event_attr {
    perf_event_attr {
        type_,
        size: bindings::PERF_ATTR_SIZE_VER0,
        config,
        ..Default::default()
    }
}

pub fn perf_event_open(
    _attr: &mut perf_event_attr,
    _pid: libc::pid_t,
    _cpu: libc::c_int,
) -> io::Result<OwnedFd> {
    Err(unsupported())
}

pub fn enable(_fd: BorrowedFd<'_>) -> io::Result<()> {
    Err(unsupported())
}

pub fn disable(_fd: BorrowedFd<'_>) -> io::Result<()> {
    Err(unsupported())
}

pub fn reset(_fd: BorrowedFd<'_>) -> io::Result<()> {
    Err(unsupported())
}

pub fn read_count(_fd: BorrowedFd<'_>) -> io::Result<u64> {
    Err(unsupported())
}

pub fn set_affinity(_core: usize) -> io::Result<()> {
    Err(unsupported())
}

pub fn set_fifo_priority(_priority: libc::c_int) -> io::Result<()> {
    Err(unsupported())
}

pub fn fifo_priority_range() -> (libc::c_int, libc::c_int) {
    (1, 99)
}
