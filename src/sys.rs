//! Thin safe wrappers over `perf_event_open(2)` and the scheduler calls.
//!
//! Kernel definitions come from `perf-event-open-sys`; this module only turns
//! raw return values into `io::Result`s and owned descriptors.

#[cfg(target_os = "linux")]
pub(crate) use perf_event_open_sys::bindings;

#[cfg(not(target_os = "linux"))]
pub(crate) use crate::stubs::*;

#[cfg(target_os = "linux")]
mod linux {
    use std::io;
    use std::mem;
    use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

    use perf_event_open_sys::bindings::{perf_event_attr, PERF_FLAG_FD_CLOEXEC};
    use perf_event_open_sys::ioctls;

    pub const CPU_SETSIZE: usize = libc::CPU_SETSIZE as usize;

    /// A zeroed attribute set for `(type_, config)` with `size` filled in.
    pub fn new_attr(type_: u32, config: u64) -> perf_event_attr {
        perf_event_attr {
            type_,
            size: mem::size_of::<perf_event_attr>() as u32,
            config,
            ..perf_event_attr::default()
        }
    }

    /// Open a counter for `pid` on `cpu`, outside any group.
    pub fn perf_event_open(
        attr: &mut perf_event_attr,
        pid: libc::pid_t,
        cpu: libc::c_int,
    ) -> io::Result<OwnedFd> {
        let fd = unsafe {
            perf_event_open_sys::perf_event_open(attr, pid, cpu, -1, PERF_FLAG_FD_CLOEXEC.into())
        };

        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        // The kernel handed us a fresh descriptor that nothing else owns.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    pub fn enable(fd: BorrowedFd<'_>) -> io::Result<()> {
        check(unsafe { ioctls::ENABLE(fd.as_raw_fd(), 0) })
    }

    pub fn disable(fd: BorrowedFd<'_>) -> io::Result<()> {
        check(unsafe { ioctls::DISABLE(fd.as_raw_fd(), 0) })
    }

    pub fn reset(fd: BorrowedFd<'_>) -> io::Result<()> {
        check(unsafe { ioctls::RESET(fd.as_raw_fd(), 0) })
    }

    fn check(ret: libc::c_int) -> io::Result<()> {
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn read_count(fd: BorrowedFd<'_>) -> io::Result<u64> {
        let mut value: u64 = 0;
        let n = unsafe {
            libc::read(
                fd.as_raw_fd(),
                &mut value as *mut u64 as *mut libc::c_void,
                mem::size_of::<u64>(),
            )
        };

        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != mem::size_of::<u64>() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read {} of 8 bytes", n),
            ));
        }

        Ok(value)
    }

    pub fn set_affinity(core: usize) -> io::Result<()> {
        let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
        unsafe { libc::CPU_SET(core, &mut set) };

        if unsafe { libc::sched_setaffinity(0, mem::size_of::<libc::cpu_set_t>(), &set) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn set_fifo_priority(priority: libc::c_int) -> io::Result<()> {
        let mut param: libc::sched_param = unsafe { mem::zeroed() };
        param.sched_priority = priority;

        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn fifo_priority_range() -> (libc::c_int, libc::c_int) {
        unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        }
    }
}

#[cfg(target_os = "linux")]
pub(crate) use self::linux::*;
