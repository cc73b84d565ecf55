//! Process placement helpers used to reduce measurement noise.

use tracing::debug;

use crate::error::{from_io, new_error, Error, ErrorKind};
use crate::sys;

/// The highest `SCHED_FIFO` priority on Linux.
pub const MAX_RT_PRIORITY: i32 = 99;

/// Pin the calling process to a single CPU core.
///
/// Keeping the process on one core stops the scheduler migrating it mid
/// measurement, which would otherwise show up as cold caches.
pub fn pin_to_core(core: usize) -> Result<(), Error> {
    if core >= sys::CPU_SETSIZE {
        return Err(new_error(ErrorKind::BadCpu));
    }

    sys::set_affinity(core).map_err(|e| {
        let kind = match e.raw_os_error() {
            // The mask contains no CPU that is online and permitted.
            Some(libc::EINVAL) => ErrorKind::BadCpu,
            _ => ErrorKind::Affinity,
        };
        from_io(kind, e)
    })?;

    debug!(core, "pinned to core");
    Ok(())
}

/// Switch the calling process to `SCHED_FIFO` at `priority`.
///
/// Requires `CAP_SYS_NICE` (or root) on most systems.
pub fn set_realtime_priority(priority: i32) -> Result<(), Error> {
    let (min, max) = sys::fifo_priority_range();
    if priority < min || priority > max {
        return Err(from_io(
            ErrorKind::Scheduler,
            std::io::Error::from_raw_os_error(libc::EINVAL),
        ));
    }

    sys::set_fifo_priority(priority).map_err(|e| from_io(ErrorKind::Scheduler, e))?;

    debug!(priority, "switched to SCHED_FIFO");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_out_of_range() {
        let err = pin_to_core(sys::CPU_SETSIZE).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BadCpu);
    }

    #[test]
    fn test_priority_out_of_range() {
        let err = set_realtime_priority(MAX_RT_PRIORITY + 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Scheduler);

        let err = set_realtime_priority(0).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Scheduler);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_pin_to_core_zero() {
        // Core 0 may be excluded by a cgroup cpuset; only check the error kind
        // when it is.
        match pin_to_core(0) {
            Ok(()) => {}
            Err(e) => assert_eq!(e.kind(), &ErrorKind::BadCpu),
        }
    }
}
