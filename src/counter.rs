use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use tracing::debug;

use crate::error::{from_io, Error, ErrorKind};
use crate::event::Event;
use crate::sys::{self, bindings::perf_event_attr};
use crate::{CPU_ANY, PID_SELF};

/// Configure event counter parameters.
///
/// Unless specified, a counter measures the calling process on any CPU, in
/// user space only.
///
/// ```no_run
/// use perfcount::{CounterConfig, Event};
///
/// let config = CounterConfig::default();
///
/// let cycles = config.allocate(Event::CPU_CYCLES)?;
/// let l1_misses = config.allocate(Event::L1D_MISSES)?;
/// #
/// # Ok::<(), perfcount::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pid: i32,
    cpu: i32,
    include_kernel: bool,
    include_hv: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        CounterConfig {
            pid: PID_SELF,
            cpu: CPU_ANY,
            include_kernel: false,
            include_hv: false,
        }
    }
}

impl CounterConfig {
    /// Specify the CPU number that the counter is restricted to.
    ///
    /// Defaults to all CPUs ([`CPU_ANY`]).
    ///
    /// [`CPU_ANY`]: constant.CPU_ANY.html
    pub fn set_cpu(self, cpu: i32) -> Self {
        Self { cpu, ..self }
    }

    /// Attach counters to the specified PID.
    ///
    /// # PID 0
    ///
    /// PID 0 is a magic value, attaching to it causes the counter to be
    /// attached to the current (caller's) PID. This is the default.
    pub fn attach_to(self, pid: i32) -> Self {
        Self { pid, ..self }
    }

    /// Count events that happen while the CPU is in kernel mode.
    ///
    /// Most systems require `perf_event_paranoid` <= 1 for this.
    pub fn include_kernel(self, include_kernel: bool) -> Self {
        Self {
            include_kernel,
            ..self
        }
    }

    /// Count events that happen inside the hypervisor.
    pub fn include_hv(self, include_hv: bool) -> Self {
        Self { include_hv, ..self }
    }

    /// Open a disabled counter for `event` with this configuration.
    pub fn allocate(&self, event: Event) -> Result<Counter, Error> {
        Counter::new(event, self)
    }

    pub(crate) fn attr_for(&self, event: Event) -> perf_event_attr {
        let mut attr = sys::new_attr(event.kind(), event.config());
        attr.set_disabled(1);
        attr.set_exclude_kernel(u64::from(!self.include_kernel));
        attr.set_exclude_hv(u64::from(!self.include_hv));
        attr
    }
}

/// A handle to a running counter.
///
/// Dropping this handle causes the counter to stop recording events.
pub struct Running<'a> {
    counter: &'a Counter,
}

impl<'a> Running<'a> {
    /// Read the current counter value.
    ///
    /// ```no_run
    /// use perfcount::{CounterConfig, Event};
    ///
    /// let counter = CounterConfig::default().allocate(Event::INSTRUCTIONS)?;
    /// let handle = counter.start()?;
    ///
    /// println!("instructions: {}", handle.read()?);
    /// #
    /// # Ok::<(), perfcount::error::Error>(())
    /// ```
    pub fn read(&self) -> Result<u64, Error> {
        self.counter.read()
    }

    /// Stop the counter from recording new events.
    pub fn stop(self) -> Result<(), Error> {
        let counter = self.counter;
        std::mem::forget(self);
        counter.disable()
    }
}

impl<'a> std::fmt::Display for Running<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.counter, f)
    }
}

impl<'a> Drop for Running<'a> {
    fn drop(&mut self) {
        if let Err(e) = self.counter.disable() {
            debug!(event = self.counter.event.name(), error = %e, "disable on drop failed");
        }
    }
}

/// An open hardware counter.
///
/// Counters are opened using the [`CounterConfig`] type and start out
/// disabled. The underlying file descriptor is closed when the counter is
/// dropped.
///
/// ```no_run
/// use perfcount::{CounterConfig, Event};
///
/// let misses = CounterConfig::default().allocate(Event::BRANCH_MISSES)?;
///
/// misses.reset()?;
/// let handle = misses.start()?;
/// // ... workload ...
/// handle.stop()?;
///
/// println!("branch misses: {}", misses.read()?);
/// #
/// # Ok::<(), perfcount::error::Error>(())
/// ```
#[derive(Debug)]
pub struct Counter {
    event: Event,
    fd: OwnedFd,
}

impl Counter {
    fn new(event: Event, config: &CounterConfig) -> Result<Self, Error> {
        let mut attr = config.attr_for(event);

        let fd = sys::perf_event_open(&mut attr, config.pid, config.cpu)
            .map_err(|e| open_error(e).for_event(event.name()))?;

        debug!(
            event = event.name(),
            kind = attr.type_,
            config = attr.config,
            pid = config.pid,
            cpu = config.cpu,
            "opened counter"
        );

        Ok(Counter { event, fd })
    }

    /// The event this counter was opened for.
    pub fn event(&self) -> Event {
        self.event
    }

    /// Zero the counter value.
    pub fn reset(&self) -> Result<(), Error> {
        self.control(sys::reset)
    }

    /// Start this counter.
    ///
    /// The counter stops when the returned [`Running`] handle is dropped.
    #[must_use = "counter only runs until handle is dropped"]
    pub fn start(&self) -> Result<Running<'_>, Error> {
        self.control(sys::enable)?;
        Ok(Running { counter: self })
    }

    /// Read the counter value.
    ///
    /// This call is valid for running, stopped and never-started counters.
    ///
    /// ```no_run
    /// use perfcount::{CounterConfig, Event};
    ///
    /// let counter = CounterConfig::default().allocate(Event::CPU_CYCLES)?;
    ///
    /// let r1 = counter.read()?;
    /// let r2 = counter.read()?;
    ///
    /// // A counter that is not running does not advance
    /// assert!(r2 == r1);
    /// #
    /// # Ok::<(), perfcount::error::Error>(())
    /// ```
    pub fn read(&self) -> Result<u64, Error> {
        sys::read_count(self.fd.as_fd()).map_err(|e| {
            let kind = match e.kind() {
                io::ErrorKind::UnexpectedEof => ErrorKind::ShortRead,
                _ => ErrorKind::Unknown,
            };
            from_io(kind, e).for_event(self.event.name())
        })
    }

    fn disable(&self) -> Result<(), Error> {
        self.control(sys::disable)
    }

    fn control(&self, op: fn(BorrowedFd<'_>) -> io::Result<()>) -> Result<(), Error> {
        op(self.fd.as_fd()).map_err(|e| from_io(ErrorKind::Control, e).for_event(self.event.name()))
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.read() {
            Ok(v) => write!(f, "{}", v),
            Err(e) => write!(f, "error: {}", e),
        }
    }
}

fn open_error(err: io::Error) -> Error {
    let kind = match err.raw_os_error() {
        Some(libc::ENOENT) | Some(libc::EOPNOTSUPP) | Some(libc::ENODEV) | Some(libc::ENOSYS) => {
            ErrorKind::Unsupported
        }
        Some(libc::EACCES) | Some(libc::EPERM) => ErrorKind::Forbidden,
        Some(libc::ESRCH) => ErrorKind::BadTarget,
        Some(libc::EINVAL) => ErrorKind::InvalidEventSpec,
        Some(libc::EMFILE) => ErrorKind::TooManyCounters,
        _ => ErrorKind::Unknown,
    };
    from_io(kind, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_attr() {
        let attr = CounterConfig::default().attr_for(Event::BRANCH_MISSES);

        assert_eq!(attr.type_, 0);
        assert_eq!(attr.config, 5);
        assert_eq!(attr.disabled(), 1);
        assert_eq!(attr.exclude_kernel(), 1);
        assert_eq!(attr.exclude_hv(), 1);
    }

    #[test]
    fn test_include_kernel_attr() {
        let attr = CounterConfig::default()
            .include_kernel(true)
            .include_hv(true)
            .attr_for(Event::CPU_CYCLES);

        assert_eq!(attr.disabled(), 1);
        assert_eq!(attr.exclude_kernel(), 0);
        assert_eq!(attr.exclude_hv(), 0);
    }

    #[test]
    fn test_open_error_mapping() {
        let kind = |errno| *open_error(io::Error::from_raw_os_error(errno)).kind();

        assert_eq!(kind(libc::ENOENT), ErrorKind::Unsupported);
        assert_eq!(kind(libc::EOPNOTSUPP), ErrorKind::Unsupported);
        assert_eq!(kind(libc::EACCES), ErrorKind::Forbidden);
        assert_eq!(kind(libc::EPERM), ErrorKind::Forbidden);
        assert_eq!(kind(libc::ESRCH), ErrorKind::BadTarget);
        assert_eq!(kind(libc::EINVAL), ErrorKind::InvalidEventSpec);
        assert_eq!(kind(libc::EMFILE), ErrorKind::TooManyCounters);
        assert_eq!(kind(libc::EBUSY), ErrorKind::Unknown);
    }
}
