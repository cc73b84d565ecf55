#![allow(missing_docs)]

use std::{error, fmt, io};

use crate::paranoid_level;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    event: Option<&'static str>,
    cause: Option<Box<dyn error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An unknown error
    Unknown,

    /// The CPU, the kernel or the virtual machine does not expose the
    /// requested event.
    Unsupported,

    /// The provided event specification is not recognised, or the kernel
    /// rejected the attribute set built for it.
    InvalidEventSpec,

    /// The caller does not have the appropriate permissions.
    ///
    /// Usually caused by `/proc/sys/kernel/perf_event_paranoid` being set
    /// higher than the requested scope allows.
    Forbidden,

    /// The requested target PID does not exist.
    BadTarget,

    /// The requested CPU index is out of range for this system.
    BadCpu,

    /// The process ran out of file descriptors while opening counters.
    TooManyCounters,

    /// Reading the counter returned fewer than 8 bytes.
    ShortRead,

    /// An `ioctl` on an open counter failed.
    Control,

    /// `sched_setaffinity` failed.
    Affinity,

    /// `sched_setscheduler` failed.
    Scheduler,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unknown => "unknown error",
            ErrorKind::Unsupported => "event not supported on this system",
            ErrorKind::InvalidEventSpec => "invalid event specification",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::BadTarget => "target PID does not exist",
            ErrorKind::BadCpu => "CPU index out of range",
            ErrorKind::TooManyCounters => "too many open counters",
            ErrorKind::ShortRead => "short read from counter",
            ErrorKind::Control => "failed to control counter",
            ErrorKind::Affinity => "failed to set CPU affinity",
            ErrorKind::Scheduler => "failed to set real-time priority",
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.cause {
            None => None,
            Some(ref b) => Some(b.as_ref()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(event) = self.event {
            write!(f, "{}: ", event)?;
        }
        write!(f, "{}", self.kind.as_str())?;

        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }

        if self.kind == ErrorKind::Forbidden {
            if let Some(level) = paranoid_level() {
                write!(f, " (perf_event_paranoid is {})", level)?;
            }
        }

        Ok(())
    }
}

#[doc(hidden)]
impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        self.kind == other.kind
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The label of the event this error relates to, if any.
    pub fn event(&self) -> Option<&'static str> {
        self.event
    }

    pub(crate) fn for_event(self, name: &'static str) -> Error {
        Error {
            event: Some(name),
            ..self
        }
    }
}

pub(crate) fn from_io(kind: ErrorKind, err: io::Error) -> Error {
    Error {
        kind,
        event: None,
        cause: Some(Box::new(err)),
    }
}

pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error {
        kind,
        event: None,
        cause: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_event_and_cause() {
        let err = from_io(
            ErrorKind::Unsupported,
            io::Error::from_raw_os_error(libc::ENOENT),
        )
        .for_event("Data TLB Misses");

        let msg = err.to_string();
        assert!(msg.starts_with("Data TLB Misses: event not supported"), "{}", msg);
        assert_eq!(err.event(), Some("Data TLB Misses"));
    }

    #[test]
    fn test_eq_by_kind() {
        assert_eq!(
            new_error(ErrorKind::ShortRead),
            from_io(ErrorKind::ShortRead, io::Error::from_raw_os_error(libc::EIO))
        );
        assert_ne!(new_error(ErrorKind::ShortRead), new_error(ErrorKind::Control));
    }

    #[test]
    fn test_source_is_os_error() {
        use std::error::Error as _;

        let err = from_io(ErrorKind::Affinity, io::Error::from_raw_os_error(libc::EINVAL));
        let source = err.source().expect("missing cause");
        assert!(source.downcast_ref::<io::Error>().is_some());
        assert!(new_error(ErrorKind::Affinity).source().is_none());
    }
}
