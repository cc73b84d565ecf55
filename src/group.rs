use tracing::{debug, info};

use crate::counter::{Counter, CounterConfig, Running};
use crate::error::Error;
use crate::event::Event;
use crate::report::{Reading, Report};

/// A set of independently opened counters that are started, stopped and
/// read together around a workload.
///
/// ```no_run
/// use perfcount::{CounterConfig, CounterSet, Event};
///
/// let set = CounterSet::open(&CounterConfig::default(), &Event::DEMO_SET)?;
/// let (_, report) = set.measure(|| (0..1000u64).sum::<u64>())?;
///
/// print!("{}", report);
/// #
/// # Ok::<(), perfcount::error::Error>(())
/// ```
#[derive(Debug)]
pub struct CounterSet {
    counters: Vec<Counter>,
}

impl CounterSet {
    /// Open one counter per event, in order.
    ///
    /// Fails on the first event that cannot be opened; the returned error
    /// names that event. Counters opened before the failure are closed.
    pub fn open(config: &CounterConfig, events: &[Event]) -> Result<Self, Error> {
        let counters = events
            .iter()
            .map(|&event| config.allocate(event))
            .collect::<Result<Vec<_>, _>>()?;

        info!(counters = counters.len(), "opened counters");

        Ok(CounterSet { counters })
    }

    /// The open counters, in the order their events were given.
    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    /// Reset and enable every counter, run `workload`, disable every counter
    /// and read the values.
    ///
    /// If `workload` panics the counters are still disabled as the panic
    /// unwinds.
    pub fn measure<F, R>(&self, workload: F) -> Result<(R, Report), Error>
    where
        F: FnOnce() -> R,
    {
        let mut running: Vec<Running<'_>> = Vec::with_capacity(self.counters.len());
        for c in &self.counters {
            c.reset()?;
            running.push(c.start()?);
        }
        debug!("counters enabled");

        let out = workload();

        for handle in running {
            handle.stop()?;
        }
        debug!("counters disabled");

        let report = self.read()?;
        Ok((out, report))
    }

    /// Read every counter without touching its enabled state.
    pub fn read(&self) -> Result<Report, Error> {
        self.counters
            .iter()
            .map(|c| {
                Ok(Reading {
                    name: c.event().name(),
                    value: c.read()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()
            .map(Report::new)
    }
}
