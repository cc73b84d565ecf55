use std::panic::{self, AssertUnwindSafe};

use perfcount::error::*;
use perfcount::*;

// Containers and VMs often hide the PMU or block perf_event_open entirely;
// those are the only acceptable failures when opening counters.
fn expected_open_failure(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Unsupported | ErrorKind::Forbidden | ErrorKind::InvalidEventSpec
    )
}

// Open `events` for the calling process, or return None when this host
// cannot count them at all.
fn open_or_skip(events: &[Event]) -> Option<CounterSet> {
    match CounterSet::open(&CounterConfig::default(), events) {
        Ok(set) => Some(set),
        Err(err) if expected_open_failure(&err) => {
            eprintln!("skipping, no usable PMU: {}", err);
            None
        }
        Err(err) => panic!("unexpected error: {}", err),
    }
}

#[test]
fn test_open_demo_set_or_explain() {
    match CounterSet::open(&CounterConfig::default(), &Event::DEMO_SET) {
        Ok(set) => assert_eq!(set.counters().len(), Event::DEMO_SET.len()),
        Err(err) => {
            assert!(expected_open_failure(&err), "unexpected error: {}", err);
            assert!(err.event().is_some(), "error does not name the event");
        }
    }
}

#[test]
fn test_process_counter() {
    let set = match open_or_skip(&[Event::INSTRUCTIONS]) {
        Some(set) => set,
        None => return,
    };

    read_counter(&set.counters()[0]);
}

#[test]
#[ignore]
fn test_system_counter() {
    // Every process on CPU 0; needs CAP_PERFMON or perf_event_paranoid <= 0.
    let counter = CounterConfig::default()
        .attach_to(-1)
        .set_cpu(0)
        .allocate(Event::CPU_CYCLES)
        .expect("failed to open counter");

    read_counter(&counter);
}

#[test]
fn test_stopped_counter_does_not_advance() {
    let set = match open_or_skip(&[Event::CPU_CYCLES]) {
        Some(set) => set,
        None => return,
    };
    let counter = &set.counters()[0];

    let handle = counter.start().expect("failed to start counter");
    workload::branchy_sum(10_000);
    handle.stop().expect("failed to stop counter");

    let r1 = counter.read().unwrap();
    assert!(r1 > 0);
    workload::branchy_sum(10_000);
    assert_eq!(counter.read().unwrap(), r1);

    counter.reset().expect("failed to reset counter");
    assert_eq!(counter.read().unwrap(), 0);
}

#[test]
fn test_measure_reports_in_order() {
    let events = [Event::CPU_CYCLES, Event::INSTRUCTIONS, Event::BRANCH_MISSES];
    let set = match open_or_skip(&events) {
        Some(set) => set,
        None => return,
    };

    let (sum, report) = set
        .measure(|| workload::branchy_sum(workload::DEFAULT_ITERATIONS))
        .expect("failed to measure");

    assert_eq!(sum, workload::branchy_sum(workload::DEFAULT_ITERATIONS));

    let names: Vec<_> = report.readings().iter().map(|r| r.name).collect();
    assert_eq!(names, ["CPU Cycles", "Instructions", "Branch Mispredictions"]);

    // A million loop iterations cannot retire fewer than a million
    // instructions.
    assert!(report.get("Instructions").unwrap() >= 1_000_000);
}

#[test]
fn test_measure_disables_before_reading() {
    let set = match open_or_skip(&[Event::CPU_CYCLES, Event::INSTRUCTIONS]) {
        Some(set) => set,
        None => return,
    };

    let (_, report) = set
        .measure(|| workload::branchy_sum(100_000))
        .expect("failed to measure");

    // Nothing counts once measure() returns.
    workload::branchy_sum(100_000);
    assert_eq!(set.read().unwrap(), report);
}

#[test]
fn test_panicking_workload_disables_counters() {
    let set = match open_or_skip(&[Event::CPU_CYCLES]) {
        Some(set) => set,
        None => return,
    };

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        set.measure(|| panic!("workload failed")).ok();
    }));
    assert!(res.is_err());

    let before = set.read().unwrap().get("CPU Cycles").unwrap();
    workload::branchy_sum(100_000);
    assert_eq!(set.read().unwrap().get("CPU Cycles").unwrap(), before);
}

#[test]
fn test_bad_target() {
    // PIDs are capped well below i32::MAX by pid_max.
    let err = CounterConfig::default()
        .attach_to(i32::MAX)
        .allocate(Event::CPU_CYCLES)
        .expect_err("expected to fail opening counter");

    // Without access to perf_event_open at all the PID is never looked up.
    assert!(
        matches!(
            err.kind(),
            ErrorKind::BadTarget | ErrorKind::Forbidden | ErrorKind::Unsupported
        ),
        "unexpected error: {}",
        err
    );
    assert_eq!(err.event(), Some("CPU Cycles"));
}

fn read_counter(c: &Counter) {
    let handle = c.start().expect("failed to start counter");

    let mut last: u64 = 0;
    for _ in 1..100 {
        let now = handle.read().expect("unable to read counter");
        if now < last {
            panic!("counter decremented")
        }
        last = now;
    }
}
