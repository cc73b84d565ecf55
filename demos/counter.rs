use std::thread;
use std::time::Duration;

use perfcount::*;

fn main() {
    // The default config counts this process, user space only, on any CPU.
    let counter = CounterConfig::default()
        .allocate(Event::INSTRUCTIONS)
        .expect("failed to open counter");

    // perf counters open disabled; start() issues the enable ioctl and the
    // returned guard issues the disable one when it goes out of scope.
    let handle = counter.start().expect("failed to start counter");

    for i in 1..10 {
        // Reading a live counter is fine, the value keeps climbing between
        // iterations.
        println!("iteration {}: {}", i, handle);
        thread::sleep(Duration::from_millis(100));
    }

    handle.stop().expect("failed to stop counter");

    // Frozen now: reading again later returns the same total.
    println!("retired instructions: {}", counter.read().unwrap());
}
