use std::fmt;

/// A single counter value read after a measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// Label of the counted event.
    pub name: &'static str,
    /// Events counted between enable and disable.
    pub value: u64,
}

/// Counter values from one measurement, in the order the counters were
/// opened.
///
/// The `Display` impl prints one `Name: count` line per counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    readings: Vec<Reading>,
}

impl Report {
    pub(crate) fn new(readings: Vec<Reading>) -> Self {
        Report { readings }
    }

    /// All readings, in open order.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Look up the value recorded for the counter labelled `name`.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.readings
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.readings {
            writeln!(f, "{}: {}", r.name, r.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new(vec![
            Reading {
                name: "CPU Cycles",
                value: 1_234_567,
            },
            Reading {
                name: "Branch Mispredictions",
                value: 1_042,
            },
        ])
    }

    #[test]
    fn test_display() {
        assert_eq!(
            report().to_string(),
            "CPU Cycles: 1234567\nBranch Mispredictions: 1042\n"
        );
        assert_eq!(Report::default().to_string(), "");
    }

    #[test]
    fn test_get() {
        let r = report();
        assert_eq!(r.get("Branch Mispredictions"), Some(1_042));
        assert_eq!(r.get("TLB Misses"), None);
        assert_eq!(r.readings().len(), 2);
    }
}
