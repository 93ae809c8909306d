//! Consistency checks for the denormalized `job_count` columns.
//!
//! The job workflow keeps every counter equal to the number of jobs that
//! reference its row. This module holds the pure logic for comparing the
//! stored value against a fresh count, used by `jobboard check-counters`.

use crate::jobs::Parent;
use serde::Serialize;
use uuid::Uuid;

/// One row whose stored counter and actual job count were compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSample {
    pub parent: Parent,
    pub id: Uuid,
    pub name: String,
    pub stored: i64,
    pub actual: i64,
}

/// A row whose stored counter disagrees with the jobs referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub entity: &'static str,
    pub id: Uuid,
    pub name: String,
    pub stored: i64,
    pub actual: i64,
}

impl CounterDrift {
    /// Stored minus actual. Positive means the counter is too high.
    pub fn delta(&self) -> i64 {
        self.stored - self.actual
    }
}

/// Summary of a counter check.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReport {
    pub checked: usize,
    pub drifted: Vec<CounterDrift>,
}

impl CounterReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one comparison.
    pub fn record(&mut self, sample: CounterSample) {
        self.checked += 1;
        if sample.stored != sample.actual {
            self.drifted.push(CounterDrift {
                entity: sample.parent.label(),
                id: sample.id,
                name: sample.name,
                stored: sample.stored,
                actual: sample.actual,
            });
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.drifted.is_empty()
    }

    /// Number of rows whose counter matched.
    pub fn consistent(&self) -> usize {
        self.checked - self.drifted.len()
    }
}

impl FromIterator<CounterSample> for CounterReport {
    fn from_iter<I: IntoIterator<Item = CounterSample>>(iter: I) -> Self {
        let mut report = CounterReport::new();
        for sample in iter {
            report.record(sample);
        }
        report
    }
}
