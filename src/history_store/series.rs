// Bounded FIFO of readings for one metric

use crate::models::Reading;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HistorySeries {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl HistorySeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Grows on demand.
            readings: VecDeque::new(),
            capacity,
        }
    }

    /// Appends and evicts from the front until within capacity.
    /// Returns how many readings were evicted.
    pub fn push(&mut self, reading: Reading) -> usize {
        self.readings.push_back(reading);
        let mut evicted = 0;
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// Readings strictly newer than `cutoff`, oldest first.
    pub fn since(&self, cutoff: u64) -> Vec<Reading> {
        // Time-ordered, so the first kept reading can be binary searched.
        let start = self.readings.partition_point(|r| r.timestamp <= cutoff);
        self.readings.range(start..).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }
}
