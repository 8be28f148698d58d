//! Batch polling over the raw collector.

use crate::input::raw::{RawInputCollector, RawInputEvent};
use std::time::Duration;

/// Drains every event currently available from a collector.
pub struct InputService {
    collector: RawInputCollector,
}

impl InputService {
    pub fn new() -> Self {
        Self {
            collector: RawInputCollector::new(),
        }
    }

    /// Wait up to `timeout` for input and return everything that is ready.
    pub fn poll_events(&mut self, timeout: Option<Duration>) -> crate::Result<Vec<RawInputEvent>> {
        let mut events = Vec::new();
        if let Some(event) = self.collector.poll_event(timeout)? {
            events.push(event);
            while let Some(extra) = self.collector.try_next() {
                events.push(extra);
            }
        }
        Ok(events)
    }
}

impl Default for InputService {
    fn default() -> Self {
        Self::new()
    }
}
