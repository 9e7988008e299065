//! Bounded buffer of events waiting for the next flush.

use std::sync::Mutex;

use crate::decision::types::ExposureEvent;
use crate::observability::metrics;

#[derive(Debug)]
pub struct EventBuffer {
    events: Mutex<Vec<ExposureEvent>>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Queue an event. Returns false (and drops it) when the buffer is full.
    pub fn push(&self, event: ExposureEvent) -> bool {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if events.len() >= self.capacity {
            metrics::record_event_dropped();
            return false;
        }
        events.push(event);
        true
    }

    /// Take every queued event, leaving the buffer empty.
    pub fn drain(&self) -> Vec<ExposureEvent> {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *events)
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
