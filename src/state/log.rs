use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::model::{SensorReading, SeverityTier};

/// Maximum number of entries kept in the transition log.
pub const LOG_CAPACITY: usize = 20;

/// One status change of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionLogEntry {
    /// UTC, `%Y-%m-%d %H:%M:%S`.
    pub time: String,
    pub sensor_id: String,
    pub location: String,
    pub status: String,
    pub tier: SeverityTier,
}

impl TransitionLogEntry {
    /// Builds an entry from the reading that carried the new label.
    ///
    /// The sensor timestamp is used when present and representable,
    /// otherwise `received_at`.
    pub fn from_reading(reading: &SensorReading, received_at: DateTime<Utc>) -> Self {
        let at = reading
            .timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp_millis((ts * 1000.0) as i64))
            .unwrap_or(received_at);

        TransitionLogEntry {
            time: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            sensor_id: reading.id_sensor.clone(),
            location: reading.lokasi.clone(),
            status: reading.status.clone(),
            tier: reading.tier,
        }
    }
}

/// Bounded log of the most recent transitions, newest first.
#[derive(Debug, Clone)]
pub struct TransitionLog {
    entries: VecDeque<TransitionLogEntry>,
    capacity: usize,
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Inserts at the head, evicting the oldest entry once full.
    pub fn append(&mut self, entry: TransitionLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest-first copy for replay.
    pub fn entries(&self) -> Vec<TransitionLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
