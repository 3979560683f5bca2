use std::collections::HashMap;

use crate::model::{SensorReading, SensorState};

/// Result of applying one reading to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    /// Label held before this reading, `None` for a sensor seen for the first time.
    pub previous_label: Option<String>,
    /// `true` when a previous label existed and differs byte-for-byte.
    pub changed: bool,
}

/// Latest known state per sensor id.
///
/// Entries are created on first sight and updated in place; nothing is
/// evicted. `last_update` is kept per entry so expiry can be layered on.
#[derive(Debug, Default, Clone)]
pub struct SensorStateStore {
    sensors: HashMap<String, SensorState>,
}

impl SensorStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, reading: &SensorReading) -> Upsert {
        let next = SensorState {
            tier: reading.tier,
            label: reading.status.clone(),
            location: reading.lokasi.clone(),
            last_update: reading.timestamp,
        };

        match self.sensors.insert(reading.id_sensor.clone(), next) {
            Some(prev) => {
                let changed = prev.label != reading.status;
                Upsert {
                    previous_label: Some(prev.label),
                    changed,
                }
            }
            None => Upsert {
                previous_label: None,
                changed: false,
            },
        }
    }

    pub fn get(&self, sensor_id: &str) -> Option<&SensorState> {
        self.sensors.get(sensor_id)
    }

    /// Point-in-time copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, SensorState> {
        self.sensors.clone()
    }

    pub fn states(&self) -> impl Iterator<Item = &SensorState> {
        self.sensors.values()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
