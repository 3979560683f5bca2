//! Fan-out of engine events to observers, backed by a `tokio::sync::broadcast`
//! channel.
//!
//! Every event serializes as `{"event": <name>, "data": <payload>}` so a
//! dashboard can dispatch on the event name alone.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::advisory::AdvisoryReport;
use crate::error::AdvisoryFailure;
use crate::model::SensorReading;
use crate::state::{SystemSummary, TransitionLogEntry};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// A validated reading, forwarded as received.
    UpdateSensor(SensorReading),
    NewLog(TransitionLogEntry),
    /// Log replay for a newly attached observer, newest first.
    InitialLogs(Vec<TransitionLogEntry>),
    SystemSummary(SystemSummary),
    /// An alert episode started and an advisory was requested.
    GeneratingReport,
    GeminiReport(AdvisoryReport),
    GeminiError(AdvisoryFailure),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UpdateSensor(_) => "update_sensor",
            Event::NewLog(_) => "new_log",
            Event::InitialLogs(_) => "initial_logs",
            Event::SystemSummary(_) => "system_summary",
            Event::GeneratingReport => "generating_report",
            Event::GeminiReport(_) => "gemini_report",
            Event::GeminiError(_) => "gemini_error",
        }
    }
}

/// Cloneable publishing side of the event channel.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Event>,
}

impl Broadcaster {
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes to all current observers. With no observers the event is dropped.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeverityTier;

    #[tokio::test]
    async fn test_multiple_observers_receive_same_event() {
        let events = Broadcaster::default();
        let mut rx1 = events.subscribe();
        let mut rx2 = events.subscribe();

        events.publish(Event::GeneratingReport);

        assert_eq!(rx1.recv().await.unwrap(), Event::GeneratingReport);
        assert_eq!(rx2.recv().await.unwrap(), Event::GeneratingReport);
    }

    #[test]
    fn test_publish_without_observers_does_not_panic() {
        let events = Broadcaster::default();
        events.publish(Event::GeneratingReport);
        assert_eq!(events.observer_count(), 0);
    }

    #[test]
    fn test_event_wire_format() {
        let summary = SystemSummary {
            total_sensors: 1,
            safe: 0,
            watch: 0,
            critical: 1,
            highest: SeverityTier::Critical,
        };
        let value = serde_json::to_value(Event::SystemSummary(summary)).unwrap();
        assert_eq!(value["event"], "system_summary");
        assert_eq!(value["data"]["highest"], "Critical");

        let value = serde_json::to_value(Event::GeneratingReport).unwrap();
        assert_eq!(value["event"], "generating_report");
        assert_eq!(Event::GeneratingReport.name(), "generating_report");
    }

    #[test]
    fn test_update_sensor_forwards_message_fields_only() {
        let reading = crate::validate::parse_reading(
            br#"{"id_sensor":"sensor01","lokasi":"Hulu","ketinggian_air":120,"status":"Siaga"}"#,
        )
        .unwrap();
        let value = serde_json::to_value(Event::UpdateSensor(reading)).unwrap();

        assert_eq!(value["event"], "update_sensor");
        assert_eq!(value["data"]["id_sensor"], "sensor01");
        assert_eq!(value["data"]["status"], "Siaga");
        assert!(value["data"].get("tier").is_none());
    }
}
