//! The ingestion pipeline.
//!
//! [`Engine`] is the single writer: each reading runs validate → upsert →
//! log → summarize → escalate to completion before the next one starts.
//! Readers go through a cloneable [`MonitorHandle`], which only ever sees a
//! state before or after a whole reading has been applied.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::advisory::{AdvisoryContext, Advisor};
use crate::broadcast::{Broadcaster, Event};
use crate::error::{AdvisoryError, ReadingError};
use crate::escalation::{Escalation, EscalationController, GateState};
use crate::model::{SensorReading, SensorState};
use crate::source::ReadingSource;
use crate::state::{SensorStateStore, SystemSummary, TransitionLog, TransitionLogEntry, summarize};
use crate::validate::{parse_reading, validate_reading};

#[derive(Debug, Default)]
struct CoreState {
    sensors: SensorStateStore,
    log: TransitionLog,
}

type SharedCore = Arc<RwLock<CoreState>>;

fn read(core: &SharedCore) -> RwLockReadGuard<'_, CoreState> {
    core.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(core: &SharedCore) -> RwLockWriteGuard<'_, CoreState> {
    core.write().unwrap_or_else(PoisonError::into_inner)
}

/// What one accepted reading did to the system.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub sensor_id: String,
    /// A transition log entry was appended.
    pub changed: bool,
    pub summary: SystemSummary,
    pub escalation: Escalation,
}

/// Counters for one [`Engine::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub accepted: usize,
    pub rejected: usize,
    pub transport_errors: usize,
}

/// An attached observer: the log as it was at attach time, then every
/// event published afterwards.
pub struct Observer {
    pub initial_logs: Vec<TransitionLogEntry>,
    pub events: broadcast::Receiver<Event>,
}

impl Observer {
    /// The replay event to send before streaming.
    pub fn replay(&self) -> Event {
        Event::InitialLogs(self.initial_logs.clone())
    }
}

/// Read-only access to live state, shareable across tasks.
#[derive(Clone)]
pub struct MonitorHandle {
    core: SharedCore,
    events: Broadcaster,
}

impl MonitorHandle {
    /// Attaches a new observer.
    ///
    /// The subscription is taken under the log read lock, and the engine
    /// publishes `new_log` under the write lock, so every entry is either in
    /// `initial_logs` or on the stream, never both and never neither.
    pub fn attach(&self) -> Observer {
        let core = read(&self.core);
        let events = self.events.subscribe();
        let initial_logs = core.log.entries();
        debug!(replayed = initial_logs.len(), "Observer attached");
        Observer { initial_logs, events }
    }

    pub fn sensors(&self) -> HashMap<String, SensorState> {
        read(&self.core).sensors.snapshot()
    }

    pub fn logs(&self) -> Vec<TransitionLogEntry> {
        read(&self.core).log.entries()
    }

    pub fn summary(&self) -> SystemSummary {
        summarize(read(&self.core).sensors.states())
    }
}

pub struct Engine {
    core: SharedCore,
    events: Broadcaster,
    gate: EscalationController,
    advisor: Option<Arc<dyn Advisor>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl Engine {
    /// An engine without an advisor still tracks episodes but dispatches nothing.
    pub fn new(advisor: Option<Arc<dyn Advisor>>) -> Self {
        Self::with_broadcaster(advisor, Broadcaster::default())
    }

    pub fn with_broadcaster(advisor: Option<Arc<dyn Advisor>>, events: Broadcaster) -> Self {
        Self {
            core: Arc::new(RwLock::new(CoreState::default())),
            events,
            gate: EscalationController::new(),
            advisor,
            in_flight: Vec::new(),
        }
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            core: Arc::clone(&self.core),
            events: self.events.clone(),
        }
    }

    pub fn gate(&self) -> &EscalationController {
        &self.gate
    }

    /// Decodes and applies one raw payload.
    ///
    /// Advisory requests are spawned on the current Tokio runtime. Called
    /// outside one, a dispatch is reported as an `unreachable` failure and
    /// the episode stays pending.
    pub fn process(&mut self, payload: &[u8]) -> Result<Processed, ReadingError> {
        let reading =
            parse_reading(payload).inspect_err(|e| warn!(error = %e, "Reading rejected"))?;
        Ok(self.apply(reading))
    }

    /// Applies one already-decoded message.
    pub fn process_value(&mut self, message: &Value) -> Result<Processed, ReadingError> {
        let reading =
            validate_reading(message).inspect_err(|e| warn!(error = %e, "Reading rejected"))?;
        Ok(self.apply(reading))
    }

    fn apply(&mut self, reading: SensorReading) -> Processed {
        debug!(
            sensor_id = %reading.id_sensor,
            status = %reading.status,
            height_cm = reading.ketinggian_air,
            "Reading accepted"
        );
        self.events.publish(Event::UpdateSensor(reading.clone()));

        let (changed, summary) = {
            let mut core = write(&self.core);
            let upsert = core.sensors.upsert(&reading);
            if upsert.changed {
                let entry = TransitionLogEntry::from_reading(&reading, Utc::now());
                info!(
                    sensor_id = %reading.id_sensor,
                    from = upsert.previous_label.as_deref().unwrap_or(""),
                    to = %reading.status,
                    "Sensor status changed"
                );
                core.log.append(entry.clone());
                self.events.publish(Event::NewLog(entry));
            }
            (upsert.changed, summarize(core.sensors.states()))
        };
        self.events.publish(Event::SystemSummary(summary.clone()));

        let escalation = self.gate.evaluate(summary.highest);
        match escalation {
            Escalation::Dispatch => {
                info!(
                    sensor_id = %reading.id_sensor,
                    critical = summary.critical,
                    "Alert episode started"
                );
                self.dispatch(&reading);
            }
            Escalation::Reset => {
                info!(highest = %summary.highest, "Alert episode ended, advisory gate reset");
            }
            Escalation::None => {}
        }

        Processed {
            sensor_id: reading.id_sensor,
            changed,
            summary,
            escalation,
        }
    }

    fn dispatch(&mut self, reading: &SensorReading) {
        let Some(advisor) = self.advisor.clone() else {
            warn!("No advisor configured, skipping advisory request");
            return;
        };
        self.events.publish(Event::GeneratingReport);

        let Ok(runtime) = Handle::try_current() else {
            let e = AdvisoryError::Unreachable("no async runtime for the request".to_string());
            error!(error = %e, "Advisory request failed");
            self.events.publish(Event::GeminiError(e.to_failure()));
            return;
        };

        let ctx = AdvisoryContext::from(reading);
        let events = self.events.clone();
        let span = tracing::info_span!(
            "advisory",
            sensor_id = %ctx.sensor_id,
            location = %ctx.location
        );

        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(runtime.spawn(
            async move {
                match advisor.advise(&ctx).await {
                    Ok(report) => {
                        info!(actions = report.actions.len(), "Advisory report received");
                        events.publish(Event::GeminiReport(report));
                    }
                    Err(e) => {
                        error!(error = %e, "Advisory request failed");
                        events.publish(Event::GeminiError(e.to_failure()));
                    }
                }
            }
            .instrument(span),
        ));
    }

    /// Applies every payload from `source` until it is exhausted.
    ///
    /// Transport errors are logged and skipped; they never end the run.
    #[tracing::instrument(skip_all)]
    pub async fn run<S: ReadingSource + ?Sized>(&mut self, source: &mut S) -> RunStats {
        let mut stats = RunStats::default();

        while let Some(message) = source.next_message().await {
            match message {
                Ok(payload) => match self.process(&payload) {
                    Ok(_) => stats.accepted += 1,
                    Err(_) => stats.rejected += 1,
                },
                Err(e) => {
                    stats.transport_errors += 1;
                    warn!(error = %e, "Transport error, continuing");
                }
            }
        }

        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            transport_errors = stats.transport_errors,
            gate_pending = self.gate.state() == GateState::Pending,
            "Source exhausted"
        );
        stats
    }

    /// Waits for every advisory task spawned so far.
    pub async fn drain(&mut self) {
        for task in self.in_flight.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "Advisory task panicked");
            }
        }
    }
}
