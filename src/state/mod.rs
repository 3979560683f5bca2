//! Live sensor state: the per-sensor table, the transition log and the
//! summary derived from them.

pub mod log;
pub mod store;
pub mod summary;

pub use log::{LOG_CAPACITY, TransitionLog, TransitionLogEntry};
pub use store::{SensorStateStore, Upsert};
pub use summary::{SystemSummary, summarize};
