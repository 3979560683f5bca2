//! Advisory report generation.
//!
//! When an alert episode starts the engine hands an [`AdvisoryContext`] to an
//! [`Advisor`] on a background task. The advisor returns either a structured
//! [`AdvisoryReport`] or a typed [`AdvisoryError`]; the engine forwards both
//! to observers and never retries.

mod gemini;
mod prompt;

pub use gemini::{GeminiAdvisor, parse_generate_response};
pub use prompt::{build_prompt, generate_request, report_schema};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;
use crate::model::SensorReading;

/// Sensor facts the advisory request is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryContext {
    pub sensor_id: String,
    pub location: String,
    pub water_height_cm: f64,
    pub flow_speed: Option<f64>,
    pub status: String,
}

impl From<&SensorReading> for AdvisoryContext {
    fn from(reading: &SensorReading) -> Self {
        Self {
            sensor_id: reading.id_sensor.clone(),
            location: reading.lokasi.clone(),
            water_height_cm: reading.ketinggian_air,
            flow_speed: reading.kecepatan_arus,
            status: reading.status.clone(),
        }
    }
}

/// Structured advisory for an alert episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    /// Short situation analysis.
    #[serde(rename = "analisis_singkat")]
    pub analysis: String,
    /// Recommended actions, in priority order.
    #[serde(rename = "rekomendasi_tindakan")]
    pub actions: Vec<String>,
    /// Public-facing message for residents.
    #[serde(rename = "pesan_untuk_warga")]
    pub public_message: String,
}

/// Produces an advisory report for a critical reading.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, ctx: &AdvisoryContext) -> Result<AdvisoryReport, AdvisoryError>;
}
