//! Core data types shared by the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted water height, in centimeters.
pub const MIN_WATER_HEIGHT_CM: f64 = 0.0;

/// Highest accepted water height, in centimeters.
pub const MAX_WATER_HEIGHT_CM: f64 = 1000.0;

/// Severity of a sensor status, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityTier {
    Safe = 1,
    Watch = 2,
    Critical = 3,
}

impl SeverityTier {
    /// Classifies a raw status label by its word tags.
    ///
    /// Tags are matched as whole alphabetic tokens, ignoring case, so
    /// `"🚨 AWAS"` and `"critical"` both map to [`SeverityTier::Critical`].
    /// When a label carries more than one tag the most severe one wins.
    /// Returns `None` for labels without any known tag.
    pub fn classify(label: &str) -> Option<SeverityTier> {
        label
            .split(|c: char| !c.is_alphabetic())
            .filter(|token| !token.is_empty())
            .filter_map(|token| match token.to_lowercase().as_str() {
                "aman" | "safe" => Some(SeverityTier::Safe),
                "siaga" | "watch" => Some(SeverityTier::Watch),
                "awas" | "critical" => Some(SeverityTier::Critical),
                _ => None,
            })
            .max()
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityTier::Safe => write!(f, "SAFE"),
            SeverityTier::Watch => write!(f, "WATCH"),
            SeverityTier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Geographic position of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

/// A validated reading from a single river-level sensor.
///
/// Field names follow the inbound message format so that the reading can be
/// forwarded to observers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub id_sensor: String,
    pub lokasi: String,
    /// Water height in centimeters.
    pub ketinggian_air: f64,
    /// Flow speed in m/s.
    pub kecepatan_arus: Option<f64>,
    pub status: String,
    pub coords: Option<Coords>,
    /// Epoch seconds as reported by the sensor.
    pub timestamp: Option<f64>,
    /// Tier classified from `status` at validation time.
    #[serde(skip)]
    pub tier: SeverityTier,
}

/// Latest known status of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub tier: SeverityTier,
    pub label: String,
    pub location: String,
    /// Epoch seconds of the last accepted reading.
    pub last_update: Option<f64>,
}
