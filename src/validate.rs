//! Validation of decoded sensor messages.
//!
//! Only the sensor id, the water height and the status label gate
//! acceptance. Everything else is passed through best-effort: a missing
//! location or a malformed `coords` object degrades what observers see but
//! never rejects the reading.

use serde_json::Value;

use crate::error::ReadingError;
use crate::model::{Coords, MAX_WATER_HEIGHT_CM, MIN_WATER_HEIGHT_CM, SensorReading, SeverityTier};

/// Decodes a raw payload and validates it.
pub fn parse_reading(payload: &[u8]) -> Result<SensorReading, ReadingError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| ReadingError::Decode(e.to_string()))?;
    validate_reading(&value)
}

/// Validates an already-decoded message.
pub fn validate_reading(value: &Value) -> Result<SensorReading, ReadingError> {
    let obj = value.as_object().ok_or(ReadingError::NotAnObject)?;

    let id_sensor = obj
        .get("id_sensor")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or(ReadingError::MissingSensorId)?
        .to_string();

    let ketinggian_air = obj
        .get("ketinggian_air")
        .and_then(Value::as_f64)
        .ok_or(ReadingError::WaterHeightNotNumeric)?;
    if !(MIN_WATER_HEIGHT_CM..=MAX_WATER_HEIGHT_CM).contains(&ketinggian_air) {
        return Err(ReadingError::WaterHeightOutOfRange(ketinggian_air));
    }

    let status = obj.get("status").and_then(Value::as_str).unwrap_or("");
    let tier = SeverityTier::classify(status)
        .ok_or_else(|| ReadingError::UnknownStatus(status.to_string()))?;

    let coords = obj.get("coords").and_then(|c| {
        Some(Coords {
            lat: c.get("lat")?.as_f64()?,
            lon: c.get("lon")?.as_f64()?,
        })
    });

    Ok(SensorReading {
        id_sensor,
        lokasi: obj.get("lokasi").and_then(Value::as_str).unwrap_or("").to_string(),
        ketinggian_air,
        kecepatan_arus: obj.get("kecepatan_arus").and_then(Value::as_f64),
        status: status.to_string(),
        coords,
        timestamp: obj.get("timestamp").and_then(Value::as_f64),
        tier,
    })
}
