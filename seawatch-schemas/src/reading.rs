use crate::{sensor::SensorId, species::Species};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ReadingId = u64;

/// One observation emitted by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: ReadingId,
    pub sensor_id: SensorId,
    pub temperature: f64,
    /// Water transparency as a percentage in `0..=100`.
    pub transparency: u8,
    /// Species detected alongside this reading. May contain repeats.
    pub detected_species: Vec<Species>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub sensor_id: SensorId,
    pub temperature: f64,
    pub transparency: u8,
}
