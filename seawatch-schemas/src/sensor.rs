use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::group::GroupId;

pub type SensorId = u64;

/// Human-readable identifier of a sensor, unique within its group (e.g. "alpha 2").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Codename {
    pub group_name: String,
    pub index: u32,
}

impl Codename {
    pub fn new(group_name: impl Into<String>, index: u32) -> Self {
        Self {
            group_name: group_name.into(),
            index,
        }
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.group_name, self.index)
    }
}

/// Position of a sensor. `z` is the depth in meters below the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn depth(&self) -> f64 {
        self.z
    }

    /// True when the point lies inside the axis-aligned box spanned by `min` and `max`.
    pub fn within(&self, min: &Coordinates, max: &Coordinates) -> bool {
        (min.x..=max.x).contains(&self.x)
            && (min.y..=max.y).contains(&self.y)
            && (min.z..=max.z).contains(&self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub group_id: GroupId,
    pub codename: Codename,
    pub coordinates: Coordinates,
    /// Seconds between two consecutive readings.
    pub data_output_rate: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sensor {
    pub fn output_interval(&self) -> Duration {
        Duration::from_secs(self.data_output_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    pub codename: Codename,
    pub coordinates: Coordinates,
    pub data_output_rate: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFilters {
    pub codename: Option<Codename>,
    pub from_date: Option<DateTime<Utc>>,
    pub till_date: Option<DateTime<Utc>>,
}
