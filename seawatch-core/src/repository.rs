//! Collaborator contracts consumed by the generation core and the read path.
//!
//! Every trait is object safe and `Send + Sync`; implementations are expected
//! to tolerate concurrent callers.

use crate::error::SeawatchError;
use async_trait::async_trait;
use seawatch_schemas::{
    group::{GroupFilters, GroupId, NewGroup, SensorGroup},
    reading::{NewReading, Reading, ReadingId},
    sensor::{Coordinates, NewSensor, Sensor, SensorFilters, SensorId},
    species::{NewSpecies, Species, SpeciesFilters, SpeciesId},
};
use std::{collections::HashMap, sync::Arc, time::Duration};

#[async_trait]
pub trait GroupCatalog: Send + Sync {
    async fn create_group(&self, group: NewGroup) -> Result<GroupId, SeawatchError>;
    async fn list_groups(&self, filters: &GroupFilters) -> Result<Vec<SensorGroup>, SeawatchError>;
}

#[async_trait]
pub trait SensorDirectory: Send + Sync {
    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, SeawatchError>;
    async fn list_sensors(&self, filters: &SensorFilters) -> Result<Vec<Sensor>, SeawatchError>;
    async fn move_sensor_to_group(&self, sensor_id: SensorId, group_name: &str) -> Result<(), SeawatchError>;
}

#[async_trait]
pub trait SpeciesCatalog: Send + Sync {
    async fn create_species(&self, species: NewSpecies) -> Result<SpeciesId, SeawatchError>;
    async fn list_species(&self, filters: &SpeciesFilters) -> Result<Vec<Species>, SeawatchError>;
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn create_reading(&self, reading: NewReading) -> Result<ReadingId, SeawatchError>;
    async fn attach_detected_species(&self, reading_id: ReadingId, species: &Species) -> Result<(), SeawatchError>;
    async fn find_reading(&self, reading_id: ReadingId) -> Result<Reading, SeawatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Aggregates over persisted readings. `None` means no reading matched.
#[async_trait]
pub trait ReadingQueries: Send + Sync {
    async fn average_temperature_in_group(&self, group_name: &str) -> Result<Option<f64>, SeawatchError>;
    async fn average_transparency_in_group(&self, group_name: &str) -> Result<Option<u8>, SeawatchError>;
    async fn average_temperature_for_sensor(&self, sensor_id: SensorId) -> Result<Option<f64>, SeawatchError>;
    async fn extremum_temperature_in_region(
        &self,
        min: &Coordinates,
        max: &Coordinates,
        extremum: Extremum,
    ) -> Result<Option<f64>, SeawatchError>;
    /// Detection counts per species name. `top_limit` keeps only the newest detections.
    async fn species_counts_in_group(
        &self,
        group_name: &str,
        filters: &GroupFilters,
    ) -> Result<HashMap<String, usize>, SeawatchError>;
}

/// String-valued key-value store with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SeawatchError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), SeawatchError>;
}

/// The set of collaborators the generation core works against.
#[derive(Clone)]
pub struct Services {
    pub groups: Arc<dyn GroupCatalog>,
    pub sensors: Arc<dyn SensorDirectory>,
    pub species: Arc<dyn SpeciesCatalog>,
    pub readings: Arc<dyn ReadingStore>,
}

impl Services {
    /// Uses one value for every collaborator, e.g. a `MemoryStore`.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: GroupCatalog + SensorDirectory + SpeciesCatalog + ReadingStore + 'static,
    {
        Self {
            groups: store.clone(),
            sensors: store.clone(),
            species: store.clone(),
            readings: store,
        }
    }

    pub fn with_readings(mut self, readings: Arc<dyn ReadingStore>) -> Self {
        self.readings = readings;
        self
    }
}
