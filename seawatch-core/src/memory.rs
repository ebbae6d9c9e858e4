//! In-process implementation of every store contract.

use crate::{
    error::SeawatchError,
    repository::{Extremum, GroupCatalog, ReadingQueries, ReadingStore, SensorDirectory, SpeciesCatalog},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seawatch_schemas::{
    group::{GroupFilters, GroupId, NewGroup, SensorGroup},
    reading::{NewReading, Reading, ReadingId},
    sensor::{Coordinates, NewSensor, Sensor, SensorFilters, SensorId},
    species::{NewSpecies, Species, SpeciesFilters, SpeciesId},
};
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Default)]
struct Tables {
    groups: Vec<SensorGroup>,
    sensors: Vec<Sensor>,
    species: Vec<Species>,
    // A reading's id is its position plus one.
    readings: Vec<Reading>,
}

impl Tables {
    fn group_by_name(&self, name: &str) -> Result<&SensorGroup, SeawatchError> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| SeawatchError::GroupNotFound(name.to_string()))
    }

    fn readings_of<'a>(&'a self, sensor_ids: &'a [SensorId]) -> impl DoubleEndedIterator<Item = &'a Reading> + 'a {
        self.readings.iter().filter(move |r| sensor_ids.contains(&r.sensor_id))
    }

    fn sensor_ids_in_group(&self, group_id: GroupId) -> Vec<SensorId> {
        self.sensors
            .iter()
            .filter(|s| s.group_id == group_id)
            .map(|s| s.id)
            .collect()
    }
}

/// Keeps groups, sensors, species and readings in memory behind one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, SeawatchError> {
        self.tables.read().map_err(|_| SeawatchError::StorePoisoned("memory"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, SeawatchError> {
        self.tables.write().map_err(|_| SeawatchError::StorePoisoned("memory"))
    }

    /// Number of readings persisted so far.
    pub fn reading_count(&self) -> Result<usize, SeawatchError> {
        Ok(self.read()?.readings.len())
    }

    pub fn readings_for_sensor(&self, sensor_id: SensorId) -> Result<Vec<Reading>, SeawatchError> {
        Ok(self
            .read()?
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id)
            .cloned()
            .collect())
    }
}

fn in_window(at: &DateTime<Utc>, from: &Option<DateTime<Utc>>, till: &Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |from| *at >= from) && till.map_or(true, |till| *at <= till)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[async_trait]
impl GroupCatalog for MemoryStore {
    async fn create_group(&self, group: NewGroup) -> Result<GroupId, SeawatchError> {
        let mut tables = self.write()?;
        if tables.groups.iter().any(|g| g.name == group.name) {
            return Err(SeawatchError::DuplicateGroup(group.name));
        }

        let now = Utc::now();
        let id = tables.groups.len() as GroupId + 1;
        tables.groups.push(SensorGroup {
            id,
            name: group.name,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list_groups(&self, filters: &GroupFilters) -> Result<Vec<SensorGroup>, SeawatchError> {
        let tables = self.read()?;
        let groups = tables
            .groups
            .iter()
            .filter(|g| in_window(&g.created_at, &filters.from_date, &filters.till_date))
            .take(filters.top_limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(groups)
    }
}

#[async_trait]
impl SensorDirectory for MemoryStore {
    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, SeawatchError> {
        let mut tables = self.write()?;
        let group_id = tables.group_by_name(&sensor.codename.group_name)?.id;
        if tables.sensors.iter().any(|s| s.codename == sensor.codename) {
            return Err(SeawatchError::DuplicateSensor(sensor.codename));
        }

        let now = Utc::now();
        let id = tables.sensors.len() as SensorId + 1;
        tables.sensors.push(Sensor {
            id,
            group_id,
            codename: sensor.codename,
            coordinates: sensor.coordinates,
            data_output_rate: sensor.data_output_rate,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list_sensors(&self, filters: &SensorFilters) -> Result<Vec<Sensor>, SeawatchError> {
        let tables = self.read()?;
        let sensors = tables
            .sensors
            .iter()
            .filter(|s| filters.codename.as_ref().map_or(true, |c| *c == s.codename))
            .filter(|s| in_window(&s.created_at, &filters.from_date, &filters.till_date))
            .cloned()
            .collect();
        Ok(sensors)
    }

    async fn move_sensor_to_group(&self, sensor_id: SensorId, group_name: &str) -> Result<(), SeawatchError> {
        let mut tables = self.write()?;
        let group_id = tables.group_by_name(group_name)?.id;

        let index = tables
            .sensors
            .iter()
            .position(|s| s.id == sensor_id)
            .ok_or(SeawatchError::SensorNotFound(sensor_id))?;

        let mut codename = tables.sensors[index].codename.clone();
        codename.group_name = group_name.to_string();
        if tables.sensors.iter().any(|s| s.id != sensor_id && s.codename == codename) {
            return Err(SeawatchError::DuplicateSensor(codename));
        }

        let sensor = &mut tables.sensors[index];
        sensor.group_id = group_id;
        sensor.codename = codename;
        sensor.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl SpeciesCatalog for MemoryStore {
    async fn create_species(&self, species: NewSpecies) -> Result<SpeciesId, SeawatchError> {
        let mut tables = self.write()?;
        if tables.species.iter().any(|s| s.name == species.name) {
            return Err(SeawatchError::DuplicateSpecies(species.name));
        }

        let now = Utc::now();
        let id = tables.species.len() as SpeciesId + 1;
        tables.species.push(Species {
            id,
            name: species.name,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list_species(&self, filters: &SpeciesFilters) -> Result<Vec<Species>, SeawatchError> {
        let tables = self.read()?;
        Ok(tables
            .species
            .iter()
            .take(filters.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn create_reading(&self, reading: NewReading) -> Result<ReadingId, SeawatchError> {
        let mut tables = self.write()?;
        if !tables.sensors.iter().any(|s| s.id == reading.sensor_id) {
            return Err(SeawatchError::SensorNotFound(reading.sensor_id));
        }

        let now = Utc::now();
        let id = tables.readings.len() as ReadingId + 1;
        tables.readings.push(Reading {
            id,
            sensor_id: reading.sensor_id,
            temperature: reading.temperature,
            transparency: reading.transparency,
            detected_species: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn attach_detected_species(&self, reading_id: ReadingId, species: &Species) -> Result<(), SeawatchError> {
        let mut tables = self.write()?;
        let reading = reading_id
            .checked_sub(1)
            .and_then(|index| tables.readings.get_mut(index as usize))
            .ok_or(SeawatchError::ReadingNotFound(reading_id))?;
        reading.detected_species.push(species.clone());
        Ok(())
    }

    async fn find_reading(&self, reading_id: ReadingId) -> Result<Reading, SeawatchError> {
        let tables = self.read()?;
        reading_id
            .checked_sub(1)
            .and_then(|index| tables.readings.get(index as usize))
            .cloned()
            .ok_or(SeawatchError::ReadingNotFound(reading_id))
    }
}

#[async_trait]
impl ReadingQueries for MemoryStore {
    async fn average_temperature_in_group(&self, group_name: &str) -> Result<Option<f64>, SeawatchError> {
        let tables = self.read()?;
        let sensor_ids = tables.sensor_ids_in_group(tables.group_by_name(group_name)?.id);
        Ok(mean(tables.readings_of(&sensor_ids).map(|r| r.temperature)))
    }

    async fn average_transparency_in_group(&self, group_name: &str) -> Result<Option<u8>, SeawatchError> {
        let tables = self.read()?;
        let sensor_ids = tables.sensor_ids_in_group(tables.group_by_name(group_name)?.id);
        let average = mean(tables.readings_of(&sensor_ids).map(|r| r.transparency as f64));
        // Truncated like an integer column average.
        Ok(average.map(|avg| avg as u8))
    }

    async fn average_temperature_for_sensor(&self, sensor_id: SensorId) -> Result<Option<f64>, SeawatchError> {
        let tables = self.read()?;
        if !tables.sensors.iter().any(|s| s.id == sensor_id) {
            return Err(SeawatchError::SensorNotFound(sensor_id));
        }
        Ok(mean(tables.readings_of(&[sensor_id]).map(|r| r.temperature)))
    }

    async fn extremum_temperature_in_region(
        &self,
        min: &Coordinates,
        max: &Coordinates,
        extremum: Extremum,
    ) -> Result<Option<f64>, SeawatchError> {
        let tables = self.read()?;
        let sensor_ids: Vec<SensorId> = tables
            .sensors
            .iter()
            .filter(|s| s.coordinates.within(min, max))
            .map(|s| s.id)
            .collect();

        let temperatures = tables.readings_of(&sensor_ids).map(|r| r.temperature);
        Ok(match extremum {
            Extremum::Min => temperatures.reduce(f64::min),
            Extremum::Max => temperatures.reduce(f64::max),
        })
    }

    async fn species_counts_in_group(
        &self,
        group_name: &str,
        filters: &GroupFilters,
    ) -> Result<HashMap<String, usize>, SeawatchError> {
        let tables = self.read()?;
        let sensor_ids = tables.sensor_ids_in_group(tables.group_by_name(group_name)?.id);

        // Readings are stored in creation order, so walking backwards yields the newest detections first.
        let detections = tables
            .readings_of(&sensor_ids)
            .rev()
            .filter(|r| in_window(&r.created_at, &filters.from_date, &filters.till_date))
            .flat_map(|r| &r.detected_species)
            .take(filters.top_limit.unwrap_or(usize::MAX));

        let mut counts = HashMap::new();
        for species in detections {
            *counts.entry(species.name.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
