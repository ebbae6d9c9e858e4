use crate::{error::SeawatchError, repository::ReadingStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::Writer;
use seawatch_schemas::{
    reading::{NewReading, Reading, ReadingId},
    sensor::SensorId,
    species::Species,
};
use serde::{Deserialize, Serialize};
use std::{fs, sync::Arc, sync::Mutex};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub reading_id: ReadingId,
    pub sensor_id: SensorId,
    pub temperature: f64,
    pub transparency: u8,
    pub recorded_at: DateTime<Utc>,
}

/// Appends one CSV row per persisted reading.
pub struct ReadingLog {
    path: String,
    writer: Mutex<Writer<fs::File>>,
}

impl ReadingLog {
    pub fn new(path: &str) -> Result<Self, SeawatchError> {
        let writer = Writer::from_path(path).map_err(|e| SeawatchError::CsvError(path.to_string(), e))?;
        Ok(Self {
            path: path.to_string(),
            writer: Mutex::new(writer),
        })
    }

    pub fn log_reading(&self, reading_id: ReadingId, reading: &NewReading) -> Result<(), SeawatchError> {
        let entry = LogEntry {
            reading_id,
            sensor_id: reading.sensor_id,
            temperature: reading.temperature,
            transparency: reading.transparency,
            recorded_at: Utc::now(),
        };

        let mut writer = self.writer.lock().map_err(|_| SeawatchError::StorePoisoned("reading log"))?;
        writer
            .serialize(entry)
            .map_err(|e| SeawatchError::CsvError(self.path.clone(), e))?;
        writer
            .flush()
            .map_err(|e| SeawatchError::FileIO(self.path.clone(), e))?;
        Ok(())
    }
}

/// Reads a log written by `ReadingLog` back into memory.
pub fn read_log(path: &str) -> Result<Vec<LogEntry>, SeawatchError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| SeawatchError::CsvError(path.to_string(), e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<LogEntry>, _>>()
        .map_err(|e| SeawatchError::CsvError(path.to_string(), e))
}

/// Wraps a `ReadingStore` and mirrors every created reading into a `ReadingLog`.
///
/// The log is a side channel: a failed row is reported and the store result
/// is returned unchanged.
pub struct LoggedReadingStore {
    inner: Arc<dyn ReadingStore>,
    log: ReadingLog,
}

impl LoggedReadingStore {
    pub fn new(inner: Arc<dyn ReadingStore>, log: ReadingLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl ReadingStore for LoggedReadingStore {
    async fn create_reading(&self, reading: NewReading) -> Result<ReadingId, SeawatchError> {
        let id = self.inner.create_reading(reading.clone()).await?;
        if let Err(e) = self.log.log_reading(id, &reading) {
            warn!(reading_id = id, error = %e, "failed to append reading to log");
        }
        Ok(id)
    }

    async fn attach_detected_species(&self, reading_id: ReadingId, species: &Species) -> Result<(), SeawatchError> {
        self.inner.attach_detected_species(reading_id, species).await
    }

    async fn find_reading(&self, reading_id: ReadingId) -> Result<Reading, SeawatchError> {
        self.inner.find_reading(reading_id).await
    }
}
