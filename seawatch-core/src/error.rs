use seawatch_schemas::{reading::ReadingId, sensor::Codename, sensor::SensorId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeawatchError {
    #[error("Internal system error: {0}")]
    Internal(String),

    #[error("Sensor group '{0}' not found")]
    GroupNotFound(String),

    #[error("Sensor with id {0} not found")]
    SensorNotFound(SensorId),

    #[error("Reading with id {0} not found")]
    ReadingNotFound(ReadingId),

    #[error("Sensor group '{0}' already exists")]
    DuplicateGroup(String),

    #[error("Sensor '{0}' already exists")]
    DuplicateSensor(Codename),

    #[error("Species '{0}' already exists")]
    DuplicateSpecies(String),

    #[error("Sensor '{0}' must have a data output rate greater than zero")]
    InvalidOutputRate(Codename),

    #[error("Cannot sample detected species from an empty catalog")]
    EmptySpeciesCatalog,

    #[error("The {0} store lock was poisoned")]
    StorePoisoned(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cached value under '{0}' could not be decoded: {1}")]
    CacheDecode(String, #[source] serde_json::Error),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to encode JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
