//! The base population of groups, sensors and species.

use crate::error::SeawatchError;
use seawatch_schemas::{
    file_formats::CatalogFile,
    group::NewGroup,
    sensor::NewSensor,
    species::NewSpecies,
};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedCatalog {
    pub groups: Vec<NewGroup>,
    pub sensors: Vec<NewSensor>,
    pub species: Vec<NewSpecies>,
}

impl SeedCatalog {
    /// Loads a catalog from a YAML `CatalogFile`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SeawatchError> {
        let display = path.as_ref().display().to_string();
        let content = fs::read_to_string(path.as_ref()).map_err(|e| SeawatchError::FileIO(display.clone(), e))?;
        let file: CatalogFile =
            serde_yaml::from_str(&content).map_err(|e| SeawatchError::YamlParsing(display, e))?;
        Ok(file.into())
    }

    /// Rejects sensors that would emit in a busy loop.
    pub fn validate(&self) -> Result<(), SeawatchError> {
        match self.sensors.iter().find(|s| s.data_output_rate == 0) {
            Some(sensor) => Err(SeawatchError::InvalidOutputRate(sensor.codename.clone())),
            None => Ok(()),
        }
    }
}

impl From<CatalogFile> for SeedCatalog {
    fn from(file: CatalogFile) -> Self {
        Self {
            groups: file.groups,
            sensors: file.sensors,
            species: file.species,
        }
    }
}
