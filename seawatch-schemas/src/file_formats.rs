use crate::{group::NewGroup, sensor::NewSensor, species::NewSpecies};
use serde::Deserialize;

/// On-disk layout of the base population created once per deployment.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub schema_version: String,
    pub groups: Vec<NewGroup>,
    pub sensors: Vec<NewSensor>,
    pub species: Vec<NewSpecies>,
}
