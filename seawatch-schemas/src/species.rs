use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SpeciesId = u64;

/// A catalog entry for a marine species a sensor can detect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSpecies {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesFilters {
    /// Return at most this many entries, in creation order.
    pub limit: Option<usize>,
}
