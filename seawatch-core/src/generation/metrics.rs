use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A write the emission loop gave up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppedWrite {
    Reading,
    SpeciesLink,
    SpeciesListing,
}

/// Counters shared by every emission task of a fleet.
#[derive(Debug, Default)]
pub struct EmissionMetrics {
    cycles: AtomicU64,
    readings_persisted: AtomicU64,
    readings_dropped: AtomicU64,
    links_persisted: AtomicU64,
    links_dropped: AtomicU64,
    species_listings_failed: AtomicU64,
}

impl EmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reading(&self) {
        self.readings_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link(&self) {
        self.links_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, write: DroppedWrite) {
        let counter = match write {
            DroppedWrite::Reading => &self.readings_dropped,
            DroppedWrite::SpeciesLink => &self.links_dropped,
            DroppedWrite::SpeciesListing => &self.species_listings_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            readings_persisted: self.readings_persisted.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
            links_persisted: self.links_persisted.load(Ordering::Relaxed),
            links_dropped: self.links_dropped.load(Ordering::Relaxed),
            species_listings_failed: self.species_listings_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub readings_persisted: u64,
    pub readings_dropped: u64,
    pub links_persisted: u64,
    pub links_dropped: u64,
    pub species_listings_failed: u64,
}

impl MetricsSnapshot {
    pub fn dropped_total(&self) -> u64 {
        self.readings_dropped + self.links_dropped + self.species_listings_failed
    }
}
