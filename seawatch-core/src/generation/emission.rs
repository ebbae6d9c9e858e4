use super::metrics::{DroppedWrite, EmissionMetrics};
use crate::{
    random::{generate_temperature, generate_transparency},
    repository::Services,
    sampler::sample_detected_species,
};
use rand::rngs::StdRng;
use seawatch_schemas::{
    reading::{NewReading, ReadingId},
    sensor::Sensor,
    species::SpeciesFilters,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a single emission cycle managed to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Persisted {
        reading_id: ReadingId,
        detected: usize,
        links_dropped: usize,
    },
    Dropped,
}

/// The perpetual generation loop bound to one sensor.
///
/// Only this task writes readings for its sensor, so per-sensor writes are
/// strictly ordered. Failed writes are logged, counted and dropped; the loop
/// always moves on to the next interval.
pub struct EmissionTask {
    sensor: Sensor,
    services: Services,
    rng: StdRng,
    metrics: Arc<EmissionMetrics>,
}

impl EmissionTask {
    pub fn new(sensor: Sensor, services: Services, rng: StdRng, metrics: Arc<EmissionMetrics>) -> Self {
        Self {
            sensor,
            services,
            rng,
            metrics,
        }
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    /// Emits, then sleeps for the sensor's output interval, until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let interval = self.sensor.output_interval();
        info!(
            sensor_id = self.sensor.id,
            codename = %self.sensor.codename,
            interval_secs = interval.as_secs(),
            "emission task started"
        );

        while !cancel.is_cancelled() {
            self.cycle().await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(sensor_id = self.sensor.id, codename = %self.sensor.codename, "emission task stopped");
    }

    /// Produces and persists one reading together with its detected species.
    pub async fn cycle(&mut self) -> CycleOutcome {
        self.metrics.record_cycle();

        let reading = NewReading {
            sensor_id: self.sensor.id,
            temperature: generate_temperature(&mut self.rng, self.sensor.coordinates.depth()),
            transparency: generate_transparency(&mut self.rng),
        };

        let reading_id = match self.services.readings.create_reading(reading).await {
            Ok(id) => id,
            Err(e) => {
                self.metrics.record_dropped(DroppedWrite::Reading);
                error!(sensor_id = self.sensor.id, error = %e, "reading dropped");
                return CycleOutcome::Dropped;
            }
        };
        self.metrics.record_reading();

        let catalog = match self.services.species.list_species(&SpeciesFilters::default()).await {
            Ok(catalog) => catalog,
            Err(e) => {
                self.metrics.record_dropped(DroppedWrite::SpeciesListing);
                warn!(sensor_id = self.sensor.id, reading_id, error = %e, "species catalog unavailable");
                return CycleOutcome::Persisted {
                    reading_id,
                    detected: 0,
                    links_dropped: 0,
                };
            }
        };

        let detected = match sample_detected_species(&mut self.rng, &catalog) {
            Ok(detected) => detected,
            Err(e) => {
                debug!(sensor_id = self.sensor.id, error = %e, "skipping species detection");
                Vec::new()
            }
        };

        let mut links_dropped = 0;
        for species in &detected {
            match self.services.readings.attach_detected_species(reading_id, species).await {
                Ok(()) => self.metrics.record_link(),
                Err(e) => {
                    links_dropped += 1;
                    self.metrics.record_dropped(DroppedWrite::SpeciesLink);
                    warn!(reading_id, species = %species.name, error = %e, "detected species dropped");
                }
            }
        }

        debug!(sensor_id = self.sensor.id, reading_id, detected = detected.len(), "reading emitted");
        CycleOutcome::Persisted {
            reading_id,
            detected: detected.len(),
            links_dropped,
        }
    }
}
