use super::{
    emission::EmissionTask,
    metrics::{EmissionMetrics, MetricsSnapshot},
};
use crate::{error::SeawatchError, random::RngProvider, repository::Services, seed::SeedCatalog};
use seawatch_schemas::{group::GroupFilters, sensor::SensorFilters};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Seeds the base catalog and launches one emission task per sensor.
pub struct FleetCoordinator {
    pub(super) services: Services,
    pub(super) rng: Arc<dyn RngProvider>,
    pub(super) metrics: Arc<EmissionMetrics>,
}

impl FleetCoordinator {
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Creates every group, then every sensor, then every species.
    ///
    /// Stops at the first failure without rolling back what was already
    /// created. Not idempotent: callers gate it on `is_catalog_seeded`.
    pub async fn seed_catalog(&self, catalog: &SeedCatalog) -> Result<(), SeawatchError> {
        catalog.validate()?;
        info!(
            groups = catalog.groups.len(),
            sensors = catalog.sensors.len(),
            species = catalog.species.len(),
            "seeding catalog"
        );

        for group in &catalog.groups {
            self.services.groups.create_group(group.clone()).await?;
        }
        for sensor in &catalog.sensors {
            self.services.sensors.create_sensor(sensor.clone()).await?;
        }
        for species in &catalog.species {
            self.services.species.create_species(species.clone()).await?;
        }

        info!("catalog seeded");
        Ok(())
    }

    /// True once at least one sensor group exists.
    ///
    /// Coarse: a catalog whose groups exist but whose sensors or species do not
    /// still reports as seeded. A failing listing reports `false`.
    pub async fn is_catalog_seeded(&self) -> bool {
        let filters = GroupFilters {
            top_limit: Some(1),
            ..Default::default()
        };
        match self.services.groups.list_groups(&filters).await {
            Ok(groups) => !groups.is_empty(),
            Err(e) => {
                warn!(error = %e, "cannot list sensor groups");
                false
            }
        }
    }

    /// Spawns one emission task per known sensor and returns without waiting on them.
    ///
    /// Fails only when the sensors cannot be listed.
    pub async fn start_generation(&self) -> Result<GenerationHandle, SeawatchError> {
        let sensors = self
            .services
            .sensors
            .list_sensors(&SensorFilters::default())
            .await
            .map_err(|e| {
                error!(error = %e, "cannot list sensors");
                SeawatchError::Internal(format!("cannot list sensors: {e}"))
            })?;

        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            if sensor.data_output_rate == 0 {
                warn!(sensor_id = sensor.id, codename = %sensor.codename, "zero output rate, sensor not started");
                continue;
            }

            let rng = self.rng.rng_for(&sensor);
            let task = EmissionTask::new(sensor, self.services.clone(), rng, self.metrics.clone());
            debug!(sensor_id = task.sensor().id, codename = %task.sensor().codename, "spawning emission task");
            tasks.push(tokio::spawn(task.run(cancel.child_token())));
        }

        info!(tasks = tasks.len(), "generation started");
        Ok(GenerationHandle {
            cancel,
            tasks,
            metrics: self.metrics.clone(),
        })
    }
}

/// Owns the running emission tasks of a fleet.
pub struct GenerationHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    metrics: Arc<EmissionMetrics>,
}

impl GenerationHandle {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.is_finished())
    }

    /// Cancelling this token stops every task at its next sleep.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops every task and waits until each has exited.
    pub async fn shutdown(self) -> MetricsSnapshot {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "emission task did not exit cleanly");
            }
        }
        info!("generation stopped");
        self.metrics.snapshot()
    }
}
