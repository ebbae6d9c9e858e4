use crate::{
    error::SeawatchError,
    generation::{coordinator::FleetCoordinator, metrics::EmissionMetrics},
    random::{EntropyRng, RngProvider},
    repository::Services,
};
use std::sync::Arc;

/// A fluent builder for constructing a `FleetCoordinator`.
///
/// Only the collaborators are required. Randomness defaults to OS entropy and
/// a fresh metrics registry is created unless one is supplied.
#[derive(Default)]
pub struct FleetBuilder {
    services: Option<Services>,
    rng: Option<Arc<dyn RngProvider>>,
    metrics: Option<Arc<EmissionMetrics>>,
}

impl FleetBuilder {
    /// Creates a new, empty `FleetBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store collaborators the emission tasks write through.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = Some(services);
        self
    }

    /// Sets where each emission task gets its random stream from.
    pub fn with_rng_provider(mut self, rng: Arc<dyn RngProvider>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Shares an existing metrics registry with the fleet.
    pub fn with_metrics(mut self, metrics: Arc<EmissionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Consumes the builder and returns a configured `FleetCoordinator`.
    ///
    /// # Errors
    ///
    /// Returns `SeawatchError::ConfigError` if no services were provided.
    pub fn build(self) -> Result<FleetCoordinator, SeawatchError> {
        let services = self
            .services
            .ok_or_else(|| SeawatchError::ConfigError("fleet services are not set".to_string()))?;

        Ok(FleetCoordinator {
            services,
            rng: self.rng.unwrap_or_else(|| Arc::new(EntropyRng)),
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}
