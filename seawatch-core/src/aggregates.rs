//! Cache-aside read path for the per-group averages.

use crate::{
    error::SeawatchError,
    repository::{Cache, Extremum, ReadingQueries},
};
use serde::{de::DeserializeOwned, Serialize};
use seawatch_schemas::{
    group::GroupFilters,
    sensor::{Coordinates, SensorId},
};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tracing::{debug, error, warn};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

pub struct AggregateService {
    queries: Arc<dyn ReadingQueries>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl AggregateService {
    pub fn new(queries: Arc<dyn ReadingQueries>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { queries, cache, ttl }
    }

    pub async fn average_temperature_in_group(&self, group_name: &str) -> Result<Option<f64>, SeawatchError> {
        let key = format!("{group_name}AvgTemperature");
        self.cached(&key, self.queries.average_temperature_in_group(group_name)).await
    }

    pub async fn average_transparency_in_group(&self, group_name: &str) -> Result<Option<u8>, SeawatchError> {
        let key = format!("{group_name}AvgTransparency");
        self.cached(&key, self.queries.average_transparency_in_group(group_name)).await
    }

    pub async fn average_temperature_for_sensor(&self, sensor_id: SensorId) -> Result<Option<f64>, SeawatchError> {
        self.queries.average_temperature_for_sensor(sensor_id).await
    }

    pub async fn extremum_temperature_in_region(
        &self,
        min: &Coordinates,
        max: &Coordinates,
        extremum: Extremum,
    ) -> Result<Option<f64>, SeawatchError> {
        self.queries.extremum_temperature_in_region(min, max, extremum).await
    }

    pub async fn species_counts_in_group(
        &self,
        group_name: &str,
        filters: &GroupFilters,
    ) -> Result<HashMap<String, usize>, SeawatchError> {
        self.queries.species_counts_in_group(group_name, filters).await
    }

    /// Returns the cached value under `key`, or awaits `fetch` and caches its result.
    ///
    /// A failing cache read counts as a miss. A failing cache write is returned
    /// to the caller even though the value itself was computed.
    async fn cached<T, F>(&self, key: &str, fetch: F) -> Result<T, SeawatchError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, SeawatchError>>,
    {
        let hit = match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, falling back to the store");
                None
            }
        };

        if let Some(raw) = hit {
            debug!(key, "cache hit");
            return serde_json::from_str(&raw).map_err(|e| SeawatchError::CacheDecode(key.to_string(), e));
        }

        let value = fetch.await?;
        let raw = serde_json::to_string(&value)?;
        if let Err(e) = self.cache.set(key, raw, self.ttl).await {
            error!(key, error = %e, "cannot store value in cache");
            return Err(e);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::MemoryCache,
        memory::MemoryStore,
        repository::{GroupCatalog, ReadingStore, SensorDirectory, SpeciesCatalog},
    };
    use async_trait::async_trait;
    use seawatch_schemas::{
        group::NewGroup,
        reading::NewReading,
        sensor::{Codename, NewSensor},
        species::{NewSpecies, SpeciesFilters},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingQueries {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadingQueries for CountingQueries {
        async fn average_temperature_in_group(&self, _: &str) -> Result<Option<f64>, SeawatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(14.25))
        }
        async fn average_transparency_in_group(&self, _: &str) -> Result<Option<u8>, SeawatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(63))
        }
        async fn average_temperature_for_sensor(&self, _: SensorId) -> Result<Option<f64>, SeawatchError> {
            Ok(None)
        }
        async fn extremum_temperature_in_region(
            &self,
            _: &Coordinates,
            _: &Coordinates,
            _: Extremum,
        ) -> Result<Option<f64>, SeawatchError> {
            Ok(None)
        }
        async fn species_counts_in_group(
            &self,
            _: &str,
            _: &GroupFilters,
        ) -> Result<HashMap<String, usize>, SeawatchError> {
            Ok(HashMap::new())
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _: &str) -> Result<Option<String>, SeawatchError> {
            Err(SeawatchError::Cache("connection refused".into()))
        }
        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), SeawatchError> {
            Err(SeawatchError::Cache("connection refused".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_read_is_served_from_cache_until_ttl() {
        let queries = Arc::new(CountingQueries::default());
        let service = AggregateService::new(queries.clone(), Arc::new(MemoryCache::new()), DEFAULT_CACHE_TTL);

        assert_eq!(service.average_temperature_in_group("alpha").await.unwrap(), Some(14.25));
        assert_eq!(service.average_temperature_in_group("alpha").await.unwrap(), Some(14.25));
        assert_eq!(queries.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(DEFAULT_CACHE_TTL + Duration::from_millis(1)).await;
        assert_eq!(service.average_transparency_in_group("alpha").await.unwrap(), Some(63));
        service.average_temperature_in_group("alpha").await.unwrap();
        assert_eq!(queries.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn undecodable_cached_value_is_an_error() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("gammaAvgTemperature", "not a number".into(), DEFAULT_CACHE_TTL)
            .await
            .unwrap();
        let service = AggregateService::new(Arc::new(CountingQueries::default()), cache, DEFAULT_CACHE_TTL);

        assert!(matches!(
            service.average_temperature_in_group("gamma").await,
            Err(SeawatchError::CacheDecode(_, _))
        ));
    }

    #[tokio::test]
    async fn failing_cache_write_surfaces_after_the_query_ran() {
        let queries = Arc::new(CountingQueries::default());
        let service = AggregateService::new(queries.clone(), Arc::new(BrokenCache), DEFAULT_CACHE_TTL);

        assert!(matches!(
            service.average_transparency_in_group("delta").await,
            Err(SeawatchError::Cache(_))
        ));
        assert_eq!(queries.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn uncached_queries_read_straight_from_the_store() {
        let store = Arc::new(MemoryStore::new());
        store.create_group(NewGroup { name: "epsilon".into() }).await.unwrap();
        for (index, z) in [(1, 3.0), (2, 40.0)] {
            store
                .create_sensor(NewSensor {
                    codename: Codename::new("epsilon", index),
                    coordinates: Coordinates::new(10.0, 10.0, z),
                    data_output_rate: 35,
                })
                .await
                .unwrap();
        }
        store.create_species(NewSpecies { name: "Coelacanth".into() }).await.unwrap();
        let coelacanth = store.list_species(&SpeciesFilters::default()).await.unwrap().remove(0);

        for (sensor_id, temperature) in [(1, 8.5), (1, 9.5), (2, 4.0)] {
            let id = store
                .create_reading(NewReading {
                    sensor_id,
                    temperature,
                    transparency: 30,
                })
                .await
                .unwrap();
            store.attach_detected_species(id, &coelacanth).await.unwrap();
        }

        let service = AggregateService::new(store, Arc::new(MemoryCache::new()), DEFAULT_CACHE_TTL);
        assert_eq!(service.average_temperature_for_sensor(1).await.unwrap(), Some(9.0));
        assert!(matches!(
            service.average_temperature_for_sensor(7).await,
            Err(SeawatchError::SensorNotFound(7))
        ));

        let shallow = (Coordinates::new(0.0, 0.0, 0.0), Coordinates::new(20.0, 20.0, 10.0));
        assert_eq!(
            service
                .extremum_temperature_in_region(&shallow.0, &shallow.1, Extremum::Min)
                .await
                .unwrap(),
            Some(8.5)
        );
        let whole = (Coordinates::new(0.0, 0.0, 0.0), Coordinates::new(20.0, 20.0, 50.0));
        assert_eq!(
            service
                .extremum_temperature_in_region(&whole.0, &whole.1, Extremum::Min)
                .await
                .unwrap(),
            Some(4.0)
        );

        let newest = GroupFilters {
            top_limit: Some(2),
            ..Default::default()
        };
        let counts = service.species_counts_in_group("epsilon", &newest).await.unwrap();
        assert_eq!(counts.get("Coelacanth"), Some(&2));
    }
}
