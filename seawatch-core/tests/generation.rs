use async_trait::async_trait;
use seawatch_core::{
    error::SeawatchError,
    generation::{
        builder::FleetBuilder,
        coordinator::FleetCoordinator,
        emission::{CycleOutcome, EmissionTask},
        metrics::EmissionMetrics,
    },
    memory::MemoryStore,
    random::{RngProvider, SeededRng},
    repository::{GroupCatalog, ReadingStore, SensorDirectory, Services, SpeciesCatalog},
    seed::SeedCatalog,
};
use seawatch_schemas::{
    group::{GroupFilters, GroupId, NewGroup, SensorGroup},
    reading::{NewReading, Reading, ReadingId},
    sensor::{Codename, Coordinates, NewSensor, Sensor, SensorFilters, SensorId},
    species::{NewSpecies, Species, SpeciesFilters, SpeciesId},
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// Delegates to a `MemoryStore` while recording calls and injecting failures.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<&'static str>>,
    fail_readings: bool,
    fail_sensor_listing: bool,
    // Every second species link is rejected.
    fail_links: bool,
    fail_species_listing: bool,
    reading_attempts: AtomicUsize,
    link_attempts: AtomicUsize,
}

impl RecordingStore {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroupCatalog for RecordingStore {
    async fn create_group(&self, group: NewGroup) -> Result<GroupId, SeawatchError> {
        self.record("create_group");
        self.inner.create_group(group).await
    }

    async fn list_groups(&self, filters: &GroupFilters) -> Result<Vec<SensorGroup>, SeawatchError> {
        self.inner.list_groups(filters).await
    }
}

#[async_trait]
impl SensorDirectory for RecordingStore {
    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, SeawatchError> {
        self.record("create_sensor");
        self.inner.create_sensor(sensor).await
    }

    async fn list_sensors(&self, filters: &SensorFilters) -> Result<Vec<Sensor>, SeawatchError> {
        if self.fail_sensor_listing {
            return Err(SeawatchError::Internal("connection reset".into()));
        }
        self.inner.list_sensors(filters).await
    }

    async fn move_sensor_to_group(&self, sensor_id: SensorId, group_name: &str) -> Result<(), SeawatchError> {
        self.inner.move_sensor_to_group(sensor_id, group_name).await
    }
}

#[async_trait]
impl SpeciesCatalog for RecordingStore {
    async fn create_species(&self, species: NewSpecies) -> Result<SpeciesId, SeawatchError> {
        self.record("create_species");
        self.inner.create_species(species).await
    }

    async fn list_species(&self, filters: &SpeciesFilters) -> Result<Vec<Species>, SeawatchError> {
        if self.fail_species_listing {
            return Err(SeawatchError::Internal("catalog offline".into()));
        }
        self.inner.list_species(filters).await
    }
}

#[async_trait]
impl ReadingStore for RecordingStore {
    async fn create_reading(&self, reading: NewReading) -> Result<ReadingId, SeawatchError> {
        self.reading_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_readings {
            return Err(SeawatchError::Internal("disk full".into()));
        }
        self.inner.create_reading(reading).await
    }

    async fn attach_detected_species(&self, reading_id: ReadingId, species: &Species) -> Result<(), SeawatchError> {
        let attempt = self.link_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_links && attempt % 2 == 1 {
            return Err(SeawatchError::Internal("lock timeout".into()));
        }
        self.inner.attach_detected_species(reading_id, species).await
    }

    async fn find_reading(&self, reading_id: ReadingId) -> Result<Reading, SeawatchError> {
        self.inner.find_reading(reading_id).await
    }
}

fn coordinator(store: Arc<RecordingStore>) -> FleetCoordinator {
    FleetBuilder::new()
        .with_services(Services::from_store(store))
        .with_rng_provider(Arc::new(SeededRng(2024)))
        .build()
        .unwrap()
}

fn catalog(output_rate: u64, species: &[&str]) -> SeedCatalog {
    SeedCatalog {
        groups: vec![NewGroup { name: "alpha".into() }, NewGroup { name: "beta".into() }],
        sensors: vec![
            NewSensor {
                codename: Codename::new("alpha", 1),
                coordinates: Coordinates::new(34.33, 27.24, 0.0),
                data_output_rate: output_rate,
            },
            NewSensor {
                codename: Codename::new("beta", 1),
                coordinates: Coordinates::new(16.0, 27.88, 8.0),
                data_output_rate: output_rate,
            },
        ],
        species: species.iter().map(|name| NewSpecies { name: name.to_string() }).collect(),
    }
}

async fn readings_of(store: &RecordingStore) -> Vec<Reading> {
    let mut readings = Vec::new();
    for sensor in store.list_sensors(&SensorFilters::default()).await.unwrap() {
        readings.extend(store.inner.readings_for_sensor(sensor.id).unwrap());
    }
    readings
}

#[tokio::test]
async fn empty_catalog_is_not_seeded() {
    let fleet = coordinator(Arc::new(RecordingStore::default()));
    assert!(!fleet.is_catalog_seeded().await);
    assert!(!fleet.is_catalog_seeded().await);
}

#[tokio::test]
async fn single_group_marks_catalog_seeded() {
    let store = Arc::new(RecordingStore::default());
    store.create_group(NewGroup { name: "alpha".into() }).await.unwrap();

    let fleet = coordinator(store);
    assert!(fleet.is_catalog_seeded().await);
    assert!(fleet.is_catalog_seeded().await);
}

#[tokio::test]
async fn seeding_creates_groups_then_sensors_then_species() {
    let store = Arc::new(RecordingStore::default());
    let fleet = coordinator(store.clone());

    fleet
        .seed_catalog(&catalog(30, &["Atlantic Cod", "Blue Marlin", "Coelacanth"]))
        .await
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            "create_group",
            "create_group",
            "create_sensor",
            "create_sensor",
            "create_species",
            "create_species",
            "create_species",
        ]
    );
    assert!(fleet.is_catalog_seeded().await);
}

#[tokio::test]
async fn seeding_stops_at_first_failure_without_rollback() {
    let store = Arc::new(RecordingStore::default());
    let fleet = coordinator(store.clone());

    let mut broken = catalog(30, &["Atlantic Cod"]);
    broken.sensors[1].codename = Codename::new("omega", 1);

    let err = fleet.seed_catalog(&broken).await.unwrap_err();
    assert!(matches!(err, SeawatchError::GroupNotFound(name) if name == "omega"));
    assert!(!store.calls().contains(&"create_species"));
    assert_eq!(store.list_groups(&GroupFilters::default()).await.unwrap().len(), 2);
    assert_eq!(store.list_sensors(&SensorFilters::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn zero_output_rate_is_rejected_before_any_write() {
    let store = Arc::new(RecordingStore::default());
    let fleet = coordinator(store.clone());

    let err = fleet.seed_catalog(&catalog(0, &["Atlantic Cod"])).await.unwrap_err();
    assert!(matches!(err, SeawatchError::InvalidOutputRate(_)));
    assert!(store.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn one_second_sensor_emits_once_per_interval() {
    let store = Arc::new(RecordingStore::default());
    store.create_group(NewGroup { name: "alpha".into() }).await.unwrap();
    store
        .create_sensor(NewSensor {
            codename: Codename::new("alpha", 1),
            coordinates: Coordinates::new(34.33, 27.24, 0.0),
            data_output_rate: 1,
        })
        .await
        .unwrap();
    store.create_species(NewSpecies { name: "Sailfish".into() }).await.unwrap();

    let handle = coordinator(store.clone()).start_generation().await.unwrap();
    assert_eq!(handle.task_count(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(readings_of(&store).await.len(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let readings = readings_of(&store).await;
    assert_eq!(readings.len(), 2);
    for reading in &readings {
        assert!((0.0..=30.0).contains(&reading.temperature));
        assert!(reading.transparency <= 100);
    }

    let snapshot = handle.shutdown().await;
    assert_eq!(snapshot.readings_persisted, 2);
}

#[tokio::test(start_paused = true)]
async fn failing_reading_store_does_not_stop_the_task() {
    let store = Arc::new(RecordingStore {
        fail_readings: true,
        ..Default::default()
    });
    let fleet = coordinator(store.clone());
    fleet.seed_catalog(&catalog(1, &["Atlantic Cod"])).await.unwrap();

    let handle = fleet.start_generation().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    // Two sensors, three cycles each at t = 0s, 1s and 2s.
    assert_eq!(store.reading_attempts.load(Ordering::SeqCst), 6);
    assert!(!handle.is_finished());

    let metrics = handle.metrics();
    assert_eq!(metrics.readings_dropped, 6);
    assert_eq!(metrics.readings_persisted, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn failed_species_links_do_not_stop_the_remaining_ones() {
    let store = Arc::new(RecordingStore {
        fail_links: true,
        ..Default::default()
    });
    let fleet = coordinator(store.clone());
    fleet
        .seed_catalog(&catalog(1, &["Blue Tang", "John Dory", "Ocean Sunfish"]))
        .await
        .unwrap();

    let sensor = store.list_sensors(&SensorFilters::default()).await.unwrap().remove(0);
    let metrics = Arc::new(EmissionMetrics::new());
    let rng = SeededRng(77).rng_for(&sensor);
    let mut task = EmissionTask::new(sensor, Services::from_store(store.clone()), rng, metrics.clone());

    let (mut stored_total, mut dropped_total) = (0, 0);
    for _ in 0..10 {
        match task.cycle().await {
            CycleOutcome::Persisted {
                reading_id,
                detected,
                links_dropped,
            } => {
                let stored = store.find_reading(reading_id).await.unwrap().detected_species.len();
                assert_eq!(stored + links_dropped, detected);
                stored_total += stored;
                dropped_total += links_dropped;
            }
            CycleOutcome::Dropped => panic!("readings are accepted by this store"),
        }
    }

    assert!(dropped_total > 0);
    assert_eq!(store.link_attempts.load(Ordering::SeqCst), stored_total + dropped_total);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.readings_persisted, 10);
    assert_eq!(snapshot.links_persisted as usize, stored_total);
    assert_eq!(snapshot.links_dropped as usize, dropped_total);
    assert_eq!(snapshot.dropped_total() as usize, dropped_total);
}

#[tokio::test(start_paused = true)]
async fn species_listing_failure_keeps_readings_flowing() {
    let store = Arc::new(RecordingStore {
        fail_species_listing: true,
        ..Default::default()
    });
    let metrics = Arc::new(EmissionMetrics::new());
    let fleet = FleetBuilder::new()
        .with_services(Services::from_store(store.clone()))
        .with_rng_provider(Arc::new(SeededRng(5)))
        .with_metrics(metrics.clone())
        .build()
        .unwrap();
    fleet.seed_catalog(&catalog(1, &["Atlantic Cod"])).await.unwrap();

    let handle = fleet.start_generation().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(!handle.is_finished());

    // The shared registry sees what the handle reports.
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot, handle.metrics());
    assert_eq!(snapshot.readings_persisted, 6);
    assert_eq!(snapshot.species_listings_failed, 6);
    assert_eq!(snapshot.links_persisted, 0);
    assert_eq!(store.link_attempts.load(Ordering::SeqCst), 0);
    assert!(readings_of(&store).await.iter().all(|r| r.detected_species.is_empty()));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn detected_species_come_from_a_small_catalog() {
    let names = ["Blue Tang", "John Dory", "Ocean Sunfish"];
    let store = Arc::new(RecordingStore::default());
    let fleet = coordinator(store.clone());
    fleet.seed_catalog(&catalog(1, &names)).await.unwrap();

    let handle = fleet.start_generation().await.unwrap();
    tokio::time::sleep(Duration::from_millis(19_500)).await;
    let snapshot = handle.shutdown().await;

    let readings = readings_of(&store).await;
    assert_eq!(readings.len(), 40);
    let detections: Vec<&Species> = readings.iter().flat_map(|r| &r.detected_species).collect();
    assert!(!detections.is_empty());
    assert!(detections.iter().all(|s| names.contains(&s.name.as_str())));
    assert!(readings.iter().all(|r| r.detected_species.len() < 50));
    assert_eq!(snapshot.links_persisted as usize, detections.len());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_task() {
    let store = Arc::new(RecordingStore::default());
    let fleet = coordinator(store.clone());
    fleet.seed_catalog(&catalog(5, &["Coelacanth"])).await.unwrap();

    let handle = fleet.start_generation().await.unwrap();
    let token = handle.cancellation_token();
    tokio::time::sleep(Duration::from_secs(6)).await;
    let snapshot = handle.shutdown().await;
    assert!(token.is_cancelled());
    assert_eq!(snapshot.readings_persisted, 4);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(readings_of(&store).await.len(), 4);
}

#[tokio::test]
async fn sensor_listing_failure_is_an_internal_error() {
    let store = Arc::new(RecordingStore {
        fail_sensor_listing: true,
        ..Default::default()
    });
    let result = coordinator(store).start_generation().await;
    assert!(matches!(result, Err(SeawatchError::Internal(_))));
}

#[tokio::test]
async fn sensors_with_zero_rate_are_not_started() {
    let store = Arc::new(RecordingStore::default());
    store.create_group(NewGroup { name: "delta".into() }).await.unwrap();
    store
        .create_sensor(NewSensor {
            codename: Codename::new("delta", 1),
            coordinates: Coordinates::new(87.33, 68.24, 2.0),
            data_output_rate: 0,
        })
        .await
        .unwrap();

    let handle = coordinator(store).start_generation().await.unwrap();
    assert_eq!(handle.task_count(), 0);
    handle.shutdown().await;
}

#[tokio::test]
async fn builder_requires_services() {
    assert!(matches!(FleetBuilder::new().build(), Err(SeawatchError::ConfigError(_))));
}
