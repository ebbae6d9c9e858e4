use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use seawatch_core::{
    aggregates::AggregateService,
    cache::MemoryCache,
    generation::{builder::FleetBuilder, coordinator::FleetCoordinator, metrics::MetricsSnapshot},
    logger::{LoggedReadingStore, ReadingLog},
    memory::MemoryStore,
    random::{EntropyRng, RngProvider, SeededRng},
    repository::{GroupCatalog, Services},
    seed::SeedCatalog,
};
use seawatch_schemas::group::GroupFilters;
use std::{sync::Arc, time::Duration};
use tokio::signal;
use tracing::{info, warn};

/// Seeds the catalog if needed, runs the fleet until asked to stop, then reports.
pub async fn run(config: &AppConfig) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut services = Services::from_store(store.clone());

    if let Some(path) = &config.readings_log {
        let path = path.to_string_lossy();
        let log = ReadingLog::new(&path).with_context(|| format!("Failed to open reading log: {}", path))?;
        services = services.with_readings(Arc::new(LoggedReadingStore::new(store.clone(), log)));
        info!(path = %path, "mirroring readings to CSV");
    }

    let rng: Arc<dyn RngProvider> = match config.rng_seed {
        Some(seed) => Arc::new(SeededRng(seed)),
        None => Arc::new(EntropyRng),
    };

    let fleet = FleetBuilder::new()
        .with_services(services)
        .with_rng_provider(rng)
        .build()?;

    if !fleet.is_catalog_seeded().await {
        let catalog = SeedCatalog::load(&config.catalog_path)
            .with_context(|| format!("Failed to load catalog {:?}", config.catalog_path))?;
        fleet.seed_catalog(&catalog).await.context("Failed to seed catalog")?;
    }
    wait_until_seeded(&fleet, config).await?;

    let handle = fleet.start_generation().await.context("Failed to start generation")?;
    info!(tasks = handle.task_count(), "fleet is emitting");

    wait_for_stop(config.run_for_secs).await;
    let snapshot = handle.shutdown().await;

    report(store, config, snapshot).await
}

async fn wait_until_seeded(fleet: &FleetCoordinator, config: &AppConfig) -> Result<()> {
    for attempt in 1..=config.seed_poll_attempts {
        if fleet.is_catalog_seeded().await {
            return Ok(());
        }
        warn!(attempt, "catalog not visible yet");
        tokio::time::sleep(config.seed_poll_interval()).await;
    }
    bail!("Catalog was not seeded after {} attempts", config.seed_poll_attempts)
}

async fn wait_for_stop(run_for_secs: Option<u64>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        match run_for_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
        _ = deadline => info!("run duration elapsed"),
    }
}

async fn report(store: Arc<MemoryStore>, config: &AppConfig, snapshot: MetricsSnapshot) -> Result<()> {
    println!("\n--- Seawatch run finished at {} ---", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let aggregates = AggregateService::new(store.clone(), Arc::new(MemoryCache::new()), config.cache_ttl());
    for group in store.list_groups(&GroupFilters::default()).await? {
        let temperature = aggregates.average_temperature_in_group(&group.name).await?;
        let transparency = aggregates.average_transparency_in_group(&group.name).await?;
        let species = aggregates.species_counts_in_group(&group.name, &GroupFilters::default()).await?;
        let most_seen = species.iter().max_by_key(|(_, count)| **count);

        println!(
            "{:<8} avg temperature: {:>7}  avg transparency: {:>4}  most detected: {}",
            group.name,
            temperature.map_or("-".to_string(), |t| format!("{:.2}", t)),
            transparency.map_or("-".to_string(), |t| format!("{}%", t)),
            most_seen.map_or("-".to_string(), |(name, count)| format!("{} ({})", name, count)),
        );
    }
    Ok(())
}
