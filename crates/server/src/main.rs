use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use breaker_engine::damage::Strike;
use breaker_engine::world::position::{BlockPos, ChunkPos};
use breaker_engine::world::{BlockLocation, WorldId};
use breaker_server::breaker::Breaker;
use breaker_server::config::BreakerConfig;
use breaker_server::observers::{ObserverInfo, ObserverRegistry};
use breaker_server::regions::LoadedRegions;

/// World id used for the overworld when no host world table is attached.
const OVERWORLD: WorldId = WorldId(Uuid::from_u128(0x6f76_6572_776f_726c_6400_0000_0000_0001));

/// Chunks around spawn that count as loaded.
const SPAWN_RADIUS: i32 = 8;

#[tokio::main]
async fn main() {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: PathBuf = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .unwrap_or_else(|| "breaker.json".into())
        .into();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    tracing::info!("Block breaker -- damage tracking for slowly broken blocks");

    let config = match BreakerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config, using defaults: {:#}", e);
            BreakerConfig::default()
        }
    };

    let regions = Arc::new(LoadedRegions::new());
    regions.load_radius(OVERWORLD, ChunkPos::new(0, 0), SPAWN_RADIUS);
    tracing::info!("{} spawn chunks marked loaded", regions.chunk_count());

    let observers = Arc::new(ObserverRegistry::new());

    let breaker = match Breaker::new(config, Arc::clone(&regions), Arc::clone(&observers)) {
        Ok(b) => Arc::new(b),
        Err(e) => {
            tracing::error!("Failed to start breaker: {:#}", e);
            return;
        }
    };
    if breaker.renderer().is_fallback() {
        tracing::info!("Crack effects will not be shown on this host");
    }

    breaker.schedule_regeneration();
    breaker.schedule_crack_broadcast();

    if demo_mode {
        run_demo(&breaker, &observers).await;
    }

    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Ctrl+C received, shutting down...");

    breaker.shutdown();
    match serde_json::to_string(&breaker.metrics()) {
        Ok(json) => tracing::info!("Final metrics: {}", json),
        Err(e) => tracing::warn!("Could not serialize metrics: {}", e),
    }
}

/// Strike a block near spawn with a watching observer, logging each outcome.
async fn run_demo(breaker: &Breaker, observers: &ObserverRegistry) {
    let mut outbox = observers.register(ObserverInfo {
        conn_id: 1,
        uuid: Uuid::from_u128(1),
        name: "demo".into(),
        world: OVERWORLD,
        x: 8.5,
        y: 65.0,
        z: 8.5,
    });
    tokio::spawn(async move {
        while let Some(packet) = outbox.recv().await {
            tracing::debug!("Demo observer received crack packet ({} bytes)", packet.len());
        }
    });

    let target = BlockLocation::new(OVERWORLD, BlockPos::new(8, 64, 8));
    for _ in 0..6 {
        match breaker.strike(target, 2.0) {
            Ok(Strike::Intact { damage }) => tracing::info!("Demo strike: damage now {:.1}", damage),
            Ok(Strike::Destroyed) => tracing::info!("Demo strike: block destroyed"),
            Err(e) => tracing::warn!("Demo strike rejected: {}", e),
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let lingering = BlockLocation::new(OVERWORLD, BlockPos::new(9, 64, 8));
    if let Ok(strike) = breaker.strike(lingering, 3.0) {
        tracing::info!("Demo: left {:?} on a neighbouring block to regenerate", strike);
    }
}
