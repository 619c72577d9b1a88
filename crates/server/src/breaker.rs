//! The damage tracker as the rest of the server sees it.
//!
//! [`Breaker`] owns the damage store, the resolved crack renderer and the two
//! sweep schedules. Strike handlers call [`Breaker::strike`]; lifecycle code
//! calls the `schedule_*` re-armers, [`Breaker::reload`] and
//! [`Breaker::shutdown`].

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;

use breaker_engine::damage::{self, DamageError, DamageStore, Strike};
use breaker_engine::render::{CrackRenderer, RenderError};
use breaker_engine::render::registry::RendererRegistry;
use breaker_engine::world::key::BlockKey;
use breaker_engine::world::{BlockLocation, WorldId};

use crate::config::BreakerConfig;
use crate::diagnostics;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::observers::ObserverRegistry;
use crate::regions::LoadedRegions;
use crate::render;
use crate::scheduler::{PassScheduler, TaskId};

/// Failed records named individually in a crack sweep report.
const REPORTED_FAILURES: usize = 5;

pub struct Breaker {
    store: Arc<DamageStore>,
    config: Arc<RwLock<BreakerConfig>>,
    renderer: Arc<dyn CrackRenderer>,
    regions: Arc<LoadedRegions>,
    metrics: Arc<Metrics>,
    scheduler: PassScheduler,
    regen_task: Mutex<Option<TaskId>>,
    crack_task: Mutex<Option<TaskId>>,
}

impl Breaker {
    /// Build a breaker with this server's renderers. Nothing is scheduled yet.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(config: BreakerConfig, regions: Arc<LoadedRegions>, observers: Arc<ObserverRegistry>) -> Result<Self> {
        let registry = render::registry(observers, config.block_cracks.view_distance);
        Self::with_registry(config, regions, &registry)
    }

    /// Build a breaker, resolving the crack renderer from `registry`.
    pub fn with_registry(config: BreakerConfig, regions: Arc<LoadedRegions>, registry: &RendererRegistry) -> Result<Self> {
        config.validate().context("invalid breaker config")?;
        let runtime = Handle::try_current().context("breaker must be created inside a tokio runtime")?;
        let renderer = registry.resolve(&config.host_version);
        let metrics = Arc::new(Metrics::new());
        let scheduler = PassScheduler::new(runtime).with_failure_hook({
            let metrics = Arc::clone(&metrics);
            move |_task| metrics.record_sweep_failure()
        });

        Ok(Self {
            store: Arc::new(DamageStore::new(config.max_damage)),
            config: Arc::new(RwLock::new(config)),
            renderer,
            regions,
            metrics,
            scheduler,
            regen_task: Mutex::new(None),
            crack_task: Mutex::new(None),
        })
    }

    // ── Store operations ────────────────────────────────────────────────

    /// Apply a strike to the block at `location`.
    pub fn strike(&self, location: BlockLocation, amount: f32) -> Result<Strike, DamageError> {
        let strike = self.store.add_damage(location, amount)?;
        self.metrics.record_strike(strike == Strike::Destroyed);
        if strike == Strike::Destroyed {
            tracing::debug!(
                "Block at ({},{},{}) in {} destroyed",
                location.pos.x,
                location.pos.y,
                location.pos.z,
                location.world
            );
        }
        Ok(strike)
    }

    pub fn damage(&self, location: BlockLocation) -> Option<f32> {
        self.store.get_damage(location)
    }

    pub fn remove_record(&self, key: &BlockKey) -> bool {
        self.store.remove_record(key)
    }

    /// Forget all damage and loaded chunks of a world that was unloaded.
    pub fn unload_world(&self, world: WorldId) -> usize {
        self.regions.unload_world(world);
        self.store.clear_world(world)
    }

    pub fn store(&self) -> &Arc<DamageStore> {
        &self.store
    }

    pub fn renderer(&self) -> &Arc<dyn CrackRenderer> {
        &self.renderer
    }

    pub fn config(&self) -> BreakerConfig {
        self.config.read().expect("config poisoned").clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.len() as u64)
    }

    // ── Scheduling ──────────────────────────────────────────────────────

    /// (Re)arm the regeneration sweep from the current config.
    ///
    /// Any existing schedule is cancelled first. Returns `None` when the
    /// configured frequency disables regeneration.
    pub fn schedule_regeneration(&self) -> Option<TaskId> {
        let mut slot = self.regen_task.lock().expect("regen slot poisoned");
        if let Some(old) = slot.take() {
            self.scheduler.cancel(old);
        }

        let Some(period) = self.config().regen_period() else {
            tracing::info!("Regeneration disabled by config");
            return None;
        };

        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        let metrics = Arc::clone(&self.metrics);
        let id = self.scheduler.spawn_periodic("regen", period, period, move |_task| {
            // Read every sweep so a reload applies without re-arming.
            let amount = config.read().expect("config poisoned").regen.amount;
            let report = damage::regenerate(&store, amount);
            metrics.record_regen(&report);
        });
        *slot = Some(id);
        Some(id)
    }

    /// (Re)arm the crack broadcast sweep from the current config.
    ///
    /// Any existing schedule is cancelled first. Returns `None` when block
    /// cracks are disabled. The first sweep runs immediately.
    pub fn schedule_crack_broadcast(&self) -> Option<TaskId> {
        let mut slot = self.crack_task.lock().expect("crack slot poisoned");
        if let Some(old) = slot.take() {
            self.scheduler.cancel(old);
        }

        let Some(period) = self.config().crack_period() else {
            tracing::info!("Block cracks disabled by config");
            return None;
        };

        let store = Arc::clone(&self.store);
        let regions = Arc::clone(&self.regions);
        let renderer = Arc::clone(&self.renderer);
        let metrics = Arc::clone(&self.metrics);
        let id = self.scheduler.spawn_periodic("cracks", Duration::ZERO, period, move |task| {
            let report = damage::broadcast_cracks(&store, &*regions, &*renderer);
            metrics.record_cracks(&report);

            if !report.failures.is_empty() {
                diagnostics::report_error(
                    &format!(
                        "Error occurred when broadcasting block cracks ({} of {} records failed). TaskId: {:?}",
                        report.failures.len(),
                        report.visited,
                        task
                    ),
                    Some(&crack_failure_cause(&report.failures)),
                );
            }
        });
        *slot = Some(id);
        Some(id)
    }

    /// Replace the configuration and re-arm both sweeps.
    ///
    /// The renderer is not re-resolved; it is chosen once per process.
    pub fn reload(&self, config: BreakerConfig) -> Result<()> {
        config.validate().context("invalid breaker config")?;
        self.store.set_max_damage(config.max_damage);
        *self.config.write().expect("config poisoned") = config;
        self.schedule_regeneration();
        self.schedule_crack_broadcast();
        tracing::info!("Breaker config reloaded");
        Ok(())
    }

    pub fn regen_task(&self) -> Option<TaskId> {
        *self.regen_task.lock().expect("regen slot poisoned")
    }

    pub fn crack_task(&self) -> Option<TaskId> {
        *self.crack_task.lock().expect("crack slot poisoned")
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.scheduler.is_active(id)
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Cancel both sweeps. In-flight sweeps finish.
    pub fn shutdown(&self) {
        self.regen_task.lock().expect("regen slot poisoned").take();
        self.crack_task.lock().expect("crack slot poisoned").take();
        self.scheduler.cancel_all();
    }
}

/// One line per failed record, up to [`REPORTED_FAILURES`], then a count of the rest.
fn crack_failure_cause(failures: &[(BlockKey, RenderError)]) -> anyhow::Error {
    let mut lines: Vec<String> = failures
        .iter()
        .take(REPORTED_FAILURES)
        .map(|(key, err)| format!("{:?}: {}", key, err))
        .collect();
    if failures.len() > REPORTED_FAILURES {
        lines.push(format!("... and {} more", failures.len() - REPORTED_FAILURES));
    }
    anyhow::anyhow!("{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use breaker_engine::world::WorldId;
    use uuid::Uuid;

    fn failures(n: i32) -> Vec<(BlockKey, RenderError)> {
        let world = WorldId(Uuid::from_u128(7));
        (0..n)
            .map(|x| (BlockKey::encode(world, x, 64, 0), RenderError::Unavailable(format!("observer {x} gone"))))
            .collect()
    }

    #[test]
    fn crack_cause_lists_each_failure() {
        let text = crack_failure_cause(&failures(2)).to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("observer 0 gone"));
        assert!(text.contains("observer 1 gone"));
    }

    #[test]
    fn crack_cause_summarises_the_rest() {
        let text = crack_failure_cause(&failures(REPORTED_FAILURES as i32 + 2)).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), REPORTED_FAILURES + 1);
        assert_eq!(lines[REPORTED_FAILURES], "... and 2 more");
        assert!(!text.contains(&format!("observer {} gone", REPORTED_FAILURES)));
    }
}
