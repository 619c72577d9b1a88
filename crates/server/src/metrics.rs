//! Lock-free counters for strikes and sweeps.
//!
//! Strike handlers and sweep tasks bump these with relaxed atomics; nothing
//! on the hot path ever blocks on them. [`Metrics::snapshot`] reads them at
//! leisure.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;

use breaker_engine::damage::{CrackReport, RegenReport};

pub struct Metrics {
    strikes: AtomicU64,
    blocks_destroyed: AtomicU64,

    regen_sweeps: AtomicU64,
    records_decayed: AtomicU64,
    records_healed: AtomicU64,

    crack_sweeps: AtomicU64,
    effects_rendered: AtomicU64,
    skipped_unloaded: AtomicU64,

    sweep_failures: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            strikes: AtomicU64::new(0),
            blocks_destroyed: AtomicU64::new(0),
            regen_sweeps: AtomicU64::new(0),
            records_decayed: AtomicU64::new(0),
            records_healed: AtomicU64::new(0),
            crack_sweeps: AtomicU64::new(0),
            effects_rendered: AtomicU64::new(0),
            skipped_unloaded: AtomicU64::new(0),
            sweep_failures: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_strike(&self, destroyed: bool) {
        self.strikes.fetch_add(1, Relaxed);
        if destroyed {
            self.blocks_destroyed.fetch_add(1, Relaxed);
        }
    }

    pub fn record_regen(&self, report: &RegenReport) {
        self.regen_sweeps.fetch_add(1, Relaxed);
        self.records_decayed.fetch_add(report.decayed as u64, Relaxed);
        self.records_healed.fetch_add(report.healed as u64, Relaxed);
    }

    pub fn record_cracks(&self, report: &CrackReport) {
        self.crack_sweeps.fetch_add(1, Relaxed);
        self.effects_rendered.fetch_add(report.rendered as u64, Relaxed);
        self.skipped_unloaded.fetch_add(report.unloaded as u64, Relaxed);
        if !report.failures.is_empty() {
            self.sweep_failures.fetch_add(1, Relaxed);
        }
    }

    /// A sweep that panicked instead of returning a report.
    pub fn record_sweep_failure(&self) {
        self.sweep_failures.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self, records_tracked: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            records_tracked,
            strikes: self.strikes.load(Relaxed),
            blocks_destroyed: self.blocks_destroyed.load(Relaxed),
            regen_sweeps: self.regen_sweeps.load(Relaxed),
            records_decayed: self.records_decayed.load(Relaxed),
            records_healed: self.records_healed.load(Relaxed),
            crack_sweeps: self.crack_sweeps.load(Relaxed),
            effects_rendered: self.effects_rendered.load(Relaxed),
            skipped_unloaded: self.skipped_unloaded.load(Relaxed),
            sweep_failures: self.sweep_failures.load(Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable point-in-time copy of all counters.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub records_tracked: u64,
    pub strikes: u64,
    pub blocks_destroyed: u64,
    pub regen_sweeps: u64,
    pub records_decayed: u64,
    pub records_healed: u64,
    pub crack_sweeps: u64,
    pub effects_rendered: u64,
    pub skipped_unloaded: u64,
    pub sweep_failures: u64,
}
