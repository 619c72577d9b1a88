//! Crack broadcast sweep: re-sends the visual damage stage of every tracked
//! block that sits in loaded terrain.

use crate::render::{CrackRenderer, RenderError, crack_stage};
use crate::world::RegionHost;
use crate::world::key::BlockKey;

use super::store::DamageStore;

/// What one crack sweep did.
#[derive(Debug, Default)]
pub struct CrackReport {
    pub visited: usize,
    pub rendered: usize,
    /// Skipped because the containing chunk is not loaded.
    pub unloaded: usize,
    /// Records whose effect could not be sent. The sweep carried on past them.
    pub failures: Vec<(BlockKey, RenderError)>,
}

/// Run one crack sweep. Reads the store, never writes it.
///
/// Unloaded chunks are skipped silently and never loaded. A render failure
/// is recorded in the report and the sweep moves on to the next record.
pub fn broadcast_cracks(
    store: &DamageStore,
    host: &dyn RegionHost,
    renderer: &dyn CrackRenderer,
) -> CrackReport {
    let max_damage = store.max_damage();
    let mut report = CrackReport::default();

    report.visited = store.for_each_record(|key, record| {
        let location = key.decode();
        if !host.is_chunk_loaded(location.world, location.chunk()) {
            report.unloaded += 1;
            return;
        }

        let stage = crack_stage(record.damage, max_damage);
        match renderer.send_crack_effect(location, stage) {
            Ok(()) => report.rendered += 1,
            Err(e) => report.failures.push((*key, e)),
        }
    });

    tracing::debug!(
        "Crack sweep: {} records, {} rendered, {} unloaded, {} failed",
        report.visited,
        report.rendered,
        report.unloaded,
        report.failures.len(),
    );
    report
}
