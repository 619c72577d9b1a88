//! Which chunks the host currently has loaded, per world.

use dashmap::DashSet;

use breaker_engine::world::position::ChunkPos;
use breaker_engine::world::{RegionHost, WorldId};

/// Thread-safe set of loaded `(world, chunk)` pairs, lock-sharded.
///
/// The chunk loader calls [`load`](Self::load) / [`unload`](Self::unload);
/// the crack sweep only ever asks.
pub struct LoadedRegions {
    chunks: DashSet<(WorldId, ChunkPos)>,
}

impl LoadedRegions {
    pub fn new() -> Self {
        Self {
            chunks: DashSet::new(),
        }
    }

    pub fn load(&self, world: WorldId, chunk: ChunkPos) {
        self.chunks.insert((world, chunk));
    }

    pub fn unload(&self, world: WorldId, chunk: ChunkPos) {
        self.chunks.remove(&(world, chunk));
    }

    /// Mark a square of chunks around `center` as loaded (spawn area).
    pub fn load_radius(&self, world: WorldId, center: ChunkPos, radius: i32) {
        for cx in (center.x - radius)..=(center.x + radius) {
            for cz in (center.z - radius)..=(center.z + radius) {
                self.load(world, ChunkPos::new(cx, cz));
            }
        }
    }

    /// Forget every chunk in `world`. Returns how many were dropped.
    pub fn unload_world(&self, world: WorldId) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|(w, _)| *w != world);
        before.saturating_sub(self.chunks.len())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Default for LoadedRegions {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionHost for LoadedRegions {
    fn is_chunk_loaded(&self, world: WorldId, chunk: ChunkPos) -> bool {
        self.chunks.contains(&(world, chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn load_and_unload() {
        let regions = LoadedRegions::new();
        let w = WorldId(Uuid::from_u128(1));
        regions.load(w, ChunkPos::new(0, 0));
        assert!(regions.is_chunk_loaded(w, ChunkPos::new(0, 0)));
        assert!(!regions.is_chunk_loaded(w, ChunkPos::new(1, 0)));

        regions.unload(w, ChunkPos::new(0, 0));
        assert!(!regions.is_chunk_loaded(w, ChunkPos::new(0, 0)));
    }

    #[test]
    fn worlds_are_separate() {
        let regions = LoadedRegions::new();
        let a = WorldId(Uuid::from_u128(1));
        let b = WorldId(Uuid::from_u128(2));
        regions.load_radius(a, ChunkPos::new(0, 0), 1);
        regions.load(b, ChunkPos::new(0, 0));
        assert_eq!(regions.chunk_count(), 10);
        assert!(!regions.is_chunk_loaded(b, ChunkPos::new(1, 1)));

        assert_eq!(regions.unload_world(a), 9);
        assert!(regions.is_chunk_loaded(b, ChunkPos::new(0, 0)));
    }
}
