pub mod key;
pub mod position;

use std::fmt;

use uuid::Uuid;

use position::{BlockPos, ChunkPos};

/// Identity of one loaded world (dimension). Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub Uuid);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A block position qualified by the world it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    pub world: WorldId,
    pub pos: BlockPos,
}

impl BlockLocation {
    pub const fn new(world: WorldId, pos: BlockPos) -> Self {
        Self { world, pos }
    }

    pub const fn chunk(&self) -> ChunkPos {
        self.pos.chunk()
    }
}

/// Host query the crack pass uses to avoid touching unloaded terrain.
///
/// Implementations must answer without loading anything.
pub trait RegionHost: Send + Sync {
    fn is_chunk_loaded(&self, world: WorldId, chunk: ChunkPos) -> bool;
}
