//! Version-specific crack renderers and the registry that picks one.

pub mod block_destruction;

use std::sync::Arc;

use breaker_engine::render::CrackRenderer;
use breaker_engine::render::registry::RendererRegistry;

use crate::observers::ObserverRegistry;
use block_destruction::BlockDestructionRenderer;

/// The Minecraft version this server speaks.
pub const HOST_VERSION: &str = "1.21.11";

/// Block destruction packet id per supported version.
pub const BLOCK_DESTRUCTION_PACKET_IDS: &[(&str, u32)] = &[("1.21.11", 0x05), ("1.20.4", 0x06)];

/// Registry of every renderer this server knows how to build.
pub fn registry(observers: Arc<ObserverRegistry>, view_distance: f64) -> RendererRegistry {
    let mut registry = RendererRegistry::new();
    for &(version, packet_id) in BLOCK_DESTRUCTION_PACKET_IDS {
        let observers = Arc::clone(&observers);
        registry.register(version, move || {
            Ok(Arc::new(BlockDestructionRenderer::new(
                packet_id,
                Arc::clone(&observers),
                view_distance,
            )) as Arc<dyn CrackRenderer>)
        });
    }
    registry
}
