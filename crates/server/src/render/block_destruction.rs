//! Crack effects as Minecraft "block destruction" packets.
//!
//! Packet body layout, identical across the supported versions apart from
//! the packet id:
//!
//! | field    | type     |
//! |----------|----------|
//! | id       | VarInt   |
//! | breaker  | VarInt   |
//! | location | Position |
//! | stage    | u8       |

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use azalea_buf::{AzaleaWrite, AzaleaWriteVar};

use breaker_engine::render::{CrackRenderer, RenderError};
use breaker_engine::world::BlockLocation;
use breaker_engine::world::key::BlockKey;

use crate::observers::{ObserverRegistry, RawPacket};

/// Sends one block destruction packet per crack effect to every observer in
/// range.
pub struct BlockDestructionRenderer {
    packet_id: u32,
    observers: Arc<ObserverRegistry>,
    view_distance: f64,
}

impl BlockDestructionRenderer {
    pub fn new(packet_id: u32, observers: Arc<ObserverRegistry>, view_distance: f64) -> Self {
        Self {
            packet_id,
            observers,
            view_distance,
        }
    }
}

impl CrackRenderer for BlockDestructionRenderer {
    fn send_crack_effect(&self, location: BlockLocation, stage: u8) -> Result<(), RenderError> {
        let recipients = self.observers.nearby(location, self.view_distance);
        if recipients.is_empty() {
            return Ok(());
        }

        let packet: RawPacket = encode(self.packet_id, breaker_id(location), location, stage)?.into();
        for (conn_id, outbox) in recipients {
            // A closed outbox means the client left mid-sweep; nothing to do.
            if outbox.send(Arc::clone(&packet)).is_err() {
                tracing::debug!("Observer {} disconnected before crack delivery", conn_id);
            }
        }
        Ok(())
    }
}

/// Stable, non-negative breaker id for a block.
///
/// The client keeps one crack overlay per breaker id, so each block needs its
/// own. Derived from the block key so repeated sweeps reuse the same id.
pub fn breaker_id(location: BlockLocation) -> u32 {
    let mut hasher = DefaultHasher::new();
    BlockKey::of(location).hash(&mut hasher);
    (hasher.finish() as u32) & 0x7FFF_FFFF
}

/// Encode an unframed block destruction packet body.
pub fn encode(packet_id: u32, breaker: u32, location: BlockLocation, stage: u8) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(16);
    packet_id.azalea_write_var(&mut buf)?;
    breaker.azalea_write_var(&mut buf)?;
    let pos = location.pos;
    azalea_core::position::BlockPos::new(pos.x, pos.y, pos.z).azalea_write(&mut buf)?;
    stage.azalea_write(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::ObserverInfo;
    use breaker_engine::world::WorldId;
    use breaker_engine::world::position::BlockPos;
    use uuid::Uuid;

    fn overworld() -> WorldId {
        WorldId(Uuid::from_u128(1))
    }

    /// Packed position as the protocol defines it: x (26 bits), z (26), y (12).
    fn packed(x: i64, y: i64, z: i64) -> i64 {
        ((x & 0x3FF_FFFF) << 38) | ((z & 0x3FF_FFFF) << 12) | (y & 0xFFF)
    }

    #[test]
    fn encodes_fields_in_order() {
        let location = BlockLocation::new(overworld(), BlockPos::new(3, 64, -2));
        let bytes = encode(0x05, 7, location, 4).unwrap();

        assert_eq!(bytes[0], 0x05);
        assert_eq!(bytes[1], 7);
        let mut long = [0u8; 8];
        long.copy_from_slice(&bytes[2..10]);
        assert_eq!(i64::from_be_bytes(long), packed(3, 64, -2));
        assert_eq!(bytes[10], 4);
        assert_eq!(bytes.len(), 11);
    }

    #[test]
    fn large_breaker_id_uses_multi_byte_varint() {
        let location = BlockLocation::new(overworld(), BlockPos::new(0, 0, 0));
        let bytes = encode(0x06, 300, location, 9).unwrap();
        assert_eq!(&bytes[..3], &[0x06, 0xAC, 0x02]);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn breaker_id_is_stable_and_distinct() {
        let a = BlockLocation::new(overworld(), BlockPos::new(1, 2, 3));
        let b = BlockLocation::new(overworld(), BlockPos::new(1, 2, 4));
        assert_eq!(breaker_id(a), breaker_id(a));
        assert_ne!(breaker_id(a), breaker_id(b));
        assert!(breaker_id(a) <= i32::MAX as u32);
    }

    #[test]
    fn delivers_only_to_observers_in_range() {
        let observers = Arc::new(ObserverRegistry::new());
        let mut near = observers.register(ObserverInfo {
            conn_id: 1,
            uuid: Uuid::from_u128(11),
            name: "near".into(),
            world: overworld(),
            x: 5.0,
            y: 64.0,
            z: 5.0,
        });
        let mut far = observers.register(ObserverInfo {
            conn_id: 2,
            uuid: Uuid::from_u128(12),
            name: "far".into(),
            world: overworld(),
            x: 1000.0,
            y: 64.0,
            z: 1000.0,
        });

        let renderer = BlockDestructionRenderer::new(0x05, Arc::clone(&observers), 32.0);
        let location = BlockLocation::new(overworld(), BlockPos::new(0, 64, 0));
        renderer.send_crack_effect(location, 6).unwrap();

        let packet = near.try_recv().unwrap();
        assert_eq!(packet[0], 0x05);
        assert_eq!(*packet.last().unwrap(), 6);
        assert!(far.try_recv().is_err());
        assert!(!renderer.is_fallback());
    }
}
