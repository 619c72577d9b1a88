//! Reversible encoding of a world-relative block coordinate into one key.
//!
//! Layout (28 bytes, big-endian): 16 bytes of world UUID, then x, y, z, each
//! stored as `i32` with the sign bit flipped. Flipping the sign bit makes the
//! byte-wise order match numeric order, so keys sort by world, then x, y, z.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use super::position::BlockPos;
use super::{BlockLocation, WorldId};

/// Encoded length of a [`BlockKey`] in bytes.
pub const KEY_LEN: usize = 28;

const SIGN_FLIP: u32 = 0x8000_0000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed block key: expected {KEY_LEN} bytes, got {0}")]
    Length(usize),

    #[error("malformed block key: invalid hex digit {0:?} at offset {1}")]
    Hex(char, usize),
}

/// Opaque, totally ordered identifier for one block in one world.
///
/// A pure value: it names a block, it never holds one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey([u8; KEY_LEN]);

impl BlockKey {
    pub fn encode(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        bytes[..16].copy_from_slice(world.0.as_bytes());
        bytes[16..20].copy_from_slice(&((x as u32) ^ SIGN_FLIP).to_be_bytes());
        bytes[20..24].copy_from_slice(&((y as u32) ^ SIGN_FLIP).to_be_bytes());
        bytes[24..28].copy_from_slice(&((z as u32) ^ SIGN_FLIP).to_be_bytes());
        Self(bytes)
    }

    pub fn of(location: BlockLocation) -> Self {
        let BlockPos { x, y, z } = location.pos;
        Self::encode(location.world, x, y, z)
    }

    pub fn decode(&self) -> BlockLocation {
        let mut world = [0u8; 16];
        world.copy_from_slice(&self.0[..16]);
        BlockLocation {
            world: WorldId(Uuid::from_bytes(world)),
            pos: BlockPos::new(self.axis(16), self.axis(20), self.axis(24)),
        }
    }

    /// The world this key belongs to, without decoding the position.
    pub fn world(&self) -> WorldId {
        let mut world = [0u8; 16];
        world.copy_from_slice(&self.0[..16]);
        WorldId(Uuid::from_bytes(world))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn axis(&self, offset: usize) -> i32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.0[offset..offset + 4]);
        (u32::from_be_bytes(raw) ^ SIGN_FLIP) as i32
    }
}

impl TryFrom<&[u8]> for BlockKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::Length(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self.decode();
        write!(
            f,
            "BlockKey({}:{},{},{})",
            loc.world.0, loc.pos.x, loc.pos.y, loc.pos.z
        )
    }
}

impl FromStr for BlockKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != KEY_LEN * 2 {
            return Err(KeyError::Length(s.len() / 2));
        }
        let mut bytes = [0u8; KEY_LEN];
        let mut digits = s.char_indices();
        for byte in bytes.iter_mut() {
            let mut value = 0u8;
            for _ in 0..2 {
                let (offset, c) = digits.next().ok_or(KeyError::Length(s.len() / 2))?;
                let nibble = c.to_digit(16).ok_or(KeyError::Hex(c, offset))?;
                value = (value << 4) | nibble as u8;
            }
            *byte = value;
        }
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(n: u128) -> WorldId {
        WorldId(Uuid::from_u128(n))
    }

    #[test]
    fn decode_inverts_encode_at_extremes() {
        let w = world(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
        for &(x, y, z) in &[
            (0, 0, 0),
            (-1, -1, -1),
            (i32::MIN, i32::MAX, 0),
            (i32::MAX, i32::MIN, -30_000_000),
            (29_999_999, -64, 319),
        ] {
            let loc = BlockKey::encode(w, x, y, z).decode();
            assert_eq!(loc.world, w);
            assert_eq!(loc.pos, BlockPos::new(x, y, z));
        }
    }

    #[test]
    fn order_follows_world_then_coordinates() {
        let a = BlockKey::encode(world(1), 5, 0, 0);
        let b = BlockKey::encode(world(2), -5, 0, 0);
        assert!(a < b);

        let neg = BlockKey::encode(world(1), -1, 0, 0);
        let pos = BlockKey::encode(world(1), 1, 0, 0);
        assert!(neg < pos);

        let low = BlockKey::encode(world(1), 0, -64, 0);
        let high = BlockKey::encode(world(1), 0, 64, 0);
        assert!(low < high);
    }

    #[test]
    fn display_parses_back() {
        let key = BlockKey::encode(world(42), -100, 70, 12_345);
        let text = key.to_string();
        assert_eq!(text.len(), KEY_LEN * 2);
        assert_eq!(text.parse::<BlockKey>().unwrap(), key);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert_eq!("abcd".parse::<BlockKey>(), Err(KeyError::Length(2)));

        let mut text = BlockKey::encode(world(1), 0, 0, 0).to_string();
        text.replace_range(10..11, "g");
        assert_eq!(text.parse::<BlockKey>(), Err(KeyError::Hex('g', 10)));
    }

    #[test]
    fn wrong_length_bytes_are_rejected() {
        let short = [0u8; 12];
        assert_eq!(BlockKey::try_from(&short[..]), Err(KeyError::Length(12)));

        let key = BlockKey::encode(world(9), 1, 2, 3);
        assert_eq!(BlockKey::try_from(&key.as_bytes()[..]), Ok(key));
    }

    #[test]
    fn world_matches_decoded_world() {
        let key = BlockKey::encode(world(77), 3, 2, 1);
        assert_eq!(key.world(), key.decode().world);
    }
}
