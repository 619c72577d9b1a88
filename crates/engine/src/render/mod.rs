//! Crack effect rendering capability.
//!
//! The sweeps only ever see a `dyn CrackRenderer`. Whether it writes
//! version-specific packets or does nothing at all is decided once at
//! startup by [`registry::RendererRegistry::resolve`].

pub mod registry;

use thiserror::Error;

use crate::world::BlockLocation;

/// Number of distinct crack stages a client can display (0..=9).
pub const CRACK_STAGES: u8 = 10;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to encode crack effect: {0}")]
    Encode(#[from] std::io::Error),

    #[error("crack renderer unavailable: {0}")]
    Unavailable(String),
}

/// Emits the visual damage stage of a block to whoever can see it.
pub trait CrackRenderer: Send + Sync {
    fn send_crack_effect(&self, location: BlockLocation, stage: u8) -> Result<(), RenderError>;

    /// `true` for the no-op stand-in installed when no implementation
    /// supports the host.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Renderer used when the host version is unsupported. Sends nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl CrackRenderer for NoopRenderer {
    fn send_crack_effect(&self, _location: BlockLocation, _stage: u8) -> Result<(), RenderError> {
        Ok(())
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

/// Map continuous damage onto a crack stage in `0..CRACK_STAGES`.
///
/// Non-finite input and a non-positive threshold map to stage 0.
pub fn crack_stage(damage: f32, max_damage: f32) -> u8 {
    if !(max_damage > 0.0) || !damage.is_finite() {
        return 0;
    }
    let stage = (damage / max_damage * CRACK_STAGES as f32).floor();
    stage.clamp(0.0, (CRACK_STAGES - 1) as f32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_scales_with_damage() {
        assert_eq!(crack_stage(0.0, 10.0), 0);
        assert_eq!(crack_stage(0.99, 10.0), 0);
        assert_eq!(crack_stage(1.0, 10.0), 1);
        assert_eq!(crack_stage(5.5, 10.0), 5);
        assert_eq!(crack_stage(9.99, 10.0), 9);
    }

    #[test]
    fn stage_is_clamped() {
        assert_eq!(crack_stage(25.0, 10.0), 9);
        assert_eq!(crack_stage(-3.0, 10.0), 0);
        assert_eq!(crack_stage(f32::NAN, 10.0), 0);
        assert_eq!(crack_stage(5.0, 0.0), 0);
    }

    #[test]
    fn noop_renderer_reports_fallback() {
        use crate::world::WorldId;
        use crate::world::position::BlockPos;

        let noop = NoopRenderer;
        let location = BlockLocation::new(WorldId(uuid::Uuid::nil()), BlockPos::new(0, 0, 0));
        assert!(noop.is_fallback());
        assert!(noop.send_crack_effect(location, 4).is_ok());
    }
}
