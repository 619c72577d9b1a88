//! Host-agnostic block damage engine.
//!
//! Blocks that are struck repeatedly accumulate damage in a concurrent
//! [`damage::DamageStore`]. Two sweeps keep it honest: regeneration heals
//! blocks left alone, and the crack sweep re-sends the visual damage stage
//! through a [`render::CrackRenderer`]. Scheduling, configuration and the
//! wire format live in the host.

pub mod damage;
pub mod render;
pub mod world;
