//! Block damage tracking: the shared store and the two periodic sweeps that
//! maintain it.
//!
//! Strike handlers write through [`DamageStore::add_damage`]. The
//! [`regen`] sweep decays and removes records; the [`cracks`] sweep only
//! reads them. Both sweeps are plain synchronous functions so the host can
//! run them on whatever timer it likes.

pub mod cracks;
pub mod regen;
pub mod store;

pub use cracks::{CrackReport, broadcast_cracks};
pub use regen::{RegenReport, regenerate};
pub use store::{DamageError, DamageRecord, DamageStore, HEAL_EPSILON, Strike, Visit};
