use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

use crate::world::key::BlockKey;
use crate::world::{BlockLocation, WorldId};

/// Damage below this is treated as fully healed.
pub const HEAL_EPSILON: f32 = 0.001;

/// Damage state of one block that is currently being broken.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageRecord {
    pub damage: f32,
    /// Set by every strike, cleared by the regeneration pass.
    pub touched: bool,
}

/// Outcome of a strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strike {
    Intact { damage: f32 },
    /// The threshold was reached; the record is gone.
    Destroyed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DamageError {
    #[error("damage increment must be positive and finite, got {0}")]
    InvalidAmount(f32),
}

/// What a mutating visitor wants done with the record it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Remove,
}

/// The authoritative map of damaged blocks. Thread-safe, lock-sharded by key.
///
/// Every operation touches at most one record and completes under that
/// record's shard lock, so strikes and sweeps can run concurrently from any
/// thread. Traversals never hold a lock across more than one record.
pub struct DamageStore {
    records: DashMap<BlockKey, DamageRecord>,
    /// `f32` bits of the destroy threshold.
    max_damage: AtomicU32,
}

impl DamageStore {
    pub fn new(max_damage: f32) -> Self {
        Self {
            records: DashMap::new(),
            max_damage: AtomicU32::new(max_damage.to_bits()),
        }
    }

    pub fn max_damage(&self) -> f32 {
        f32::from_bits(self.max_damage.load(Ordering::Relaxed))
    }

    /// Change the destroy threshold. Records already above the new threshold
    /// are left alone until their next strike.
    pub fn set_max_damage(&self, max_damage: f32) {
        self.max_damage.store(max_damage.to_bits(), Ordering::Relaxed);
    }

    /// Add `amount` of damage to the block at `location` and mark it touched.
    ///
    /// Reaching the destroy threshold removes the record and reports
    /// [`Strike::Destroyed`]. A non-positive or non-finite `amount` is
    /// rejected and leaves the store unchanged.
    pub fn add_damage(&self, location: BlockLocation, amount: f32) -> Result<Strike, DamageError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(DamageError::InvalidAmount(amount));
        }
        let max = self.max_damage();

        let strike = match self.records.entry(BlockKey::of(location)) {
            Entry::Occupied(mut entry) => {
                let damage = entry.get().damage + amount;
                if damage >= max {
                    entry.remove();
                    Strike::Destroyed
                } else {
                    let record = entry.get_mut();
                    record.damage = damage;
                    record.touched = true;
                    Strike::Intact { damage }
                }
            }
            Entry::Vacant(entry) => {
                if amount >= max {
                    Strike::Destroyed
                } else {
                    entry.insert(DamageRecord {
                        damage: amount,
                        touched: true,
                    });
                    Strike::Intact { damage: amount }
                }
            }
        };
        Ok(strike)
    }

    /// Current damage at `location`; `None` means undamaged.
    pub fn get_damage(&self, location: BlockLocation) -> Option<f32> {
        self.records.get(&BlockKey::of(location)).map(|r| r.damage)
    }

    /// Copy of the full record at `location`.
    pub fn record(&self, location: BlockLocation) -> Option<DamageRecord> {
        self.records.get(&BlockKey::of(location)).map(|r| *r)
    }

    /// Forget a block's damage. Returns whether a record existed.
    pub fn remove_record(&self, key: &BlockKey) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn remove(&self, location: BlockLocation) -> bool {
        self.remove_record(&BlockKey::of(location))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every record in one world.
    pub fn records_in(&self, world: WorldId) -> Vec<(BlockKey, DamageRecord)> {
        self.records
            .iter()
            .filter(|entry| entry.key().world() == world)
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Drop every record in one world (e.g. the world was unloaded).
    /// Returns the number removed.
    pub fn clear_world(&self, world: WorldId) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| key.world() != world);
        before.saturating_sub(self.records.len())
    }

    /// Visit a copy of every record. Returns the number visited.
    ///
    /// Weakly consistent: keys are snapshotted first, so a record present for
    /// the whole traversal is visited exactly once, a record removed midway
    /// is skipped, and a record added midway is not seen. No lock is held
    /// while `visit` runs.
    pub fn for_each_record<F>(&self, mut visit: F) -> usize
    where
        F: FnMut(&BlockKey, DamageRecord),
    {
        let mut visited = 0;
        for key in self.keys() {
            let Some(record) = self.records.get(&key).map(|r| *r) else {
                continue;
            };
            visit(&key, record);
            visited += 1;
        }
        visited
    }

    /// Visit every record mutably, removing those the visitor rejects.
    ///
    /// Same consistency as [`for_each_record`](Self::for_each_record). Each
    /// visit (and the removal it requests) is atomic with respect to that
    /// record. `visit` must not call back into the store.
    pub fn for_each_record_mut<F>(&self, mut visit: F) -> usize
    where
        F: FnMut(&BlockKey, &mut DamageRecord) -> Visit,
    {
        let mut visited = 0;
        for key in self.keys() {
            let Entry::Occupied(mut entry) = self.records.entry(key) else {
                continue;
            };
            visited += 1;
            if visit(&key, entry.get_mut()) == Visit::Remove {
                entry.remove();
            }
        }
        visited
    }

    fn keys(&self) -> Vec<BlockKey> {
        self.records.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::position::BlockPos;
    use uuid::Uuid;

    fn loc(x: i32, y: i32, z: i32) -> BlockLocation {
        BlockLocation::new(WorldId(Uuid::from_u128(1)), BlockPos::new(x, y, z))
    }

    #[test]
    fn first_strike_creates_touched_record() {
        let store = DamageStore::new(10.0);
        assert_eq!(store.add_damage(loc(0, 0, 0), 2.5), Ok(Strike::Intact { damage: 2.5 }));
        assert_eq!(
            store.record(loc(0, 0, 0)),
            Some(DamageRecord {
                damage: 2.5,
                touched: true
            })
        );
    }

    #[test]
    fn invalid_amounts_are_rejected_without_side_effects() {
        let store = DamageStore::new(10.0);
        for amount in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(store.add_damage(loc(1, 1, 1), amount).is_err());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn single_strike_over_threshold_never_stores() {
        let store = DamageStore::new(10.0);
        assert_eq!(store.add_damage(loc(0, 0, 0), 10.0), Ok(Strike::Destroyed));
        assert!(store.is_empty());
    }

    #[test]
    fn lowering_threshold_applies_to_next_strike() {
        let store = DamageStore::new(10.0);
        store.add_damage(loc(0, 0, 0), 5.0).unwrap();
        store.set_max_damage(6.0);
        assert_eq!(store.max_damage(), 6.0);
        assert_eq!(store.add_damage(loc(0, 0, 0), 1.0), Ok(Strike::Destroyed));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = DamageStore::new(10.0);
        store.add_damage(loc(3, 4, 5), 1.0).unwrap();
        let key = BlockKey::of(loc(3, 4, 5));
        assert!(store.remove_record(&key));
        assert!(!store.remove_record(&key));
        assert_eq!(store.get_damage(loc(3, 4, 5)), None);
    }

    #[test]
    fn mutating_visitor_can_remove() {
        let store = DamageStore::new(10.0);
        store.add_damage(loc(0, 0, 0), 1.0).unwrap();
        store.add_damage(loc(0, 0, 1), 2.0).unwrap();

        let visited = store.for_each_record_mut(|_, record| {
            if record.damage < 1.5 { Visit::Remove } else { Visit::Keep }
        });
        assert_eq!(visited, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_damage(loc(0, 0, 1)), Some(2.0));
    }
}
