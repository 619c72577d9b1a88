//! Registry of connected observers that may receive crack effects.
//!
//! Each observer owns an outbox of raw packet bodies. The connection layer
//! drains it and frames the packets onto the wire; renderers only push.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use tokio::sync::mpsc;
use uuid::Uuid;

use breaker_engine::world::BlockLocation;
use breaker_engine::world::WorldId;

/// A raw, unframed packet body (packet id followed by fields).
pub type RawPacket = Arc<[u8]>;

/// Everything the registry knows about one connected observer.
#[derive(Clone, Debug)]
pub struct ObserverInfo {
    pub conn_id: u64,
    pub uuid: Uuid,
    pub name: String,
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

struct Observer {
    info: ObserverInfo,
    outbox: mpsc::UnboundedSender<RawPacket>,
}

/// Thread-safe registry of observers, keyed by connection id.
///
/// Uses `std::sync::RwLock` because every operation is brief (no awaits while
/// the lock is held) and the crack sweep is read-heavy.
pub struct ObserverRegistry {
    observers: RwLock<HashMap<u64, Observer>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
        }
    }

    /// Register an observer and return the receiving end of its outbox.
    /// Re-registering a connection id replaces the old entry.
    pub fn register(&self, info: ObserverInfo) -> mpsc::UnboundedReceiver<RawPacket> {
        let (outbox, rx) = mpsc::unbounded_channel();
        self.observers
            .write()
            .expect("observer registry poisoned")
            .insert(info.conn_id, Observer { info, outbox });
        rx
    }

    /// Move an observer, possibly into another world.
    pub fn update_position(&self, conn_id: u64, world: WorldId, x: f64, y: f64, z: f64) {
        let mut observers = self.observers.write().expect("observer registry poisoned");
        let Some(observer) = observers.get_mut(&conn_id) else {
            return;
        };
        observer.info.world = world;
        observer.info.x = x;
        observer.info.y = y;
        observer.info.z = z;
    }

    pub fn deregister(&self, conn_id: u64) -> Option<ObserverInfo> {
        self.observers
            .write()
            .expect("observer registry poisoned")
            .remove(&conn_id)
            .map(|o| o.info)
    }

    /// Outboxes of every observer in the same world within `radius` blocks of
    /// `location`. Closed outboxes (disconnected clients) are left out.
    pub fn nearby(&self, location: BlockLocation, radius: f64) -> Vec<(u64, mpsc::UnboundedSender<RawPacket>)> {
        let radius_sq = radius * radius;
        self.observers
            .read()
            .expect("observer registry poisoned")
            .values()
            .filter(|o| o.info.world == location.world)
            .filter(|o| !o.outbox.is_closed())
            .filter(|o| location.pos.distance_squared_to(o.info.x, o.info.y, o.info.z) <= radius_sq)
            .map(|o| (o.info.conn_id, o.outbox.clone()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ObserverInfo> {
        self.observers
            .read()
            .expect("observer registry poisoned")
            .values()
            .map(|o| o.info.clone())
            .collect()
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .expect("observer registry poisoned")
            .len()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breaker_engine::world::position::BlockPos;

    fn world(n: u128) -> WorldId {
        WorldId(Uuid::from_u128(n))
    }

    fn info(conn_id: u64, w: WorldId, x: f64, y: f64, z: f64) -> ObserverInfo {
        ObserverInfo {
            conn_id,
            uuid: Uuid::from_u128(conn_id as u128),
            name: format!("player{conn_id}"),
            world: w,
            x,
            y,
            z,
        }
    }

    #[test]
    fn nearby_filters_by_world_and_distance() {
        let registry = ObserverRegistry::new();
        let _a = registry.register(info(1, world(1), 0.5, 64.5, 10.5));
        let _b = registry.register(info(2, world(1), 500.0, 64.0, 0.0));
        let _c = registry.register(info(3, world(2), 0.5, 64.5, 0.5));

        let location = BlockLocation::new(world(1), BlockPos::new(0, 64, 0));
        let ids: Vec<u64> = registry.nearby(location, 16.0).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn dropped_receiver_is_not_nearby() {
        let registry = ObserverRegistry::new();
        let rx = registry.register(info(1, world(1), 0.0, 0.0, 0.0));
        drop(rx);

        let location = BlockLocation::new(world(1), BlockPos::new(0, 0, 0));
        assert!(registry.nearby(location, 16.0).is_empty());
        assert_eq!(registry.observer_count(), 1);
    }

    #[test]
    fn update_and_deregister() {
        let registry = ObserverRegistry::new();
        let _rx = registry.register(info(7, world(1), 0.0, 0.0, 0.0));
        registry.update_position(7, world(2), 1.0, 2.0, 3.0);

        let snap = registry.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].world, world(2));
        assert_eq!((snap[0].x, snap[0].y, snap[0].z), (1.0, 2.0, 3.0));

        assert_eq!(registry.deregister(7).map(|i| i.conn_id), Some(7));
        assert_eq!(registry.observer_count(), 0);
        assert!(registry.deregister(7).is_none());
    }
}
