//! Per-room mutual exclusion.
//!
//! The registry maps each [`RoomId`] to its own `tokio::sync::Mutex`.
//! Holding a room's guard serializes every roster change and draw for
//! that room; other rooms are unaffected.
//!
//! Entries are created on first use and removed again when the last
//! guard for a room is dropped with nobody waiting, so the map only ever
//! holds rooms that are busy right now.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use santa_model::RoomId;
use tokio::sync::OwnedMutexGuard;

type RoomMutex = Arc<tokio::sync::Mutex<()>>;

/// A registry of per-room locks. Cheap to clone; clones share the map.
#[derive(Clone, Default)]
pub struct RoomLocks {
    rooms: Arc<Mutex<HashMap<RoomId, RoomMutex>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `room_id`.
    ///
    /// The returned guard releases the room when dropped.
    pub async fn lock(&self, room_id: RoomId) -> RoomGuard {
        // Clone the Arc out under the registry lock, then await the room
        // mutex without holding the registry.
        let mutex = {
            let mut rooms =
                self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(rooms.entry(room_id).or_default())
        };
        let guard = mutex.lock_owned().await;
        RoomGuard {
            room_id,
            guard: Some(guard),
            registry: Arc::clone(&self.rooms),
        }
    }

    /// Number of rooms currently locked or being waited on.
    pub fn len(&self) -> usize {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one room. Dropping it releases the room.
pub struct RoomGuard {
    room_id: RoomId,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<Mutex<HashMap<RoomId, RoomMutex>>>,
}

impl RoomGuard {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        let mut rooms =
            self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(guard) = self.guard.take() {
            // Waiters clone the Arc under the registry lock, so with the
            // registry held, two strong refs (the map and this guard)
            // means nobody else wants the room.
            let idle = Arc::strong_count(OwnedMutexGuard::mutex(&guard)) == 2;
            drop(guard);
            if idle {
                rooms.remove(&self.room_id);
            }
        }
    }
}
