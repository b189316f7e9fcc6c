//! The assignment engine: computes a draw and commits it.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use santa_model::{Assignment, Identity, NewAssignment, RoomId, RoomState};
use santa_store::Store;

use crate::{
    DrawError, MIN_PARTICIPANTS, Pairing, RoomLocks, compute_assignments,
};

/// Computes and persists gift cycles for rooms.
///
/// The random source is injected so tests can seed it. It sits behind a
/// `std::sync::Mutex` that is only held while shuffling, never across
/// an `.await`.
///
/// ## Commit protocol
///
/// With the room's lock held:
///
/// ```text
/// read room ──→ is_drawn? ──yes──→ AlreadyDrawn
///                  │ no
///                  ▼
/// read roster ──→ compute cycle ──(< 2)──→ InsufficientParticipants
///                  │
///                  ▼
/// mark_drawn (compare-and-set) ──lost──→ Conflict
///                  │ won
///                  ▼
/// delete stale rows ──→ insert cycle ──fail──→ delete rows, reset flag
/// ```
///
/// Nothing is written until the cycle is known to be valid, and nothing
/// but the compare-and-set winner ever writes assignment rows.
pub struct AssignmentEngine<S, R = StdRng> {
    store: Arc<S>,
    locks: RoomLocks,
    rng: Mutex<R>,
    min_participants: usize,
}

impl<S: Store> AssignmentEngine<S, StdRng> {
    /// Creates an engine seeded from the operating system.
    pub fn new(store: Arc<S>, locks: RoomLocks) -> Self {
        Self::with_rng(store, locks, StdRng::from_os_rng())
    }

    /// Creates an engine whose shuffles are reproducible from `seed`.
    pub fn seeded(store: Arc<S>, locks: RoomLocks, seed: u64) -> Self {
        Self::with_rng(store, locks, StdRng::seed_from_u64(seed))
    }
}

impl<S: Store, R: Rng + Send + 'static> AssignmentEngine<S, R> {
    pub fn with_rng(store: Arc<S>, locks: RoomLocks, rng: R) -> Self {
        Self {
            store,
            locks,
            rng: Mutex::new(rng),
            min_participants: MIN_PARTICIPANTS,
        }
    }

    /// Raises the roster size a draw requires. Values below two are
    /// clamped to two.
    pub fn with_min_participants(mut self, min: usize) -> Self {
        self.min_participants = min.max(MIN_PARTICIPANTS);
        self
    }

    pub fn min_participants(&self) -> usize {
        self.min_participants
    }

    /// The lock registry draws run under. Roster changes must take the
    /// same room lock so a draw never sees a half-applied membership
    /// change.
    pub fn locks(&self) -> &RoomLocks {
        &self.locks
    }

    /// Draws an `Open` room and moves it to `Drawn`.
    ///
    /// Returns the committed assignments in cycle order.
    ///
    /// # Errors
    /// - [`DrawError::NotFound`]: no such room
    /// - [`DrawError::AlreadyDrawn`]: the room was drawn before
    /// - [`DrawError::InsufficientParticipants`]: roster too small; no
    ///   mutation happened
    /// - [`DrawError::Conflict`]: another writer won the draw flag
    /// - [`DrawError::Store`]: the store failed; writes were rolled back.
    ///   If the rollback itself cannot reset the flag, the room stays
    ///   `Drawn` with no rows and [`redraw`](Self::redraw) repairs it.
    pub async fn draw(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Assignment>, DrawError> {
        let _guard = self.locks.lock(room_id).await;

        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(DrawError::NotFound(room_id))?;
        if !room.state().can_transition_to(RoomState::Drawn) {
            return Err(DrawError::AlreadyDrawn(room_id));
        }

        let pairings = self.shuffle_roster(room_id).await?;

        let now = Utc::now();
        if !self.store.mark_drawn(room_id, now).await? {
            tracing::warn!(%room_id, "draw flag already set by another writer");
            return Err(DrawError::Conflict(room_id));
        }

        match self.replace_assignments(room_id, &pairings).await {
            Ok(committed) => {
                tracing::info!(
                    %room_id,
                    participants = committed.len(),
                    "draw committed"
                );
                Ok(committed)
            }
            Err(e) => {
                self.undo_draw(room_id).await;
                Err(e)
            }
        }
    }

    /// Replaces a room's entire assignment set with a fresh cycle over
    /// the current roster.
    ///
    /// This is the administrative path: it works on `Drawn` rooms, and
    /// leaves (or puts) the room in `Drawn`. The previous set is deleted
    /// before the new one is inserted, so the room never holds more than
    /// one cycle's worth of rows. If inserting fails, the previous set is
    /// written back.
    pub async fn redraw(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Assignment>, DrawError> {
        let _guard = self.locks.lock(room_id).await;

        if self.store.get_room(room_id).await?.is_none() {
            return Err(DrawError::NotFound(room_id));
        }

        let pairings = self.shuffle_roster(room_id).await?;
        let previous = self.store.list_assignments(room_id).await?;

        let replaced = async {
            let rows = self.replace_assignments(room_id, &pairings).await?;
            // Already-drawn rooms keep their original draw date.
            self.store.mark_drawn(room_id, Utc::now()).await?;
            Ok::<_, DrawError>(rows)
        };

        match replaced.await {
            Ok(committed) => {
                tracing::info!(
                    %room_id,
                    participants = committed.len(),
                    replaced = previous.len(),
                    "redraw committed"
                );
                Ok(committed)
            }
            Err(e) => {
                self.restore_assignments(room_id, previous).await;
                Err(e)
            }
        }
    }

    /// Looks up whom `giver` buys for in `room_id`.
    ///
    /// Returns `None` if the room does not exist, has not been drawn, or
    /// `giver` was not part of the draw. Rows of an undrawn room are
    /// never returned, even if a crashed writer left some behind.
    pub async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, DrawError> {
        match self.store.get_room(room_id).await? {
            Some(room) if room.state().is_drawn() => {
                Ok(self.store.get_assignment(room_id, giver).await?)
            }
            _ => Ok(None),
        }
    }

    /// Reads the roster and computes a cycle over it.
    async fn shuffle_roster(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Pairing>, DrawError> {
        let roster: Vec<Identity> = self
            .store
            .list_participants(room_id)
            .await?
            .into_iter()
            .map(|p| p.identity)
            .collect();

        if roster.len() < self.min_participants {
            tracing::debug!(
                %room_id,
                found = roster.len(),
                required = self.min_participants,
                "too few participants to draw"
            );
            return Err(DrawError::InsufficientParticipants {
                required: self.min_participants,
                found: roster.len(),
            });
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        compute_assignments(&roster, &mut *rng)
    }

    /// Deletes whatever the room holds, then inserts `pairings`.
    async fn replace_assignments(
        &self,
        room_id: RoomId,
        pairings: &[Pairing],
    ) -> Result<Vec<Assignment>, DrawError> {
        let stale = self.store.delete_assignments(room_id).await?;
        if stale > 0 {
            tracing::debug!(%room_id, stale, "removed previous assignments");
        }

        let created_at = Utc::now();
        let batch = pairings
            .iter()
            .map(|p| NewAssignment {
                room_id,
                giver: p.giver,
                recipient: p.recipient,
                created_at,
            })
            .collect();
        Ok(self.store.insert_assignments(batch).await?)
    }

    /// Compensates a draw whose assignment writes failed after the flag
    /// was flipped: drop any rows, then put the room back to `Open`.
    ///
    /// Failures here are logged, not returned. A failed reset leaves the
    /// room `Drawn` with no rows: `get_assignment` answers `None` for
    /// everyone and `draw` refuses, until a `redraw` writes a cycle.
    async fn undo_draw(&self, room_id: RoomId) {
        if let Err(e) = self.store.delete_assignments(room_id).await {
            tracing::error!(%room_id, error = %e, "rollback: deleting assignments failed");
        }
        match self.store.reset_drawn(room_id).await {
            Ok(()) => tracing::warn!(%room_id, "draw rolled back"),
            Err(e) => {
                tracing::error!(%room_id, error = %e, "rollback: resetting draw flag failed");
            }
        }
    }

    /// Writes a previous assignment set back after a failed redraw.
    async fn restore_assignments(
        &self,
        room_id: RoomId,
        previous: Vec<Assignment>,
    ) {
        let batch = previous
            .into_iter()
            .map(|a| NewAssignment {
                room_id: a.room_id,
                giver: a.giver,
                recipient: a.recipient,
                created_at: a.created_at,
            })
            .collect();
        let restored = async {
            self.store.delete_assignments(room_id).await?;
            self.store.insert_assignments(batch).await
        };
        match restored.await {
            Ok(rows) => {
                tracing::warn!(%room_id, restored = rows.len(), "redraw rolled back");
            }
            Err(e) => {
                tracing::error!(%room_id, error = %e, "rollback: restoring assignments failed");
            }
        }
    }
}
